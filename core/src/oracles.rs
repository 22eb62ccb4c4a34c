//! Verifier challenges derived from a proof.

use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::field::{serde_field, serde_field_vec, PastaField};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RandomOracles<F: PastaField> {
    #[serde(with = "serde_field")]
    pub beta: F,
    #[serde(with = "serde_field")]
    pub gamma: F,
    #[serde(with = "serde_field")]
    pub alpha: F,
    #[serde(with = "serde_field")]
    pub zeta: F,
    #[serde(with = "serde_field")]
    pub v: F,
    #[serde(with = "serde_field")]
    pub u: F,
}

impl<F: PastaField> Default for RandomOracles<F> {
    fn default() -> Self {
        Self {
            beta: F::ZERO,
            gamma: F::ZERO,
            alpha: F::ZERO,
            zeta: F::ZERO,
            v: F::ZERO,
            u: F::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Oracles<F: PastaField> {
    pub o: RandomOracles<F>,
    /// Public input polynomial at ζ.
    #[serde(with = "serde_field")]
    pub p_eval0: F,
    /// Public input polynomial at ζω.
    #[serde(with = "serde_field")]
    pub p_eval1: F,
    #[serde(with = "serde_field_vec")]
    pub opening_prechallenges: Vec<F>,
    #[serde(with = "serde_field")]
    pub digest_before_evaluations: F,
}

impl<F: PastaField> Oracles<F> {
    pub fn dummy() -> Self {
        Self {
            o: RandomOracles::default(),
            p_eval0: F::ZERO,
            p_eval1: F::ZERO,
            opening_prechallenges: Vec::new(),
            digest_before_evaluations: F::ZERO,
        }
    }
}

impl<F: PastaField> NativeObject for RandomOracles<F> {}
impl<F: PastaField> NativeObject for Oracles<F> {}
