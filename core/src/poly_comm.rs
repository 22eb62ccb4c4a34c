//! Chunked polynomial commitments.

use group::Group;
use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::curve::{msm, serde_opt_point, serde_point_vec, PastaCurve};

/// Commitment to a polynomial split into chunks of the URS depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PolyComm<C: PastaCurve> {
    #[serde(with = "serde_point_vec")]
    pub unshifted: Vec<C::Point>,
    #[serde(with = "serde_opt_point")]
    pub shifted: Option<C::Point>,
}

impl<C: PastaCurve> PolyComm<C> {
    pub fn new(unshifted: Vec<C::Point>) -> Self {
        Self {
            unshifted,
            shifted: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn chunks(&self) -> usize {
        self.unshifted.len()
    }

    /// Σ sᵢ·Cᵢ computed chunk by chunk. Missing chunks count as the identity.
    pub fn multi_scalar_mul(comms: &[&Self], scalars: &[C::Scalar]) -> Self {
        let width = comms.iter().map(|c| c.chunks()).max().unwrap_or(0);
        let unshifted = (0..width)
            .map(|chunk| {
                let points: Vec<C::Point> = comms
                    .iter()
                    .map(|c| c.unshifted.get(chunk).copied().unwrap_or_else(C::Point::identity))
                    .collect();
                msm::<C>(&points, scalars)
            })
            .collect();
        let shifted = comms
            .iter()
            .any(|c| c.shifted.is_some())
            .then(|| {
                let points: Vec<C::Point> = comms
                    .iter()
                    .map(|c| c.shifted.unwrap_or_else(C::Point::identity))
                    .collect();
                msm::<C>(&points, scalars)
            });
        Self { unshifted, shifted }
    }
}

impl<C: PastaCurve> NativeObject for PolyComm<C> {}

#[cfg(test)]
mod tests {
    use ff::Field;
    use pasta_curves::{vesta, Fp};

    use super::*;
    use crate::curve::Vesta;

    #[test]
    fn test_multi_scalar_mul_chunkwise() {
        let g = vesta::Point::generator();
        let a = PolyComm::<Vesta>::new(vec![g, g.double()]);
        let b = PolyComm::<Vesta>::new(vec![g]);
        let c = PolyComm::multi_scalar_mul(&[&a, &b], &[Fp::from(2), Fp::ONE]);
        assert_eq!(c.unshifted, vec![g * Fp::from(3), g * Fp::from(4)]);
        assert!(c.shifted.is_none());
        assert_eq!(PolyComm::<Vesta>::multi_scalar_mul(&[], &[]), PolyComm::empty());
    }
}
