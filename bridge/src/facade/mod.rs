//! The operation surface of the bridge, one mirrored set per field/curve pair.
//!
//! Fp circuits are committed with Vesta and Fq circuits with Pallas.

mod bigint;
mod curve;
mod field;
mod plonk;
mod urs;

pub use bigint::BigIntOps;
pub use curve::{AffinePoint, CurveOps, ProjectivePoint};
pub use field::FieldOps;
pub use plonk::PlonkOps;
use plonk_core::{Fp, Fq, Pallas, Vesta};

use crate::context::Bridge;

impl Bridge {
    pub fn fp(&self) -> FieldOps<'_, Fp> {
        FieldOps::new(self)
    }

    pub fn fq(&self) -> FieldOps<'_, Fq> {
        FieldOps::new(self)
    }

    pub fn bigint(&self) -> BigIntOps<'_> {
        BigIntOps::new(self)
    }

    pub fn pallas(&self) -> CurveOps<'_, Pallas> {
        CurveOps::new(self)
    }

    pub fn vesta(&self) -> CurveOps<'_, Vesta> {
        CurveOps::new(self)
    }

    pub fn fp_plonk(&self) -> PlonkOps<'_, Vesta> {
        PlonkOps::new(self)
    }

    pub fn fq_plonk(&self) -> PlonkOps<'_, Pallas> {
        PlonkOps::new(self)
    }
}
