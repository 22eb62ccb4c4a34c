//! Nested vectors passed to the prover by handle.

use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::curve::PastaCurve;
use crate::error::{CoreError, Result};
use crate::field::{serde_field_vec_vec, PastaField};
use crate::poly_comm::PolyComm;

/// A vector of field vectors, such as the challenges of several previous proofs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VecVecField<F: PastaField>(#[serde(with = "serde_field_vec_vec")] pub Vec<Vec<F>>);

impl<F: PastaField> VecVecField<F> {
    pub fn new(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, item: Vec<F>) {
        self.0.push(item);
    }

    pub fn get(&self, i: usize) -> Result<&[F]> {
        self.0.get(i).map(Vec::as_slice).ok_or_else(|| out_of_range(i, self.0.len()))
    }

    pub fn set(&mut self, i: usize, item: Vec<F>) -> Result<()> {
        let len = self.0.len();
        let slot = self.0.get_mut(i).ok_or_else(|| out_of_range(i, len))?;
        *slot = item;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-proof Lagrange commitments for a batch verification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VecVecPolyComm<C: PastaCurve>(pub Vec<Vec<PolyComm<C>>>);

impl<C: PastaCurve> VecVecPolyComm<C> {
    pub fn new(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, item: Vec<PolyComm<C>>) {
        self.0.push(item);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn out_of_range(i: usize, len: usize) -> CoreError {
    CoreError::InvalidArgument(format!("index {i} out of range ({len} entries)"))
}

impl<F: PastaField> NativeObject for VecVecField<F> {}
impl<C: PastaCurve> NativeObject for VecVecPolyComm<C> {}

#[cfg(test)]
mod tests {
    use ff::Field;
    use pasta_curves::Fp;

    use super::*;

    #[test]
    fn test_vec_vec_field() {
        let mut v = VecVecField::<Fp>::new(2);
        assert!(v.is_empty());
        v.push(vec![Fp::ONE]);
        v.push(vec![]);
        v.set(1, vec![Fp::ZERO, Fp::ONE]).unwrap();
        assert_eq!(v.get(1).unwrap(), &[Fp::ZERO, Fp::ONE]);
        assert_eq!(v.len(), 2);
        assert!(v.get(2).is_err());
        assert!(v.set(5, vec![]).is_err());
    }
}
