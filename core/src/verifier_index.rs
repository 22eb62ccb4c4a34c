//! Verifier index: the commitments and shifts a verifier needs, without the circuit.

use std::path::Path;
use std::sync::Arc;

use blake2b_simd::Params as Blake2bParams;
use ff::Field;
use group::GroupEncoding;
use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::curve::PastaCurve;
use crate::domain::Domain;
use crate::error::Result;
use crate::field::{self, serde_field, PastaField};
use crate::index::ProverIndex;
use crate::persist;
use crate::poly_comm::PolyComm;
use crate::urs::Urs;

const DIGEST_DOMAIN: &[u8] = b"plonk-core/verifier-index";

/// Commitments to the fixed polynomials of a circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VerificationEvals<C: PastaCurve> {
    pub sigma_comm: Vec<PolyComm<C>>,
    pub ql_comm: PolyComm<C>,
    pub qr_comm: PolyComm<C>,
    pub qo_comm: PolyComm<C>,
    pub qm_comm: PolyComm<C>,
    pub qc_comm: PolyComm<C>,
    pub rcm_comm: Vec<PolyComm<C>>,
    pub psm_comm: PolyComm<C>,
    pub add_comm: PolyComm<C>,
    pub mul1_comm: PolyComm<C>,
    pub mul2_comm: PolyComm<C>,
    pub emul1_comm: PolyComm<C>,
    pub emul2_comm: PolyComm<C>,
    pub emul3_comm: PolyComm<C>,
}

impl<C: PastaCurve> VerificationEvals<C> {
    pub fn dummy() -> Self {
        Self {
            sigma_comm: vec![PolyComm::empty(); 3],
            ql_comm: PolyComm::empty(),
            qr_comm: PolyComm::empty(),
            qo_comm: PolyComm::empty(),
            qm_comm: PolyComm::empty(),
            qc_comm: PolyComm::empty(),
            rcm_comm: vec![PolyComm::empty(); 3],
            psm_comm: PolyComm::empty(),
            add_comm: PolyComm::empty(),
            mul1_comm: PolyComm::empty(),
            mul2_comm: PolyComm::empty(),
            emul1_comm: PolyComm::empty(),
            emul2_comm: PolyComm::empty(),
            emul3_comm: PolyComm::empty(),
        }
    }

    /// All commitments in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = &PolyComm<C>> {
        self.sigma_comm
            .iter()
            .chain([&self.ql_comm, &self.qr_comm, &self.qo_comm, &self.qm_comm, &self.qc_comm])
            .chain(self.rcm_comm.iter())
            .chain([
                &self.psm_comm,
                &self.add_comm,
                &self.mul1_comm,
                &self.mul2_comm,
                &self.emul1_comm,
                &self.emul2_comm,
                &self.emul3_comm,
            ])
    }
}

/// Coset shifts separating the R and O columns from L in the permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VerificationShifts<F: PastaField> {
    #[serde(with = "serde_field")]
    pub r: F,
    #[serde(with = "serde_field")]
    pub o: F,
}

impl<F: PastaField> VerificationShifts<F> {
    /// `r = g`, `o = g²` for the multiplicative generator `g`, so no two
    /// columns share a coset of any 2-adic subgroup.
    pub fn standard() -> Self {
        let g = F::MULTIPLICATIVE_GENERATOR;
        Self { r: g, o: g.square() }
    }

    /// Shift of column `col`, with L unshifted.
    pub fn get(&self, col: usize) -> F {
        match col {
            0 => F::ONE,
            1 => self.r,
            _ => self.o,
        }
    }
}

/// Shifts for a domain of size `2^log2`.
pub fn shifts_for_domain<F: PastaField>(log2: u32) -> Result<VerificationShifts<F>> {
    field::domain_generator::<F>(log2)?;
    Ok(VerificationShifts::standard())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VerifierIndex<C: PastaCurve> {
    pub domain: Domain<C::Scalar>,
    pub max_poly_size: u32,
    pub max_quot_size: u32,
    pub public: u32,
    pub urs: Arc<Urs<C>>,
    pub evals: VerificationEvals<C>,
    pub shifts: VerificationShifts<C::Scalar>,
}

/// On-disk form; the URS is supplied again when reading.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct VerifierIndexRecord<C: PastaCurve> {
    domain: Domain<C::Scalar>,
    max_poly_size: u32,
    max_quot_size: u32,
    public: u32,
    evals: VerificationEvals<C>,
    shifts: VerificationShifts<C::Scalar>,
}

impl<C: PastaCurve> VerifierIndex<C> {
    pub fn create(index: &ProverIndex<C>) -> Self {
        Self {
            domain: index.domains.d1,
            max_poly_size: index.max_poly_size as u32,
            max_quot_size: index.max_quot_size as u32,
            public: index.public as u32,
            urs: index.urs.clone(),
            evals: index.evals.clone(),
            shifts: index.shifts,
        }
    }

    /// A structurally valid index that accepts no proof.
    pub fn dummy() -> Self {
        Self {
            domain: Domain {
                log_size_of_group: 0,
                group_gen: C::Scalar::ONE,
            },
            max_poly_size: 0,
            max_quot_size: 0,
            public: 0,
            urs: Arc::new(Urs::empty()),
            evals: VerificationEvals::dummy(),
            shifts: VerificationShifts::standard(),
        }
    }

    pub fn digest(&self) -> [u8; 32] {
        index_digest(
            &self.domain,
            self.public as usize,
            self.max_poly_size as usize,
            &self.shifts,
            &self.evals,
            &self.urs,
        )
    }

    pub fn write(&self, path: &Path, append: bool) -> Result<()> {
        let record = VerifierIndexRecord::<C> {
            domain: self.domain,
            max_poly_size: self.max_poly_size,
            max_quot_size: self.max_quot_size,
            public: self.public,
            evals: self.evals.clone(),
            shifts: self.shifts,
        };
        persist::write_record(path, append, &record)
    }

    pub fn read(path: &Path, offset: Option<u64>, urs: Arc<Urs<C>>) -> Result<Option<Self>> {
        let record: Option<VerifierIndexRecord<C>> = persist::try_read_record(path, offset)?;
        Ok(record.map(|r| Self {
            domain: r.domain,
            max_poly_size: r.max_poly_size,
            max_quot_size: r.max_quot_size,
            public: r.public,
            urs,
            evals: r.evals,
            shifts: r.shifts,
        }))
    }
}

/// Binds a proof transcript to everything the verifier index fixes.
pub fn index_digest<C: PastaCurve>(
    domain: &Domain<C::Scalar>,
    public: usize,
    max_poly_size: usize,
    shifts: &VerificationShifts<C::Scalar>,
    evals: &VerificationEvals<C>,
    urs: &Urs<C>,
) -> [u8; 32] {
    let mut state = Blake2bParams::new().hash_length(32).to_state();
    state
        .update(DIGEST_DOMAIN)
        .update(C::NAME.as_bytes())
        .update(&domain.log_size_of_group.to_le_bytes())
        .update(&(public as u64).to_le_bytes())
        .update(&(max_poly_size as u64).to_le_bytes())
        .update(&field::to_bytes(&shifts.r))
        .update(&field::to_bytes(&shifts.o))
        .update(&(urs.depth() as u64).to_le_bytes())
        .update(urs.h.to_bytes().as_ref());
    for comm in evals.iter() {
        state.update(&(comm.chunks() as u64).to_le_bytes());
        for point in &comm.unshifted {
            state.update(point.to_bytes().as_ref());
        }
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

impl<C: PastaCurve> NativeObject for VerificationEvals<C> {}
impl<F: PastaField> NativeObject for VerificationShifts<F> {}
impl<C: PastaCurve> NativeObject for VerifierIndex<C> {}

#[cfg(test)]
mod tests {
    use ff::{Field, PrimeField};
    use pasta_curves::Fp;

    use super::*;
    use crate::curve::Vesta;

    #[test]
    fn test_shifts_are_distinct_cosets() {
        let shifts = shifts_for_domain::<Fp>(4).unwrap();
        assert!(shifts_for_domain::<Fp>(Fp::S + 1).is_err());
        assert_eq!(shifts.get(0), Fp::ONE);
        assert_ne!(shifts.r, shifts.o);
        // r/o and r are outside every 2-adic subgroup.
        let n = 1u64 << Fp::S;
        assert_ne!(shifts.r.pow_vartime([n]), Fp::ONE);
        assert_ne!((shifts.o * shifts.r.invert().unwrap()).pow_vartime([n]), Fp::ONE);
    }

    #[test]
    fn test_dummy_digest_is_stable() {
        let a = VerifierIndex::<Vesta>::dummy();
        let b = VerifierIndex::<Vesta>::dummy();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.evals.iter().count(), 18);
    }
}
