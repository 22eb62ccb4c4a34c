//! Structured reference string: commitment generators `g` and blinding base `h`.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use ahash::AHashMap;
use blake2b_simd::Params as Blake2bParams;
use ff::Field;
use group::{Group, GroupEncoding};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::arena::NativeObject;
use crate::curve::{hash_to_point, msm, serde_point, serde_point_vec, PastaCurve};
use crate::domain::Domain;
use crate::error::{CoreError, Result};
use crate::field::{self, PastaField};
use crate::persist;
use crate::poly_comm::PolyComm;
use crate::runtime::Runtime;

const G_DOMAIN: &[u8] = b"plonk-core/urs/g";
const H_DOMAIN: &[u8] = b"plonk-core/urs/h";
const ACCUMULATOR_DOMAIN: &[u8] = b"plonk-core/urs/accumulator";

type LagrangeBasis<C> = Arc<Vec<PolyComm<C>>>;

pub struct Urs<C: PastaCurve> {
    pub g: Vec<C::Point>,
    pub h: C::Point,
    lagrange_bases: RwLock<AHashMap<usize, LagrangeBasis<C>>>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct UrsRecord<C: PastaCurve> {
    #[serde(with = "serde_point_vec")]
    g: Vec<C::Point>,
    #[serde(with = "serde_point")]
    h: C::Point,
}

impl<C: PastaCurve> Clone for Urs<C> {
    fn clone(&self) -> Self {
        Self::from_parts(self.g.clone(), self.h)
    }
}

impl<C: PastaCurve> std::fmt::Debug for Urs<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Urs")
            .field("curve", &C::NAME)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl<C: PastaCurve> PartialEq for Urs<C> {
    fn eq(&self, other: &Self) -> bool {
        self.g == other.g && self.h == other.h
    }
}

impl<C: PastaCurve> Serialize for Urs<C> {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        UrsRecord::<C> {
            g: self.g.clone(),
            h: self.h,
        }
        .serialize(s)
    }
}

impl<'de, C: PastaCurve> Deserialize<'de> for Urs<C> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let record = UrsRecord::<C>::deserialize(d)?;
        Ok(Self::from_parts(record.g, record.h))
    }
}

impl<C: PastaCurve> Urs<C> {
    fn from_parts(g: Vec<C::Point>, h: C::Point) -> Self {
        Self {
            g,
            h,
            lagrange_bases: RwLock::new(AHashMap::new()),
        }
    }

    /// Deterministic URS with `depth` generators.
    #[instrument(level = "debug")]
    pub fn create(depth: usize) -> Self {
        let g = (0..depth as u64).map(|i| hash_to_point::<C>(G_DOMAIN, i)).collect();
        Self::from_parts(g, hash_to_point::<C>(H_DOMAIN, 0))
    }

    /// URS with no generators, used by dummy verifier indices.
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), C::Point::identity())
    }

    pub fn depth(&self) -> usize {
        self.g.len()
    }

    /// Commits to `coeffs`, one chunk per `depth` coefficients.
    pub fn commit(&self, coeffs: &[C::Scalar]) -> PolyComm<C> {
        if self.g.is_empty() {
            return PolyComm::empty();
        }
        if coeffs.is_empty() {
            return PolyComm::new(vec![C::Point::identity()]);
        }
        PolyComm::new(
            coeffs
                .chunks(self.depth())
                .map(|chunk| msm::<C>(&self.g, chunk))
                .collect(),
        )
    }

    /// Commitments to the Lagrange basis of `domain`, cached per domain size.
    pub fn lagrange_basis(
        &self,
        domain: &Domain<C::Scalar>,
        runtime: Runtime<'_>,
    ) -> LagrangeBasis<C> {
        let n = domain.size();
        if let Some(basis) = self
            .lagrange_bases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&n)
        {
            return basis.clone();
        }
        debug!(curve = C::NAME, n, "computing lagrange basis");
        let n_inv = field::inverse(&domain.size_as_field()).unwrap_or(C::Scalar::ONE);
        let w_inv = field::inverse(&domain.group_gen).unwrap_or(C::Scalar::ONE);
        // Lᵢ(X) = n⁻¹ Σⱼ ω^{-ij} Xʲ
        let basis: Vec<PolyComm<C>> = runtime.map((0..n).collect(), |i| {
            let step = w_inv.pow_vartime([i as u64]);
            let coeffs: Vec<C::Scalar> =
                std::iter::successors(Some(n_inv), |c| Some(*c * step)).take(n).collect();
            self.commit(&coeffs)
        });
        let basis = Arc::new(basis);
        self.lagrange_bases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(n, basis.clone());
        basis
    }

    pub fn lagrange_commitment(
        &self,
        domain_size: usize,
        i: usize,
        runtime: Runtime<'_>,
    ) -> Result<PolyComm<C>> {
        let domain = Domain::new(domain_size)?;
        if i >= domain_size {
            return Err(CoreError::InvalidArgument(format!(
                "lagrange index {i} outside a domain of size {domain_size}"
            )));
        }
        Ok(self.lagrange_basis(&domain, runtime)[i].clone())
    }

    /// Commitment to the polynomial taking `evals` over the domain of size `domain_size`.
    pub fn commit_evaluations(
        &self,
        domain_size: usize,
        evals: &[C::Scalar],
        runtime: Runtime<'_>,
    ) -> Result<PolyComm<C>> {
        let domain = Domain::new(domain_size)?;
        if evals.len() != domain_size {
            return Err(CoreError::InvalidArgument(format!(
                "{} evaluations for a domain of size {domain_size}",
                evals.len()
            )));
        }
        let basis = self.lagrange_basis(&domain, runtime);
        let comms: Vec<&PolyComm<C>> = basis.iter().collect();
        Ok(PolyComm::multi_scalar_mul(&comms, evals))
    }

    pub fn b_poly_commitment(&self, chals: &[C::Scalar]) -> PolyComm<C> {
        self.commit(&b_poly_coefficients(chals))
    }

    /// Checks that each `comms[i]` commits to the challenge polynomial of the i-th
    /// block of `chals`, using one random linear combination for the whole batch.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME, n = comms.len()))]
    pub fn batch_accumulator_check(&self, comms: &[C::Point], chals: &[C::Scalar]) -> Result<bool> {
        if comms.is_empty() {
            return Ok(chals.is_empty());
        }
        if chals.len() % comms.len() != 0 {
            return Err(CoreError::InvalidArgument(format!(
                "{} challenges cannot be split across {} commitments",
                chals.len(),
                comms.len()
            )));
        }
        let rounds = chals.len() / comms.len();
        if rounds >= usize::BITS as usize || 1usize << rounds > self.depth() {
            return Err(CoreError::InvalidArgument(format!(
                "{rounds} rounds exceed a URS of depth {}",
                self.depth()
            )));
        }

        let mut state = Blake2bParams::new().hash_length(32).to_state();
        state.update(ACCUMULATOR_DOMAIN);
        comms.iter().for_each(|c| {
            state.update(c.to_bytes().as_ref());
        });
        chals.iter().for_each(|c| {
            state.update(&field::to_bytes(c));
        });
        let mut seed = [0u8; 32];
        seed.copy_from_slice(state.finalize().as_bytes());
        let rho: C::Scalar = field::from_hash(seed);

        let mut combined = vec![C::Scalar::ZERO; 1 << rounds];
        let mut lhs = C::Point::identity();
        let mut rho_i = C::Scalar::ONE;
        for (i, comm) in comms.iter().enumerate() {
            let block = &chals[i * rounds..(i + 1) * rounds];
            for (acc, s) in combined.iter_mut().zip(b_poly_coefficients(block)) {
                *acc += rho_i * s;
            }
            lhs += *comm * rho_i;
            rho_i *= rho;
        }
        Ok(lhs == msm::<C>(&self.g, &combined))
    }

    pub fn write(&self, path: &Path, append: bool) -> Result<()> {
        persist::write_record(path, append, self)
    }

    pub fn read(path: &Path, offset: Option<u64>) -> Result<Option<Self>> {
        persist::try_read_record(path, offset)
    }
}

impl<C: PastaCurve> NativeObject for Urs<C> {}

/// Coefficients of b(X) = Πᵢ (1 + chal_{k-1-i} X^{2^i}).
pub fn b_poly_coefficients<F: PastaField>(chals: &[F]) -> Vec<F> {
    let rounds = chals.len();
    (0..1usize << rounds)
        .map(|j| {
            (0..rounds)
                .filter(|bit| j >> bit & 1 == 1)
                .fold(F::ONE, |acc, bit| acc * chals[rounds - 1 - bit])
        })
        .collect()
}

/// b(x) evaluated directly from the challenges.
pub fn b_poly_evaluate<F: PastaField>(chals: &[F], x: F) -> F {
    let rounds = chals.len();
    let mut pow = x;
    let mut acc = F::ONE;
    for i in 0..rounds {
        acc *= F::ONE + chals[rounds - 1 - i] * pow;
        pow = pow.square();
    }
    acc
}

#[cfg(test)]
mod tests {
    use pasta_curves::Fp;

    use super::*;
    use crate::curve::Vesta;
    use crate::domain::evaluate;

    #[test]
    fn test_create_is_deterministic() {
        let a = Urs::<Vesta>::create(4);
        let b = Urs::<Vesta>::create(4);
        assert_eq!(a, b);
        assert_eq!(a.depth(), 4);
        assert_ne!(a.g[0], a.g[1]);
    }

    #[test]
    fn test_commit_chunks() {
        let urs = Urs::<Vesta>::create(2);
        let coeffs: Vec<Fp> = (1..=5u64).map(Fp::from).collect();
        let comm = urs.commit(&coeffs);
        assert_eq!(comm.chunks(), 3);
        assert_eq!(comm.unshifted[2], urs.g[0] * Fp::from(5));
        assert_eq!(urs.commit(&[]).chunks(), 1);
        assert_eq!(Urs::<Vesta>::empty().commit(&coeffs), PolyComm::empty());
    }

    #[test]
    fn test_commit_evaluations_matches_lagrange() {
        let urs = Urs::<Vesta>::create(4);
        let rt = Runtime::sequential();
        let mut evals = vec![Fp::ZERO; 4];
        evals[1] = Fp::ONE;
        assert_eq!(
            urs.commit_evaluations(4, &evals, rt).unwrap(),
            urs.lagrange_commitment(4, 1, rt).unwrap()
        );
        let domain = Domain::<Fp>::new(4).unwrap();
        let evals: Vec<Fp> = (0..4u64).map(|i| Fp::from(i * i + 1)).collect();
        let coeffs = domain.ifft(&evals).unwrap();
        assert_eq!(urs.commit_evaluations(4, &evals, rt).unwrap(), urs.commit(&coeffs));
        assert!(urs.lagrange_commitment(4, 4, rt).is_err());
        assert!(urs.commit_evaluations(3, &evals, rt).is_err());
    }

    #[test]
    fn test_b_poly() {
        let chals = [Fp::from(3), Fp::from(5)];
        let coeffs = b_poly_coefficients(&chals);
        assert_eq!(coeffs, vec![Fp::ONE, Fp::from(5), Fp::from(3), Fp::from(15)]);
        let x = Fp::from(11);
        assert_eq!(evaluate(&coeffs, x), b_poly_evaluate(&chals, x));
    }

    #[test]
    fn test_batch_accumulator_check() {
        let urs = Urs::<Vesta>::create(4);
        let chals = [Fp::from(2), Fp::from(7), Fp::from(9), Fp::from(4)];
        let c0 = urs.b_poly_commitment(&chals[..2]).unwrap_point();
        let c1 = urs.b_poly_commitment(&chals[2..]).unwrap_point();
        assert!(urs.batch_accumulator_check(&[c0, c1], &chals).unwrap());
        assert!(!urs.batch_accumulator_check(&[c1, c0], &chals).unwrap());
        assert!(urs.batch_accumulator_check(&[], &[]).unwrap());
        assert!(urs.batch_accumulator_check(&[c0], &chals[..3]).is_err());
    }

    trait UnwrapPoint {
        fn unwrap_point(self) -> <Vesta as PastaCurve>::Point;
    }

    impl UnwrapPoint for PolyComm<Vesta> {
        fn unwrap_point(self) -> <Vesta as PastaCurve>::Point {
            assert_eq!(self.chunks(), 1);
            self.unshifted[0]
        }
    }
}
