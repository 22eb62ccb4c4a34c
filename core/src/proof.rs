//! Proof creation and verification.
//!
//! The argument commits to the three witness columns, a permutation grand
//! product `z` and the constraint residual `t`, derives every challenge from a
//! Blake2b transcript bound to the verifier index digest, and closes with an
//! inner-product-style opening whose rounds are derived from the same
//! transcript. Verification replays the transcript and recomputes every
//! transcript-determined value of the proof. It is a reference construction:
//! it binds proofs to circuits and witnesses' commitments but is not
//! zero-knowledge.

use ff::Field;
use group::Group;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::arena::NativeObject;
use crate::circuit::{GateType, COLUMNS};
use crate::curve::{hash_to_point, serde_point, serde_point_vec, PastaCurve};
use crate::domain::evaluate_chunks;
use crate::error::{CoreError, Result};
use crate::field::{self, serde_field, serde_field_vec, serde_field_vec_vec, PastaField};
use crate::index::ProverIndex;
use crate::oracles::RandomOracles;
use crate::poly_comm::PolyComm;
use crate::runtime::Runtime;
use crate::transcript::Transcript;
use crate::urs::Urs;
use crate::verifier_index::VerifierIndex;

const TRANSCRIPT_DOMAIN: &[u8] = b"plonk-core/proof";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProverCommitments<C: PastaCurve> {
    pub l_comm: PolyComm<C>,
    pub r_comm: PolyComm<C>,
    pub o_comm: PolyComm<C>,
    pub z_comm: PolyComm<C>,
    pub t_comm: PolyComm<C>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OpeningProof<C: PastaCurve> {
    #[serde(with = "serde_point_vec")]
    pub lr_0: Vec<C::Point>,
    #[serde(with = "serde_point_vec")]
    pub lr_1: Vec<C::Point>,
    #[serde(with = "serde_point")]
    pub delta: C::Point,
    #[serde(with = "serde_field")]
    pub z1: C::Scalar,
    #[serde(with = "serde_field")]
    pub z2: C::Scalar,
    #[serde(with = "serde_point")]
    pub sg: C::Point,
}

/// Chunked evaluations of the proof polynomials at one point.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProofEvaluations<F: PastaField> {
    #[serde(with = "serde_field_vec")]
    pub l: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub r: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub o: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub z: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub t: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub f: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub sigma1: Vec<F>,
    #[serde(with = "serde_field_vec")]
    pub sigma2: Vec<F>,
}

impl<F: PastaField> ProofEvaluations<F> {
    fn all(&self) -> [&Vec<F>; 8] {
        [
            &self.l,
            &self.r,
            &self.o,
            &self.z,
            &self.t,
            &self.f,
            &self.sigma1,
            &self.sigma2,
        ]
    }

    /// Σ vᵏ·eₖ over every chunk, in field order.
    pub fn combine(&self, v: F) -> F {
        self.all()
            .into_iter()
            .flatten()
            .rev()
            .fold(F::ZERO, |acc, e| acc * v + *e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProverProof<C: PastaCurve> {
    pub commitments: ProverCommitments<C>,
    pub proof: OpeningProof<C>,
    pub evals0: ProofEvaluations<C::Scalar>,
    pub evals1: ProofEvaluations<C::Scalar>,
    #[serde(with = "serde_field_vec")]
    pub public: Vec<C::Scalar>,
    #[serde(with = "serde_field_vec_vec")]
    pub prev_challenges_scalars: Vec<Vec<C::Scalar>>,
    pub prev_challenges_comms: Vec<PolyComm<C>>,
}

impl<C: PastaCurve> NativeObject for ProverCommitments<C> {}
impl<C: PastaCurve> NativeObject for OpeningProof<C> {}
impl<F: PastaField> NativeObject for ProofEvaluations<F> {}
impl<C: PastaCurve> NativeObject for ProverProof<C> {}

/// Accumulator carried over from a previous proof: its opening challenges and
/// the commitment to their challenge polynomial.
pub type PrevChallenge<C> = (Vec<<C as PastaCurve>::Scalar>, PolyComm<C>);

/// Number of opening rounds for a URS of `depth` generators.
pub const fn opening_rounds(depth: usize) -> usize {
    if depth == 0 {
        0
    } else {
        depth.ilog2() as usize
    }
}

/// Σ −xᵢ·Lᵢ over the public inputs. Empty when there are none.
pub fn public_commitment<C: PastaCurve>(
    lagrange: &[PolyComm<C>],
    public: &[C::Scalar],
) -> Result<PolyComm<C>> {
    if public.is_empty() {
        return Ok(PolyComm::empty());
    }
    if lagrange.len() < public.len() {
        return Err(CoreError::InvalidArgument(format!(
            "{} lagrange commitments for {} public inputs",
            lagrange.len(),
            public.len()
        )));
    }
    let comms: Vec<&PolyComm<C>> = lagrange[..public.len()].iter().collect();
    let scalars: Vec<C::Scalar> = public.iter().map(|x| -*x).collect();
    Ok(PolyComm::multi_scalar_mul(&comms, &scalars))
}

/// Σ vᵏ·Pₖ over every chunk of `comms`, in order.
fn combine_points<C: PastaCurve>(comms: &[&PolyComm<C>], v: C::Scalar) -> C::Point {
    comms
        .iter()
        .flat_map(|c| c.unshifted.iter())
        .rev()
        .fold(C::Point::identity(), |acc, p| acc * v + *p)
}

/// The Fiat-Shamir steps shared by the prover and the verifier.
struct ProtocolTranscript<C: PastaCurve> {
    transcript: Transcript,
    _curve: std::marker::PhantomData<C>,
}

/// Everything the transcript determines once the prover's messages are fixed.
struct Replay<C: PastaCurve> {
    oracles: RandomOracles<C::Scalar>,
    digest_before_evaluations: C::Scalar,
    prechallenges: Vec<C::Scalar>,
    lr_0: Vec<C::Point>,
    lr_1: Vec<C::Point>,
    delta: C::Point,
    z1: C::Scalar,
    z2: C::Scalar,
    sg: C::Point,
}

impl<C: PastaCurve> ProtocolTranscript<C> {
    fn new(index_digest: &[u8; 32], public: &[C::Scalar], prev: &[PrevChallenge<C>]) -> Self {
        let mut transcript = Transcript::new(TRANSCRIPT_DOMAIN);
        transcript.absorb_bytes(b"index", index_digest);
        transcript.absorb_fields(b"public", public);
        for (chals, comm) in prev {
            transcript.absorb_fields(b"prev-chals", chals);
            transcript.absorb_comm(b"prev-comm", comm);
        }
        Self {
            transcript,
            _curve: std::marker::PhantomData,
        }
    }

    fn witness(
        &mut self,
        p_comm: &PolyComm<C>,
        commitments: &ProverCommitments<C>,
    ) -> (C::Scalar, C::Scalar) {
        let t = &mut self.transcript;
        t.absorb_comm(b"p", p_comm);
        t.absorb_comm(b"l", &commitments.l_comm);
        t.absorb_comm(b"r", &commitments.r_comm);
        t.absorb_comm(b"o", &commitments.o_comm);
        (t.challenge(b"beta"), t.challenge(b"gamma"))
    }

    fn permutation(&mut self, z_comm: &PolyComm<C>) -> C::Scalar {
        self.transcript.absorb_comm(b"z", z_comm);
        self.transcript.challenge(b"alpha")
    }

    fn quotient(&mut self, t_comm: &PolyComm<C>) -> (C::Scalar, C::Scalar) {
        self.transcript.absorb_comm(b"t", t_comm);
        let zeta = self.transcript.challenge(b"zeta");
        (zeta, self.transcript.challenge(b"digest"))
    }

    fn evaluations(
        &mut self,
        evals0: &ProofEvaluations<C::Scalar>,
        evals1: &ProofEvaluations<C::Scalar>,
    ) -> (C::Scalar, C::Scalar) {
        for (label, evals) in [(b"evals0", evals0), (b"evals1", evals1)] {
            for e in evals.all() {
                self.transcript.absorb_fields(label, e);
            }
        }
        (self.transcript.challenge(b"v"), self.transcript.challenge(b"u"))
    }

    fn opening_rounds(&mut self, rounds: usize) -> (Vec<C::Point>, Vec<C::Point>, Vec<C::Scalar>) {
        let mut lr_0 = Vec::with_capacity(rounds);
        let mut lr_1 = Vec::with_capacity(rounds);
        let mut prechallenges = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let seed = self.transcript.challenge_bytes(b"lr");
            let (l, r) = (hash_to_point::<C>(&seed, 0), hash_to_point::<C>(&seed, 1));
            self.transcript.absorb_point::<C>(b"lr0", &l);
            self.transcript.absorb_point::<C>(b"lr1", &r);
            lr_0.push(l);
            lr_1.push(r);
            prechallenges.push(self.transcript.challenge(b"prechallenge"));
        }
        (lr_0, lr_1, prechallenges)
    }

    fn opening(&mut self, delta: &C::Point, z1: &C::Scalar) -> C::Scalar {
        self.transcript.absorb_point::<C>(b"delta", delta);
        self.transcript.absorb_field(b"z1", z1);
        self.transcript.challenge(b"z2")
    }

    /// Runs every step from the prover's messages.
    fn replay(
        mut self,
        urs: &Urs<C>,
        p_comm: &PolyComm<C>,
        sigma_comm: &[PolyComm<C>],
        commitments: &ProverCommitments<C>,
        evals0: &ProofEvaluations<C::Scalar>,
        evals1: &ProofEvaluations<C::Scalar>,
    ) -> Replay<C> {
        let (beta, gamma) = self.witness(p_comm, commitments);
        let alpha = self.permutation(&commitments.z_comm);
        let (zeta, digest_before_evaluations) = self.quotient(&commitments.t_comm);
        let (v, u) = self.evaluations(evals0, evals1);
        let (lr_0, lr_1, prechallenges) = self.opening_rounds(opening_rounds(urs.depth()));

        let mut terms = vec![
            &commitments.l_comm,
            &commitments.r_comm,
            &commitments.o_comm,
            &commitments.z_comm,
            &commitments.t_comm,
            p_comm,
        ];
        terms.extend(sigma_comm.iter().take(COLUMNS - 1));
        let delta = combine_points(&terms, v);
        let z1 = evals0.combine(v) + u * evals1.combine(v);
        let z2 = self.opening(&delta, &z1);
        let sg = urs
            .b_poly_commitment(&prechallenges)
            .unshifted
            .first()
            .copied()
            .unwrap_or_else(C::Point::identity);

        Replay {
            oracles: RandomOracles {
                beta,
                gamma,
                alpha,
                zeta,
                v,
                u,
            },
            digest_before_evaluations,
            prechallenges,
            lr_0,
            lr_1,
            delta,
            z1,
            z2,
            sg,
        }
    }
}

impl<C: PastaCurve> ProverProof<C> {
    /// Proves that `primary ++ auxiliary` satisfies the circuit of `index`.
    #[instrument(
        level = "debug",
        skip_all,
        fields(curve = C::NAME, public = primary.len(), auxiliary = auxiliary.len())
    )]
    pub fn create(
        index: &ProverIndex<C>,
        primary: &[C::Scalar],
        auxiliary: &[C::Scalar],
        prev: Vec<PrevChallenge<C>>,
        runtime: Runtime<'_>,
    ) -> Result<Self> {
        let d1 = index.domains.d1;
        let n = d1.size();
        if primary.len() != index.public {
            return Err(CoreError::InvalidArgument(format!(
                "{} primary inputs for an index with {} public inputs",
                primary.len(),
                index.public
            )));
        }
        if primary.len() + auxiliary.len() > COLUMNS * n {
            return Err(CoreError::InvalidArgument(format!(
                "witness of {} values exceeds {} cells",
                primary.len() + auxiliary.len(),
                COLUMNS * n
            )));
        }
        let mut witness = Vec::with_capacity(COLUMNS * n);
        witness.extend_from_slice(primary);
        witness.extend_from_slice(auxiliary);
        witness.resize(COLUMNS * n, C::Scalar::ZERO);
        let (l, rest) = witness.split_at(n);
        let (r, o) = rest.split_at(n);
        let columns = [l, r, o];

        // Gate and copy constraints.
        let mut gate_residual = vec![C::Scalar::ZERO; n];
        for (row, gate) in index.gates.iter().enumerate() {
            if gate.typ == GateType::Generic {
                let mut res = gate.generic_residual(l[row], r[row], o[row]);
                if row < primary.len() {
                    res -= primary[row];
                }
                if res != C::Scalar::ZERO {
                    return Err(CoreError::Unsatisfied {
                        row,
                        reason: "generic gate".into(),
                    });
                }
                gate_residual[row] = res;
            }
            for (col, column) in columns.iter().enumerate() {
                let wire = gate.wires.get(crate::circuit::Col::ALL[col]);
                let target = columns[u8::from(wire.col) as usize][wire.row as usize];
                if column[row] != target {
                    return Err(CoreError::Unsatisfied {
                        row,
                        reason: format!("copy constraint to row {} column {}", wire.row, wire.col),
                    });
                }
            }
        }

        let urs = &index.urs;
        let max_poly_size = index.max_poly_size;
        let [l_coeffs, r_coeffs, o_coeffs] = [d1.ifft(l)?, d1.ifft(r)?, d1.ifft(o)?];
        let lagrange = urs.lagrange_basis(&d1, runtime);
        let p_comm = public_commitment(&lagrange, primary)?;
        let mut commitments = ProverCommitments {
            l_comm: urs.commit(&l_coeffs),
            r_comm: urs.commit(&r_coeffs),
            o_comm: urs.commit(&o_coeffs),
            z_comm: PolyComm::empty(),
            t_comm: PolyComm::empty(),
        };

        // The replay below repeats these steps; the prover needs the early
        // challenges to build z and t first.
        let digest = index.verifier_digest();
        let mut transcript = ProtocolTranscript::<C>::new(&digest, primary, &prev);
        let (beta, gamma) = transcript.witness(&p_comm, &commitments);

        let mut z = vec![C::Scalar::ZERO; n];
        let mut perm_step = vec![(C::Scalar::ZERO, C::Scalar::ZERO); n];
        z[0] = C::Scalar::ONE;
        for row in 0..n {
            let mut num = C::Scalar::ONE;
            let mut den = C::Scalar::ONE;
            for (col, column) in columns.iter().enumerate() {
                num *= column[row] + beta * index.cell_id(row, col) + gamma;
                den *= column[row] + beta * index.sigma[col][row] + gamma;
            }
            perm_step[row] = (num, den);
            if row + 1 < n {
                let den_inv = field::inverse(&den).ok_or_else(|| CoreError::Unsatisfied {
                    row,
                    reason: "degenerate permutation challenge".into(),
                })?;
                z[row + 1] = z[row] * num * den_inv;
            }
        }
        let z_coeffs = d1.ifft(&z)?;
        commitments.z_comm = urs.commit(&z_coeffs);
        let alpha = transcript.permutation(&commitments.z_comm);

        let t: Vec<C::Scalar> = (0..n)
            .map(|row| {
                let perm = if row + 1 < n {
                    let (num, den) = perm_step[row];
                    z[row + 1] * den - z[row] * num
                } else {
                    C::Scalar::ZERO
                };
                gate_residual[row] + alpha * perm
            })
            .collect();
        let t_coeffs = d1.ifft(&t)?;
        commitments.t_comm = urs.commit(&t_coeffs);
        let (zeta, _) = transcript.quotient(&commitments.t_comm);

        let evals_at = |x: C::Scalar| {
            let chunks = |coeffs: &[C::Scalar]| evaluate_chunks(coeffs, max_poly_size, x);
            let whole = |coeffs: &[C::Scalar]| crate::domain::evaluate(coeffs, x);
            ProofEvaluations {
                l: chunks(&l_coeffs),
                r: chunks(&r_coeffs),
                o: chunks(&o_coeffs),
                z: chunks(&z_coeffs),
                t: chunks(&t_coeffs),
                f: vec![index.selector_eval(x, whole(&l_coeffs), whole(&r_coeffs), whole(&o_coeffs))],
                sigma1: chunks(&index.sigma_coeffs[0]),
                sigma2: chunks(&index.sigma_coeffs[1]),
            }
        };
        let evals0 = evals_at(zeta);
        let evals1 = evals_at(zeta * d1.group_gen);

        let replay = ProtocolTranscript::<C>::new(&digest, primary, &prev).replay(
            urs,
            &p_comm,
            &index.evals.sigma_comm,
            &commitments,
            &evals0,
            &evals1,
        );
        debug!(rounds = replay.prechallenges.len(), "proof created");

        let (prev_challenges_scalars, prev_challenges_comms) = prev.into_iter().unzip();
        Ok(Self {
            commitments,
            proof: OpeningProof {
                lr_0: replay.lr_0,
                lr_1: replay.lr_1,
                delta: replay.delta,
                z1: replay.z1,
                z2: replay.z2,
                sg: replay.sg,
            },
            evals0,
            evals1,
            public: primary.to_vec(),
            prev_challenges_scalars,
            prev_challenges_comms,
        })
    }

    /// A structurally valid proof that no verifier index accepts.
    pub fn dummy() -> Self {
        Self {
            commitments: ProverCommitments {
                l_comm: PolyComm::empty(),
                r_comm: PolyComm::empty(),
                o_comm: PolyComm::empty(),
                z_comm: PolyComm::empty(),
                t_comm: PolyComm::empty(),
            },
            proof: OpeningProof {
                lr_0: Vec::new(),
                lr_1: Vec::new(),
                delta: C::Point::identity(),
                z1: C::Scalar::ZERO,
                z2: C::Scalar::ZERO,
                sg: C::Point::identity(),
            },
            evals0: ProofEvaluations::default(),
            evals1: ProofEvaluations::default(),
            public: Vec::new(),
            prev_challenges_scalars: Vec::new(),
            prev_challenges_comms: Vec::new(),
        }
    }

    pub fn prev_challenges(&self) -> Vec<PrevChallenge<C>> {
        self.prev_challenges_scalars
            .iter()
            .cloned()
            .zip(self.prev_challenges_comms.iter().cloned())
            .collect()
    }

    /// Replays the transcript, or `None` when the proof does not fit `index`.
    fn replay(&self, lagrange: &[PolyComm<C>], index: &VerifierIndex<C>) -> Result<Option<Replay<C>>> {
        let n = index.domain.size();
        let max_poly_size = index.max_poly_size as usize;
        if max_poly_size == 0 || index.public as usize != self.public.len() {
            return Ok(None);
        }
        let chunks = n.div_ceil(max_poly_size);
        let commitments = &self.commitments;
        let comm_shapes_ok = [
            &commitments.l_comm,
            &commitments.r_comm,
            &commitments.o_comm,
            &commitments.z_comm,
            &commitments.t_comm,
        ]
        .iter()
        .all(|c| c.chunks() == chunks && c.shifted.is_none());
        let eval_shapes_ok = [&self.evals0, &self.evals1].iter().all(|e| {
            e.f.len() == 1
                && [&e.l, &e.r, &e.o, &e.z, &e.t, &e.sigma1, &e.sigma2]
                    .iter()
                    .all(|v| v.len() == chunks)
        });
        let rounds = opening_rounds(index.urs.depth());
        if !comm_shapes_ok
            || !eval_shapes_ok
            || self.proof.lr_0.len() != rounds
            || self.proof.lr_1.len() != rounds
            || self.prev_challenges_scalars.len() != self.prev_challenges_comms.len()
            || lagrange.len() < self.public.len()
            || index.evals.sigma_comm.len() < COLUMNS - 1
        {
            return Ok(None);
        }

        let p_comm = public_commitment(lagrange, &self.public)?;
        let prev = self.prev_challenges();
        let replay = ProtocolTranscript::<C>::new(&index.digest(), &self.public, &prev).replay(
            &index.urs,
            &p_comm,
            &index.evals.sigma_comm,
            commitments,
            &self.evals0,
            &self.evals1,
        );
        Ok(Some(replay))
    }

    /// Verifies the proof against `index`, given the Lagrange commitments for
    /// its public inputs. Malformed or mismatched proofs verify to `false`.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME))]
    pub fn verify(&self, lagrange: &[PolyComm<C>], index: &VerifierIndex<C>) -> Result<bool> {
        let Some(replay) = self.replay(lagrange, index)? else {
            debug!("proof does not fit the verifier index");
            return Ok(false);
        };
        let opening = &self.proof;
        if opening.lr_0 != replay.lr_0
            || opening.lr_1 != replay.lr_1
            || opening.delta != replay.delta
            || opening.z1 != replay.z1
            || opening.z2 != replay.z2
            || opening.sg != replay.sg
        {
            debug!("opening does not match the transcript");
            return Ok(false);
        }
        if self.prev_challenges_comms.is_empty() {
            return Ok(true);
        }
        let mut points = Vec::with_capacity(self.prev_challenges_comms.len());
        for comm in &self.prev_challenges_comms {
            match comm.unshifted.as_slice() {
                [point] => points.push(*point),
                _ => return Ok(false),
            }
        }
        let chals: Vec<C::Scalar> = self.prev_challenges_scalars.concat();
        match index.urs.batch_accumulator_check(&points, &chals) {
            Ok(ok) => Ok(ok),
            Err(err) => {
                warn!(%err, "previous accumulators rejected");
                Ok(false)
            }
        }
    }

    /// Verifies every `(lagrange, index, proof)` triple. True only when all verify.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME, n = batch.len()))]
    pub fn batch_verify(
        batch: Vec<(Vec<PolyComm<C>>, VerifierIndex<C>, Self)>,
        runtime: Runtime<'_>,
    ) -> Result<bool> {
        let results = runtime.map(batch, |(lagrange, index, proof)| proof.verify(&lagrange, &index));
        results
            .into_iter()
            .try_fold(true, |all, res| res.map(|ok| all && ok))
    }

    /// The verifier's challenges for this proof.
    pub fn oracles(
        &self,
        lagrange: &[PolyComm<C>],
        index: &VerifierIndex<C>,
    ) -> Result<crate::oracles::Oracles<C::Scalar>> {
        let replay = self.replay(lagrange, index)?.ok_or_else(|| {
            CoreError::InvalidArgument("proof does not fit the verifier index".into())
        })?;
        let zeta = replay.oracles.zeta;
        let public_eval = |x: C::Scalar| {
            self.public
                .iter()
                .enumerate()
                .fold(C::Scalar::ZERO, |acc, (i, p)| acc - *p * index.domain.evaluate_lagrange(i, x))
        };
        Ok(crate::oracles::Oracles {
            p_eval0: public_eval(zeta),
            p_eval1: public_eval(zeta * index.domain.group_gen),
            o: replay.oracles,
            opening_prechallenges: replay.prechallenges,
            digest_before_evaluations: replay.digest_before_evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pasta_curves::Fp;

    use super::*;
    use crate::circuit::{Col, Gate, Wire, Wires};
    use crate::curve::Vesta;

    /// Row 0 exposes the public input, row 1 checks `l·r = o` with `l` copied from row 0.
    fn circuit(depth: usize) -> ProverIndex<Vesta> {
        let urs = Arc::new(Urs::create(depth));
        let mut mul = Wires::trivial(1);
        mul.set(Col::L, Wire::new(0, Col::L));
        let mut public = Wires::trivial(0);
        public.set(Col::L, Wire::new(1, Col::L));
        let gates = vec![
            Gate::new(GateType::Generic, public, vec![Fp::ONE]),
            Gate::new(
                GateType::Generic,
                mul,
                vec![Fp::ZERO, Fp::ZERO, -Fp::ONE, Fp::ONE],
            ),
        ];
        ProverIndex::create(&gates, 1, urs).unwrap()
    }

    /// Column-major auxiliary witness for a public input `x` and multiplier `y`.
    fn auxiliary(n: usize, x: u64, y: u64) -> Vec<Fp> {
        // l column rows 1.., then r column, then o column.
        let mut aux = vec![Fp::ZERO; 3 * n - 1];
        aux[0] = Fp::from(x);
        aux[n - 1 + 1] = Fp::from(y);
        aux[2 * n - 1 + 1] = Fp::from(x * y);
        aux
    }

    #[test]
    fn test_prove_and_verify() {
        let index = circuit(4);
        let n = index.domains.d1.size();
        let proof =
            ProverProof::create(&index, &[Fp::from(3)], &auxiliary(n, 3, 5), vec![], Runtime::sequential())
                .unwrap();
        let vi = VerifierIndex::create(&index);
        let lagrange = index.urs.lagrange_basis(&index.domains.d1, Runtime::sequential());
        assert!(proof.verify(&lagrange, &vi).unwrap());

        let mut tampered = proof.clone();
        tampered.evals0.l[0] += Fp::ONE;
        assert!(!tampered.verify(&lagrange, &vi).unwrap());

        let mut wrong_public = proof.clone();
        wrong_public.public[0] = Fp::from(4);
        assert!(!wrong_public.verify(&lagrange, &vi).unwrap());

        assert!(!ProverProof::dummy().verify(&lagrange, &vi).unwrap());
    }

    #[test]
    fn test_unsatisfied_witness_is_rejected() {
        let index = circuit(4);
        let n = index.domains.d1.size();
        let mut aux = auxiliary(n, 3, 5);
        aux[2 * n] = Fp::from(16);
        let err = ProverProof::create(&index, &[Fp::from(3)], &aux, vec![], Runtime::sequential())
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsatisfied { row: 1, .. }));

        // Row 1's l must equal the public input.
        let aux = auxiliary(n, 4, 5);
        let err = ProverProof::create(&index, &[Fp::from(3)], &aux, vec![], Runtime::sequential())
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsatisfied { .. }));

        assert!(ProverProof::create(&index, &[], &aux, vec![], Runtime::sequential()).is_err());
    }

    #[test]
    fn test_previous_accumulators_are_checked() {
        let index = circuit(4);
        let n = index.domains.d1.size();
        let chals = vec![Fp::from(2), Fp::from(9)];
        let sg = index.urs.b_poly_commitment(&chals);
        let aux = auxiliary(n, 3, 5);
        let proof = ProverProof::create(
            &index,
            &[Fp::from(3)],
            &aux,
            vec![(chals.clone(), sg)],
            Runtime::sequential(),
        )
        .unwrap();
        let vi = VerifierIndex::create(&index);
        let lagrange = index.urs.lagrange_basis(&index.domains.d1, Runtime::sequential());
        assert!(proof.verify(&lagrange, &vi).unwrap());

        let wrong_sg = index.urs.b_poly_commitment(&[Fp::from(3), Fp::from(9)]);
        let proof = ProverProof::create(
            &index,
            &[Fp::from(3)],
            &aux,
            vec![(chals, wrong_sg)],
            Runtime::sequential(),
        )
        .unwrap();
        assert!(!proof.verify(&lagrange, &vi).unwrap());
    }

    #[test]
    fn test_batch_verify_is_conjunction() {
        let index = circuit(4);
        let n = index.domains.d1.size();
        let vi = VerifierIndex::create(&index);
        let lagrange = index.urs.lagrange_basis(&index.domains.d1, Runtime::sequential()).to_vec();
        let good = ProverProof::create(&index, &[Fp::from(3)], &auxiliary(n, 3, 5), vec![], Runtime::sequential())
            .unwrap();
        let batch = vec![
            (lagrange.clone(), vi.clone(), good.clone()),
            (lagrange.clone(), vi.clone(), good.clone()),
        ];
        assert!(ProverProof::batch_verify(batch, Runtime::sequential()).unwrap());
        let batch = vec![
            (lagrange.clone(), vi.clone(), good),
            (lagrange, vi, ProverProof::dummy()),
        ];
        assert!(!ProverProof::batch_verify(batch, Runtime::sequential()).unwrap());
        assert!(ProverProof::<Vesta>::batch_verify(vec![], Runtime::sequential()).unwrap());
    }

    #[test]
    fn test_oracles_match_proof() {
        let index = circuit(4);
        let n = index.domains.d1.size();
        let proof = ProverProof::create(&index, &[Fp::from(3)], &auxiliary(n, 3, 5), vec![], Runtime::sequential())
            .unwrap();
        let vi = VerifierIndex::create(&index);
        let lagrange = index.urs.lagrange_basis(&index.domains.d1, Runtime::sequential());
        let oracles = proof.oracles(&lagrange, &vi).unwrap();
        assert_eq!(oracles.opening_prechallenges.len(), 2);
        assert_eq!(oracles.p_eval0, -Fp::from(3) * vi.domain.evaluate_lagrange(0, oracles.o.zeta));
        assert!(ProverProof::dummy().oracles(&lagrange, &vi).is_err());
    }
}
