//! Prover index: a compiled circuit bound to a URS.

use std::path::Path;
use std::sync::Arc;

use ff::Field;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::NativeObject;
use crate::circuit::{Col, Gate, GateType, COLUMNS};
use crate::curve::PastaCurve;
use crate::domain::{evaluate, EvaluationDomains};
use crate::error::{CoreError, Result};
use crate::persist;
use crate::poly_comm::PolyComm;
use crate::urs::Urs;
use crate::verifier_index::{index_digest, VerificationEvals, VerificationShifts};

/// Rows reserved after the last gate.
pub const ZK_ROWS: usize = 3;

/// Number of generic coefficients: `ql, qr, qo, qm, qc`.
pub const GENERIC_COEFFS: usize = 5;

#[derive(Clone, Debug)]
pub struct ProverIndex<C: PastaCurve> {
    pub gates: Vec<Gate<C::Scalar>>,
    pub public: usize,
    pub domains: EvaluationDomains<C::Scalar>,
    pub max_poly_size: usize,
    pub max_quot_size: usize,
    pub urs: Arc<Urs<C>>,
    pub shifts: VerificationShifts<C::Scalar>,
    /// σ of every cell over d1, column by column.
    pub sigma: [Vec<C::Scalar>; COLUMNS],
    pub sigma_coeffs: [Vec<C::Scalar>; COLUMNS],
    /// Generic selector polynomials in coefficient form.
    pub selector_coeffs: [Vec<C::Scalar>; GENERIC_COEFFS],
    pub evals: VerificationEvals<C>,
}

/// On-disk form; the URS is supplied again when reading.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct ProverIndexRecord<C: PastaCurve> {
    gates: Vec<Gate<C::Scalar>>,
    public: u64,
}

impl<C: PastaCurve> ProverIndex<C> {
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME, gates = gates.len(), public = public))]
    pub fn create(gates: &[Gate<C::Scalar>], public: usize, urs: Arc<Urs<C>>) -> Result<Self> {
        if urs.depth() == 0 {
            return Err(CoreError::InvalidArgument("URS has no generators".into()));
        }
        if public > gates.len() {
            return Err(CoreError::InvalidArgument(format!(
                "{public} public inputs for {} gates",
                gates.len()
            )));
        }
        for (row, gate) in gates.iter().enumerate() {
            for wire in [gate.wires.l, gate.wires.r, gate.wires.o] {
                if wire.row as usize >= gates.len() {
                    return Err(CoreError::InvalidArgument(format!(
                        "gate {row} is wired to row {} of {}",
                        wire.row,
                        gates.len()
                    )));
                }
            }
        }

        let domains = EvaluationDomains::create(gates.len() + ZK_ROWS)?;
        let d1 = domains.d1;
        let n = d1.size();
        let shifts = VerificationShifts::standard();
        let omegas = d1.elements();
        let cell_id = |row: usize, col: usize| shifts.get(col) * omegas[row];

        let sigma: [Vec<C::Scalar>; COLUMNS] = std::array::from_fn(|col| {
            (0..n)
                .map(|row| match gates.get(row) {
                    Some(gate) => {
                        let wire = gate.wires.get(Col::ALL[col]);
                        cell_id(wire.row as usize, u8::from(wire.col) as usize)
                    }
                    None => cell_id(row, col),
                })
                .collect()
        });
        let sigma_coeffs = try_map_array(&sigma, |evals| d1.ifft(evals))?;

        let generic: [Vec<C::Scalar>; GENERIC_COEFFS] = std::array::from_fn(|k| {
            let mut evals = vec![C::Scalar::ZERO; n];
            for (row, gate) in gates.iter().enumerate() {
                if gate.typ == GateType::Generic {
                    evals[row] = gate.coeff(k);
                }
            }
            evals
        });
        let selector_coeffs = try_map_array(&generic, |evals| d1.ifft(evals))?;

        let commit_evals = |evals: &[C::Scalar]| -> Result<PolyComm<C>> {
            Ok(urs.commit(&d1.ifft(evals)?))
        };
        let indicator = |types: &[GateType]| -> Result<PolyComm<C>> {
            let evals: Vec<C::Scalar> = (0..n)
                .map(|row| match gates.get(row) {
                    Some(gate) if types.contains(&gate.typ) => C::Scalar::ONE,
                    _ => C::Scalar::ZERO,
                })
                .collect();
            commit_evals(&evals)
        };
        let poseidon_constant = |k: usize| -> Result<PolyComm<C>> {
            let evals: Vec<C::Scalar> = (0..n)
                .map(|row| match gates.get(row) {
                    Some(gate) if gate.typ == GateType::Poseidon => gate.coeff(k),
                    _ => C::Scalar::ZERO,
                })
                .collect();
            commit_evals(&evals)
        };

        let [ql, qr, qo, qm, qc] = &selector_coeffs;
        let evals = VerificationEvals {
            sigma_comm: sigma_coeffs.iter().map(|c| urs.commit(c)).collect(),
            ql_comm: urs.commit(ql),
            qr_comm: urs.commit(qr),
            qo_comm: urs.commit(qo),
            qm_comm: urs.commit(qm),
            qc_comm: urs.commit(qc),
            rcm_comm: (0..COLUMNS).map(poseidon_constant).collect::<Result<_>>()?,
            psm_comm: indicator(&[GateType::Poseidon])?,
            add_comm: indicator(&[GateType::Add1, GateType::Add2])?,
            mul1_comm: indicator(&[GateType::Vbmul1])?,
            mul2_comm: indicator(&[GateType::Vbmul2, GateType::Vbmul3])?,
            emul1_comm: indicator(&[GateType::Endomul1])?,
            emul2_comm: indicator(&[GateType::Endomul2])?,
            emul3_comm: indicator(&[GateType::Endomul3, GateType::Endomul4])?,
        };
        debug!(n, depth = urs.depth(), "index compiled");

        Ok(Self {
            gates: gates.to_vec(),
            public,
            max_poly_size: urs.depth(),
            max_quot_size: domains.d4.size(),
            domains,
            urs,
            shifts,
            sigma,
            sigma_coeffs,
            selector_coeffs,
            evals,
        })
    }

    pub fn max_degree(&self) -> usize {
        self.urs.depth()
    }

    pub const fn public_inputs(&self) -> usize {
        self.public
    }

    /// Identity of cell `(row, col)` under the permutation.
    pub fn cell_id(&self, row: usize, col: usize) -> C::Scalar {
        self.shifts.get(col) * self.domains.d1.element(row)
    }

    /// Generic gate polynomial `ql·l + qr·r + qo·o + qm·l·r + qc` at `x`.
    pub fn selector_eval(&self, x: C::Scalar, l: C::Scalar, r: C::Scalar, o: C::Scalar) -> C::Scalar {
        let [ql, qr, qo, qm, qc] = &self.selector_coeffs;
        evaluate(ql, x) * l + evaluate(qr, x) * r + evaluate(qo, x) * o + evaluate(qm, x) * l * r + evaluate(qc, x)
    }

    pub fn verifier_digest(&self) -> [u8; 32] {
        index_digest(
            &self.domains.d1,
            self.public,
            self.max_poly_size,
            &self.shifts,
            &self.evals,
            &self.urs,
        )
    }

    pub fn write(&self, path: &Path, append: bool) -> Result<()> {
        let record = ProverIndexRecord::<C> {
            gates: self.gates.clone(),
            public: self.public as u64,
        };
        persist::write_record(path, append, &record)
    }

    /// Reads a circuit and recompiles it against `urs`.
    pub fn read(path: &Path, offset: Option<u64>, urs: Arc<Urs<C>>) -> Result<Option<Self>> {
        let record: Option<ProverIndexRecord<C>> = persist::try_read_record(path, offset)?;
        record
            .map(|r| Self::create(&r.gates, r.public as usize, urs))
            .transpose()
    }
}

fn try_map_array<T, U, const N: usize>(
    items: &[T; N],
    f: impl Fn(&T) -> Result<U>,
) -> Result<[U; N]> {
    let out: Vec<U> = items.iter().map(f).collect::<Result<_>>()?;
    out.try_into()
        .map_err(|_| CoreError::InvalidArgument("column count mismatch".into()))
}

impl<C: PastaCurve> NativeObject for ProverIndex<C> {}

#[cfg(test)]
mod tests {
    use pasta_curves::Fp;

    use super::*;
    use crate::circuit::{Wire, Wires};
    use crate::curve::Vesta;

    fn gate(row: u32, c: Vec<Fp>) -> Gate<Fp> {
        Gate::new(GateType::Generic, Wires::trivial(row), c)
    }

    #[test]
    fn test_domain_sizes() {
        let urs = Arc::new(Urs::<Vesta>::create(4));
        let gates: Vec<_> = (0..5).map(|i| gate(i, vec![Fp::ONE])).collect();
        let index = ProverIndex::create(&gates, 1, urs).unwrap();
        assert_eq!(index.domains.d1.size(), 8);
        assert_eq!(index.domains.d4.size(), 32);
        assert_eq!(index.domains.d8.size(), 64);
        assert_eq!(index.max_degree(), 4);
        assert_eq!(index.public_inputs(), 1);
        assert_eq!(index.evals.sigma_comm.len(), 3);
        assert_eq!(index.evals.sigma_comm[0].chunks(), 2);
    }

    #[test]
    fn test_sigma_follows_wiring() {
        let urs = Arc::new(Urs::<Vesta>::create(8));
        let mut gates = vec![gate(0, vec![]), gate(1, vec![])];
        gates[1].wires.set(Col::R, Wire::new(0, Col::L));
        let index = ProverIndex::create(&gates, 0, urs).unwrap();
        assert_eq!(index.sigma[1][1], index.cell_id(0, 0));
        assert_eq!(index.sigma[0][1], index.cell_id(1, 0));
        assert_eq!(index.sigma[2][6], index.cell_id(6, 2));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let urs = Arc::new(Urs::<Vesta>::create(4));
        let gates = vec![gate(0, vec![])];
        assert!(ProverIndex::create(&gates, 2, urs.clone()).is_err());
        assert!(ProverIndex::create(&gates, 0, Arc::new(Urs::<Vesta>::empty())).is_err());
        let mut bad = gates.clone();
        bad[0].wires.set(Col::O, Wire::new(3, Col::L));
        assert!(ProverIndex::create(&bad, 0, urs).is_err());
    }

    #[test]
    fn test_selector_eval_matches_gate_on_rows() {
        let urs = Arc::new(Urs::<Vesta>::create(8));
        let c = vec![Fp::from(2), Fp::from(3), -Fp::ONE, Fp::from(5), Fp::from(7)];
        let gates = vec![gate(0, c.clone()), gate(1, vec![])];
        let index = ProverIndex::create(&gates, 0, urs).unwrap();
        let (l, r, o) = (Fp::from(11), Fp::from(13), Fp::from(17));
        let x = index.domains.d1.element(0);
        assert_eq!(index.selector_eval(x, l, r, o), gates[0].generic_residual(l, r, o));
    }

    #[test]
    fn test_write_then_read_recompiles() {
        let path = std::env::temp_dir().join(format!("plonk-index-{}.bin", std::process::id()));
        let urs = Arc::new(Urs::<Vesta>::create(4));
        let gates: Vec<_> = (0..3).map(|i| gate(i, vec![Fp::ONE])).collect();
        let index = ProverIndex::create(&gates, 1, urs.clone()).unwrap();
        index.write(&path, false).unwrap();
        let back = ProverIndex::read(&path, None, urs).unwrap().unwrap();
        assert_eq!(back.gates, index.gates);
        assert_eq!(back.domains, index.domains);
        assert_eq!(back.verifier_digest(), index.verifier_digest());
        std::fs::remove_file(&path).unwrap();
    }
}
