use std::sync::Arc;

use anyhow::Result;
use ff::Field;
use plonk_core::circuit::{Col, Gate, GateType, Wire, Wires};
use plonk_core::index::ProverIndex;
use plonk_core::proof::ProverProof;
use plonk_core::runtime::Runtime;
use plonk_core::urs::Urs;
use plonk_core::verifier_index::VerifierIndex;
use plonk_core::{Fp, Fq, Pallas, Vesta};

/// `x · y = z` with `x` public: row 0 exposes `x`, row 1 multiplies.
fn mul_circuit() -> Vec<Gate<Fp>> {
    let mut public = Wires::trivial(0);
    public.set(Col::L, Wire::new(1, Col::L));
    let mut mul = Wires::trivial(1);
    mul.set(Col::L, Wire::new(0, Col::L));
    vec![
        Gate::new(GateType::Generic, public, vec![Fp::ONE]),
        Gate::new(
            GateType::Generic,
            mul,
            vec![Fp::ZERO, Fp::ZERO, -Fp::ONE, Fp::ONE],
        ),
    ]
}

/// Column-major witness after the public input.
fn mul_witness(n: usize, x: u64, y: u64) -> Vec<Fp> {
    let mut aux = vec![Fp::ZERO; 3 * n - 1];
    aux[0] = Fp::from(x);
    aux[n] = Fp::from(y);
    aux[2 * n] = Fp::from(x * y);
    aux
}

#[test]
fn test_prove_verify_round() -> Result<()> {
    let urs = Arc::new(Urs::<Vesta>::create(8));
    let index = ProverIndex::create(&mul_circuit(), 1, urs.clone())?;
    let n = index.domains.d1.size();
    let rt = Runtime::sequential();
    let proof = ProverProof::create(&index, &[Fp::from(7)], &mul_witness(n, 7, 6), vec![], rt)?;

    let vi = VerifierIndex::create(&index);
    let lagrange = urs.lagrange_basis(&vi.domain, rt);
    assert!(proof.verify(&lagrange, &vi)?);

    // A verifier index for another circuit rejects the proof.
    let mut other_gates = mul_circuit();
    other_gates[1].c[3] = Fp::from(2);
    let other = VerifierIndex::create(&ProverIndex::create(&other_gates, 1, urs)?);
    assert!(!proof.verify(&lagrange, &other)?);
    Ok(())
}

#[test]
fn test_single_gate_dummy_scenario() -> Result<()> {
    let urs = Arc::new(Urs::<Vesta>::create(1));
    let gates = vec![Gate::new(GateType::Generic, Wires::trivial(0), vec![Fp::ONE])];
    let index = ProverIndex::create(&gates, 1, urs.clone())?;
    let vi = VerifierIndex::create(&index);
    let lagrange = urs.lagrange_basis(&vi.domain, Runtime::sequential());
    let first = ProverProof::dummy().verify(&lagrange, &vi)?;
    let second = ProverProof::dummy().verify(&lagrange, &vi)?;
    assert_eq!(first, second);
    assert!(!first);

    let proof = ProverProof::create(&index, &[Fp::from(9)], &[], vec![], Runtime::sequential())?;
    assert!(proof.verify(&lagrange, &vi)?);
    Ok(())
}

#[test]
fn test_batch_matches_individual_verification() -> Result<()> {
    let urs = Arc::new(Urs::<Vesta>::create(4));
    let rt = Runtime::sequential();
    let index = ProverIndex::create(&mul_circuit(), 1, urs.clone())?;
    let n = index.domains.d1.size();
    let vi = VerifierIndex::create(&index);
    let lagrange = urs.lagrange_basis(&vi.domain, rt).to_vec();

    let p1 = ProverProof::create(&index, &[Fp::from(2)], &mul_witness(n, 2, 3), vec![], rt)?;
    let p2 = ProverProof::create(&index, &[Fp::from(4)], &mul_witness(n, 4, 5), vec![], rt)?;
    let mut p3 = p2.clone();
    p3.proof.z1 += Fp::ONE;

    for (a, b) in [(&p1, &p2), (&p1, &p3), (&p3, &p1)] {
        let individually = a.verify(&lagrange, &vi)? && b.verify(&lagrange, &vi)?;
        let batch = vec![
            (lagrange.clone(), vi.clone(), a.clone()),
            (lagrange.clone(), vi.clone(), b.clone()),
        ];
        assert_eq!(ProverProof::batch_verify(batch, rt)?, individually);
    }
    Ok(())
}

#[test]
fn test_index_persistence_preserves_sizes() -> Result<()> {
    let path = std::env::temp_dir().join(format!("plonk-core-it-{}.bin", std::process::id()));
    let urs = Arc::new(Urs::<Pallas>::create(4));
    let gates: Vec<Gate<Fq>> = (0..6)
        .map(|row| Gate::new(GateType::Generic, Wires::trivial(row), vec![]))
        .collect();
    let index = ProverIndex::create(&gates, 2, urs.clone())?;
    index.write(&path, false)?;
    index.write(&path, true)?;
    let first_len = {
        let single = std::env::temp_dir().join(format!("plonk-core-it-single-{}.bin", std::process::id()));
        index.write(&single, false)?;
        let len = std::fs::metadata(&single)?.len();
        std::fs::remove_file(&single)?;
        len
    };
    let read = ProverIndex::read(&path, Some(first_len), urs)?.ok_or_else(|| anyhow::anyhow!("missing index"))?;
    assert_eq!(read.max_degree(), index.max_degree());
    assert_eq!(read.public_inputs(), index.public_inputs());
    assert_eq!(read.domains.d1.size(), index.domains.d1.size());
    assert_eq!(read.domains.d4.size(), index.domains.d4.size());
    assert_eq!(read.domains.d8.size(), index.domains.d8.size());
    std::fs::remove_file(&path)?;
    Ok(())
}
