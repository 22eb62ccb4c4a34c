#![allow(dead_code)]

use anyhow::Result;
use ff::Field;
use plonk_bridge::facade::PlonkOps;
use plonk_bridge::native::Native;
use plonk_bridge::plonk_core::circuit::{Col, GateType, GateVector, Wire, Wires};
use plonk_bridge::plonk_core::{Fp, Vesta};
use plonk_bridge::{Bridge, BridgeConfig};

pub fn bridge() -> Result<Bridge> {
    Ok(Bridge::new(BridgeConfig::default())?)
}

/// `x · y = z` with `x` public: row 0 exposes `x`, row 1 multiplies.
pub fn mul_circuit(plonk: &PlonkOps<'_, Vesta>) -> Result<Native<GateVector<Fp>>> {
    let gates = plonk.gate_vector()?;
    let mut public = Wires::trivial(0);
    public.set(Col::L, Wire::new(1, Col::L));
    let mut mul = Wires::trivial(1);
    mul.set(Col::L, Wire::new(0, Col::L));
    plonk.gate_vector_add(&gates, plonk.gate(GateType::Generic, public, vec![Fp::ONE])?)?;
    plonk.gate_vector_add(
        &gates,
        plonk.gate(GateType::Generic, mul, vec![Fp::ZERO, Fp::ZERO, -Fp::ONE, Fp::ONE])?,
    )?;
    Ok(gates)
}

/// Column-major witness of [`mul_circuit`] after the public input.
pub fn mul_witness(n: usize, x: u64, y: u64) -> Vec<Fp> {
    let mut aux = vec![Fp::ZERO; 3 * n - 1];
    aux[0] = Fp::from(x);
    aux[n] = Fp::from(y);
    aux[2 * n] = Fp::from(x * y);
    aux
}
