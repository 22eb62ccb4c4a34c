//! Gates, wiring and the append-only gate vector.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

use crate::arena::NativeObject;
use crate::error::{CoreError, Result};
use crate::field::{serde_field_vec, PastaField};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Display,
    EnumCount,
    EnumIter,
    TryFromPrimitive,
    IntoPrimitive,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum GateType {
    #[default]
    Zero = 0,
    Generic = 1,
    Poseidon = 2,
    Add1 = 3,
    Add2 = 4,
    Vbmul1 = 5,
    Vbmul2 = 6,
    Vbmul3 = 7,
    Endomul1 = 8,
    Endomul2 = 9,
    Endomul3 = 10,
    Endomul4 = 11,
}

/// Witness column.
#[derive(
    Debug, Clone, Copy, Display, EnumIter, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Col {
    L = 0,
    R = 1,
    O = 2,
}

impl Col {
    pub const ALL: [Self; 3] = [Self::L, Self::R, Self::O];
}

/// Number of witness columns.
pub const COLUMNS: usize = 3;

/// A cell of the witness table, used as a back-reference by the permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    pub row: u32,
    pub col: Col,
}

impl Wire {
    pub const fn new(row: u32, col: Col) -> Self {
        Self { row, col }
    }
}

/// Where the three cells of a row are wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wires {
    pub row: u32,
    pub l: Wire,
    pub r: Wire,
    pub o: Wire,
}

impl Wires {
    /// Every cell wired to itself.
    pub const fn trivial(row: u32) -> Self {
        Self {
            row,
            l: Wire::new(row, Col::L),
            r: Wire::new(row, Col::R),
            o: Wire::new(row, Col::O),
        }
    }

    pub const fn get(&self, col: Col) -> Wire {
        match col {
            Col::L => self.l,
            Col::R => self.r,
            Col::O => self.o,
        }
    }

    pub fn set(&mut self, col: Col, wire: Wire) {
        match col {
            Col::L => self.l = wire,
            Col::R => self.r = wire,
            Col::O => self.o = wire,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Gate<F: PastaField> {
    pub typ: GateType,
    pub wires: Wires,
    #[serde(with = "serde_field_vec")]
    pub c: Vec<F>,
}

impl<F: PastaField> Gate<F> {
    pub fn new(typ: GateType, wires: Wires, c: Vec<F>) -> Self {
        Self { typ, wires, c }
    }

    /// Coefficient `i`, zero when absent.
    pub fn coeff(&self, i: usize) -> F {
        self.c.get(i).copied().unwrap_or(F::ZERO)
    }

    /// `ql·l + qr·r + qo·o + qm·l·r + qc` for a generic gate.
    pub fn generic_residual(&self, l: F, r: F, o: F) -> F {
        self.coeff(0) * l + self.coeff(1) * r + self.coeff(2) * o + self.coeff(3) * l * r + self.coeff(4)
    }
}

/// Append-only list of gates. Wiring seals it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateVector<F: PastaField> {
    gates: Vec<Gate<F>>,
    sealed: bool,
}

impl<F: PastaField> GateVector<F> {
    pub fn new() -> Self {
        Self {
            gates: Vec::new(),
            sealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    pub fn add(&mut self, gate: Gate<F>) -> Result<()> {
        if self.sealed {
            return Err(CoreError::Sealed);
        }
        self.gates.push(gate);
        Ok(())
    }

    pub fn get(&self, i: usize) -> Result<Gate<F>> {
        self.gates.get(i).cloned().ok_or_else(|| {
            CoreError::InvalidArgument(format!("gate {i} out of range ({} gates)", self.gates.len()))
        })
    }

    /// Rewires the `target` cell to point at `head`.
    pub fn wrap(&mut self, target: Wire, head: Wire) -> Result<()> {
        let rows = self.gates.len();
        for wire in [target, head] {
            if wire.row as usize >= rows {
                return Err(CoreError::InvalidArgument(format!(
                    "wire row {} out of range ({rows} gates)",
                    wire.row
                )));
            }
        }
        self.gates[target.row as usize].wires.set(target.col, head);
        self.sealed = true;
        Ok(())
    }
}

impl NativeObject for Wire {}
impl NativeObject for Wires {}
impl<F: PastaField> NativeObject for Gate<F> {}
impl<F: PastaField> NativeObject for GateVector<F> {}

#[cfg(test)]
mod tests {
    use ff::Field;
    use pasta_curves::Fp;

    use super::*;

    fn generic(row: u32) -> Gate<Fp> {
        Gate::new(GateType::Generic, Wires::trivial(row), vec![Fp::ONE, Fp::ONE, -Fp::ONE])
    }

    #[test]
    fn test_gate_type_codes() {
        assert_eq!(u8::from(GateType::Endomul4), 11);
        assert_eq!(GateType::try_from(1u8).unwrap(), GateType::Generic);
        assert!(GateType::try_from(12u8).is_err());
        assert_eq!(Col::try_from(2u8).unwrap(), Col::O);
    }

    #[test]
    fn test_generic_residual() {
        let gate = generic(0);
        assert_eq!(gate.generic_residual(Fp::from(2), Fp::from(3), Fp::from(5)), Fp::ZERO);
        assert_eq!(gate.coeff(4), Fp::ZERO);
    }

    #[test]
    fn test_wrap_rewires_and_seals() {
        let mut v = GateVector::new();
        v.add(generic(0)).unwrap();
        v.add(generic(1)).unwrap();
        v.wrap(Wire::new(1, Col::L), Wire::new(0, Col::O)).unwrap();
        assert_eq!(v.get(1).unwrap().wires.l, Wire::new(0, Col::O));
        assert!(v.is_sealed());
        assert_eq!(v.add(generic(2)), Err(CoreError::Sealed));
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_wrap_out_of_range() {
        let mut v = GateVector::new();
        v.add(generic(0)).unwrap();
        assert!(v.wrap(Wire::new(0, Col::L), Wire::new(3, Col::R)).is_err());
        assert!(!v.is_sealed());
        assert!(v.get(1).is_err());
    }
}
