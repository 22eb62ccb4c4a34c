//! 256-bit unsigned integers exchanged as 32 little-endian bytes.

use std::cmp::Ordering;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::field::{self, PastaField};

/// Number of 64-bit limbs in a [`BigInt256`].
pub const NUM_LIMBS: u32 = 4;
pub const BYTES_PER_LIMB: u32 = 8;
const BYTES: usize = (NUM_LIMBS * BYTES_PER_LIMB) as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BigInt256(pub [u8; BYTES]);

impl BigInt256 {
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        let bytes = value.to_bytes_le();
        if bytes.len() > BYTES {
            return Err(CoreError::InvalidArgument(format!(
                "{value} does not fit in 256 bits"
            )));
        }
        let mut out = [0u8; BYTES];
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(Self(out))
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; BYTES] = bytes.try_into().map_err(|_| {
            CoreError::Decode(format!("expected {BYTES} bytes for a bigint, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    pub const fn to_bytes(&self) -> [u8; BYTES] {
        self.0
    }

    /// Parses `digits` in the given radix (2 to 36).
    pub fn of_numeral(digits: &str, base: u32) -> Result<Self> {
        if !(2..=36).contains(&base) {
            return Err(CoreError::InvalidArgument(format!("unsupported base {base}")));
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), base).ok_or_else(|| {
            CoreError::Decode(format!("{digits:?} is not a base-{base} numeral"))
        })?;
        Self::from_biguint(&value)
    }

    pub fn of_decimal_string(digits: &str) -> Result<Self> {
        Self::of_numeral(digits, 10)
    }

    /// Truncating division.
    pub fn div(&self, divisor: &Self) -> Result<Self> {
        let d = divisor.to_biguint();
        if d.bits() == 0 {
            return Err(CoreError::InvalidArgument("division by zero".into()));
        }
        Self::from_biguint(&(self.to_biguint() / d))
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.to_biguint().cmp(&other.to_biguint())
    }

    pub fn test_bit(&self, bit: u32) -> bool {
        bit < 256 && (self.0[(bit / 8) as usize] >> (bit % 8)) & 1 == 1
    }

    pub fn of_field<F: PastaField>(value: &F) -> Self {
        Self(field::to_bytes(value))
    }

    pub fn to_field<F: PastaField>(&self) -> Result<F> {
        field::from_biguint(&self.to_biguint())
    }
}

impl std::fmt::Display for BigInt256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}
