//! 256-bit integers.

use std::cmp::Ordering;

use plonk_core::bigint::BigInt256;

use crate::context::Bridge;
use crate::error::Result;
use crate::marshal::ReturnArea;

#[derive(Clone, Copy, Debug)]
pub struct BigIntOps<'a> {
    bridge: &'a Bridge,
}

impl<'a> BigIntOps<'a> {
    pub(crate) const fn new(bridge: &'a Bridge) -> Self {
        Self { bridge }
    }

    fn pass(&self, a: &BigInt256) -> Result<plonk_core::Slice> {
        self.bridge.pass_bytes(&a.to_bytes())
    }

    fn take(ret: &ReturnArea<'_>) -> Result<BigInt256> {
        Ok(BigInt256::from_bytes(&ret.take_bytes()?)?)
    }

    /// Parses `digits` in radix `base` (2 to 36).
    pub fn of_numeral(&self, digits: &str, base: u32) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let digits = self.bridge.pass_str(digits)?;
        self.bridge.call(|core| core.bigint_of_numeral(digits, base, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn of_decimal_string(&self, digits: &str) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let digits = self.bridge.pass_str(digits)?;
        self.bridge.call(|core| core.bigint_of_decimal_string(digits, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn num_limbs(&self) -> i32 {
        self.bridge.instance().bigint_num_limbs()
    }

    pub fn bytes_per_limb(&self) -> i32 {
        self.bridge.instance().bigint_bytes_per_limb()
    }

    /// Truncating division. Fails on a zero divisor.
    pub fn div(&self, a: &BigInt256, b: &BigInt256) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let (a, b) = (self.pass(a)?, self.pass(b)?);
        self.bridge.call(|core| core.bigint_div(a, b, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn compare(&self, a: &BigInt256, b: &BigInt256) -> Result<Ordering> {
        let (a, b) = (self.pass(a)?, self.pass(b)?);
        Ok(self.bridge.call(|core| core.bigint_compare(a, b))?.cmp(&0))
    }

    pub fn print(&self, a: &BigInt256) -> Result<()> {
        let a = self.pass(a)?;
        self.bridge.call(|core| core.bigint_print(a))
    }

    pub fn to_string(&self, a: &BigInt256) -> Result<String> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.bigint_to_string(a, ret.ptr()))?;
        ret.take_string()
    }

    pub fn test_bit(&self, a: &BigInt256, bit: i32) -> Result<bool> {
        let a = self.pass(a)?;
        self.bridge.call(|core| core.bigint_test_bit(a, bit))
    }

    pub fn to_bytes(&self, a: &BigInt256) -> Result<Vec<u8>> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.bigint_to_bytes(a, ret.ptr()))?;
        ret.take_bytes()
    }

    pub fn of_bytes(&self, bytes: &[u8]) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let bytes = self.bridge.pass_bytes(bytes)?;
        self.bridge.call(|core| core.bigint_of_bytes(bytes, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn deep_copy(&self, a: &BigInt256) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.bigint_deep_copy(a, ret.ptr()))?;
        Self::take(&ret)
    }
}
