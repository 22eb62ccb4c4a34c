//! Field arithmetic over 32-byte little-endian encodings.

use std::cmp::Ordering;
use std::marker::PhantomData;

use plonk_core::bigint::BigInt256;
use plonk_core::field::{self as fe, PastaField};
use tracing::instrument;

use crate::context::Bridge;
use crate::error::{BridgeError, Result};
use crate::marshal::ReturnArea;

/// Field operations evaluated by the core.
#[derive(Clone, Copy, Debug)]
pub struct FieldOps<'a, F> {
    bridge: &'a Bridge,
    _field: PhantomData<F>,
}

impl<'a, F: PastaField> FieldOps<'a, F> {
    pub(crate) fn new(bridge: &'a Bridge) -> Self {
        Self {
            bridge,
            _field: PhantomData,
        }
    }

    fn pass(&self, value: &F) -> Result<plonk_core::Slice> {
        self.bridge.pass_bytes(&fe::to_bytes(value))
    }

    fn take(ret: &ReturnArea<'_>) -> Result<F> {
        Ok(fe::from_bytes(&ret.take_bytes()?)?)
    }

    fn take_option(ret: &ReturnArea<'_>) -> Result<Option<F>> {
        ret.take_option()?
            .map(|bytes| fe::from_bytes(&bytes).map_err(BridgeError::from))
            .transpose()
    }

    fn unary(
        &self,
        a: &F,
        f: impl FnOnce(&plonk_core::Instance, plonk_core::Slice, u32) -> plonk_core::Export<()>,
    ) -> Result<F> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| f(core, a, ret.ptr()))?;
        Self::take(&ret)
    }

    fn binary(
        &self,
        a: &F,
        b: &F,
        f: impl FnOnce(&plonk_core::Instance, plonk_core::Slice, plonk_core::Slice, u32) -> plonk_core::Export<()>,
    ) -> Result<F> {
        let ret = self.bridge.return_area()?;
        let (a, b) = (self.pass(a)?, self.pass(b)?);
        self.bridge.call(|core| f(core, a, b, ret.ptr()))?;
        Self::take(&ret)
    }

    fn nullary(&self, f: impl FnOnce(&plonk_core::Instance, u32) -> plonk_core::Export<()>) -> Result<F> {
        let ret = self.bridge.return_area()?;
        self.bridge.call(|core| f(core, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn size_in_bits(&self) -> u32 {
        self.bridge.instance().field_size_in_bits::<F>()
    }

    /// The modulus.
    pub fn size(&self) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        self.bridge.call(|core| core.field_size::<F>(ret.ptr()))?;
        Ok(BigInt256::from_bytes(&ret.take_bytes()?)?)
    }

    pub fn add(&self, a: &F, b: &F) -> Result<F> {
        self.binary(a, b, |core, a, b, r| core.field_add::<F>(a, b, r))
    }

    pub fn sub(&self, a: &F, b: &F) -> Result<F> {
        self.binary(a, b, |core, a, b, r| core.field_sub::<F>(a, b, r))
    }

    pub fn mul(&self, a: &F, b: &F) -> Result<F> {
        self.binary(a, b, |core, a, b, r| core.field_mul::<F>(a, b, r))
    }

    /// Fails when `b` is zero.
    pub fn div(&self, a: &F, b: &F) -> Result<F> {
        self.binary(a, b, |core, a, b, r| core.field_div::<F>(a, b, r))
    }

    pub fn negate(&self, a: &F) -> Result<F> {
        self.unary(a, |core, a, r| core.field_negate::<F>(a, r))
    }

    pub fn square(&self, a: &F) -> Result<F> {
        self.unary(a, |core, a, r| core.field_square::<F>(a, r))
    }

    /// `None` for zero.
    pub fn inv(&self, a: &F) -> Result<Option<F>> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_inv::<F>(a, ret.ptr()))?;
        Self::take_option(&ret)
    }

    /// `None` for non-residues.
    pub fn sqrt(&self, a: &F) -> Result<Option<F>> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_sqrt::<F>(a, ret.ptr()))?;
        Self::take_option(&ret)
    }

    pub fn is_square(&self, a: &F) -> Result<bool> {
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_is_square::<F>(a))
    }

    pub fn of_int(&self, i: i32) -> Result<F> {
        self.nullary(|core, r| core.field_of_int::<F>(i, r))
    }

    /// Decimal representation.
    pub fn to_string(&self, a: &F) -> Result<String> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_to_string::<F>(a, ret.ptr()))?;
        ret.take_string()
    }

    pub fn of_string(&self, s: &str) -> Result<F> {
        let ret = self.bridge.return_area()?;
        let s = self.bridge.pass_str(s)?;
        self.bridge.call(|core| core.field_of_string::<F>(s, ret.ptr()))?;
        Self::take(&ret)
    }

    /// Logs the element through the core.
    pub fn print(&self, a: &F) -> Result<()> {
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_print::<F>(a))
    }

    pub fn compare(&self, a: &F, b: &F) -> Result<Ordering> {
        let (a, b) = (self.pass(a)?, self.pass(b)?);
        let ord = self.bridge.call(|core| core.field_compare::<F>(a, b))?;
        Ok(ord.cmp(&0))
    }

    pub fn equal(&self, a: &F, b: &F) -> Result<bool> {
        let (a, b) = (self.pass(a)?, self.pass(b)?);
        self.bridge.call(|core| core.field_equal::<F>(a, b))
    }

    /// Uniform element drawn from the host entropy provider.
    pub fn random(&self) -> Result<F> {
        self.nullary(|core, r| core.field_random::<F>(r))
    }

    /// Deterministic element for `seed`.
    pub fn rng(&self, seed: i32) -> Result<F> {
        self.nullary(|core, r| core.field_rng::<F>(seed, r))
    }

    pub fn to_bigint(&self, a: &F) -> Result<BigInt256> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_to_bigint::<F>(a, ret.ptr()))?;
        Ok(BigInt256::from_bytes(&ret.take_bytes()?)?)
    }

    /// Fails when `b` is not below the modulus.
    pub fn of_bigint(&self, b: &BigInt256) -> Result<F> {
        let ret = self.bridge.return_area()?;
        let b = self.bridge.pass_bytes(&b.to_bytes())?;
        self.bridge.call(|core| core.field_of_bigint::<F>(b, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn two_adic_root_of_unity(&self) -> Result<F> {
        self.nullary(|core, r| core.field_two_adic_root_of_unity::<F>(r))
    }

    /// Generator of the multiplicative subgroup of order `2^log2`.
    pub fn domain_generator(&self, log2: i32) -> Result<F> {
        self.nullary(|core, r| core.field_domain_generator::<F>(log2, r))
    }

    pub fn to_bytes(&self, a: &F) -> Result<Vec<u8>> {
        let ret = self.bridge.return_area()?;
        let a = self.pass(a)?;
        self.bridge.call(|core| core.field_to_bytes::<F>(a, ret.ptr()))?;
        ret.take_bytes()
    }

    #[instrument(level = "trace", skip_all, fields(len = bytes.len()))]
    pub fn of_bytes(&self, bytes: &[u8]) -> Result<F> {
        let ret = self.bridge.return_area()?;
        let bytes = self.bridge.pass_bytes(bytes)?;
        self.bridge.call(|core| core.field_of_bytes::<F>(bytes, ret.ptr()))?;
        Self::take(&ret)
    }

    pub fn deep_copy(&self, a: &F) -> Result<F> {
        self.unary(a, |core, a, r| core.field_deep_copy::<F>(a, r))
    }
}
