//! Field arithmetic over 32-byte little-endian encodings.

use std::cmp::Ordering;

use crate::bigint::BigInt256;
use crate::error::{CoreError, Result};
use crate::field::{self as fe, PastaField};
use crate::imports::{Export, Slice};
use crate::module::Instance;

impl Instance {
    fn read_field<F: PastaField>(&self, arg: Slice) -> Result<F> {
        fe::from_bytes(&self.read_bytes(arg)?)
    }

    /// Reads both buffers before decoding either, so neither leaks.
    fn read_field_pair<F: PastaField>(&self, a: Slice, b: Slice) -> Result<(F, F)> {
        let (a, b) = (self.read_bytes(a)?, self.read_bytes(b)?);
        Ok((fe::from_bytes(&a)?, fe::from_bytes(&b)?))
    }

    fn write_field<F: PastaField>(&self, retptr: u32, value: &F) -> Result<()> {
        self.write_bytes(retptr, &fe::to_bytes(value))
    }

    fn unary<F: PastaField>(
        &self,
        export: &'static str,
        a: Slice,
        retptr: u32,
        op: impl FnOnce(F) -> Result<F>,
    ) -> Export<()> {
        self.guard(export, || {
            let a = self.read_field::<F>(a)?;
            self.write_field(retptr, &op(a)?)
        })
    }

    fn binary<F: PastaField>(
        &self,
        export: &'static str,
        a: Slice,
        b: Slice,
        retptr: u32,
        op: impl FnOnce(F, F) -> Result<F>,
    ) -> Export<()> {
        self.guard(export, || {
            let (a, b) = self.read_field_pair::<F>(a, b)?;
            self.write_field(retptr, &op(a, b)?)
        })
    }

    fn optional<F: PastaField>(
        &self,
        export: &'static str,
        a: Slice,
        retptr: u32,
        op: impl FnOnce(&F) -> Option<F>,
    ) -> Export<()> {
        self.guard(export, || {
            let a = self.read_field::<F>(a)?;
            let bytes = op(&a).map(|v| fe::to_bytes(&v));
            self.write_option(retptr, bytes.as_ref().map(|b| &b[..]))
        })
    }

    pub fn field_size_in_bits<F: PastaField>(&self) -> u32 {
        F::NUM_BITS
    }

    /// Modulus as a bigint.
    pub fn field_size<F: PastaField>(&self, retptr: u32) -> Export<()> {
        self.guard("field_size", || {
            let modulus = BigInt256::from_biguint(&fe::modulus::<F>())?;
            self.write_bytes(retptr, &modulus.to_bytes())
        })
    }

    pub fn field_add<F: PastaField>(&self, a: Slice, b: Slice, retptr: u32) -> Export<()> {
        self.binary::<F>("field_add", a, b, retptr, |a, b| Ok(a + b))
    }

    pub fn field_sub<F: PastaField>(&self, a: Slice, b: Slice, retptr: u32) -> Export<()> {
        self.binary::<F>("field_sub", a, b, retptr, |a, b| Ok(a - b))
    }

    pub fn field_mul<F: PastaField>(&self, a: Slice, b: Slice, retptr: u32) -> Export<()> {
        self.binary::<F>("field_mul", a, b, retptr, |a, b| Ok(a * b))
    }

    pub fn field_div<F: PastaField>(&self, a: Slice, b: Slice, retptr: u32) -> Export<()> {
        self.binary::<F>("field_div", a, b, retptr, |a, b| {
            let b_inv = fe::inverse(&b)
                .ok_or_else(|| CoreError::InvalidArgument("division by zero".into()))?;
            Ok(a * b_inv)
        })
    }

    pub fn field_negate<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.unary::<F>("field_negate", a, retptr, |a| Ok(-a))
    }

    pub fn field_square<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.unary::<F>("field_square", a, retptr, |a| Ok(a.square()))
    }

    /// `(is_some, ptr, len)`; none for zero.
    pub fn field_inv<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.optional::<F>("field_inv", a, retptr, fe::inverse)
    }

    /// `(is_some, ptr, len)`; none for non-residues.
    pub fn field_sqrt<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.optional::<F>("field_sqrt", a, retptr, fe::sqrt)
    }

    pub fn field_is_square<F: PastaField>(&self, a: Slice) -> Export<bool> {
        self.guard("field_is_square", || Ok(fe::is_square(&self.read_field::<F>(a)?)))
    }

    pub fn field_of_int<F: PastaField>(&self, i: i32, retptr: u32) -> Export<()> {
        self.guard("field_of_int", || {
            self.write_field(retptr, &fe::of_int::<F>(i64::from(i)))
        })
    }

    pub fn field_to_string<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.guard("field_to_string", || {
            let a = self.read_field::<F>(a)?;
            self.write_bytes(retptr, fe::to_decimal(&a).as_bytes())
        })
    }

    pub fn field_of_string<F: PastaField>(&self, s: Slice, retptr: u32) -> Export<()> {
        self.guard("field_of_string", || {
            let s = self.read_str(s)?;
            self.write_field(retptr, &fe::from_decimal::<F>(&s)?)
        })
    }

    pub fn field_print<F: PastaField>(&self, a: Slice) -> Export<()> {
        self.guard("field_print", || {
            let a = self.read_field::<F>(a)?;
            self.imports().log(&fe::to_decimal(&a));
            Ok(())
        })
    }

    /// -1, 0 or 1.
    pub fn field_compare<F: PastaField>(&self, a: Slice, b: Slice) -> Export<i32> {
        self.guard("field_compare", || {
            let (a, b) = self.read_field_pair::<F>(a, b)?;
            Ok(match fe::compare(&a, &b) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            })
        })
    }

    pub fn field_equal<F: PastaField>(&self, a: Slice, b: Slice) -> Export<bool> {
        self.guard("field_equal", || {
            let (a, b) = self.read_field_pair::<F>(a, b)?;
            Ok(a == b)
        })
    }

    /// Uniform element seeded from host entropy.
    pub fn field_random<F: PastaField>(&self, retptr: u32) -> Export<()> {
        self.guard("field_random", || {
            let mut seed = [0u8; 32];
            self.imports().fill_random(&mut seed)?;
            self.write_field(retptr, &fe::random_from_seed::<F>(seed))
        })
    }

    /// Deterministic element for `seed`.
    pub fn field_rng<F: PastaField>(&self, seed: i32, retptr: u32) -> Export<()> {
        self.guard("field_rng", || {
            self.write_field(retptr, &F::random(fe::seeded_rng(seed as u32 as u64)))
        })
    }

    pub fn field_to_bigint<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.guard("field_to_bigint", || {
            let a = self.read_field::<F>(a)?;
            self.write_bytes(retptr, &BigInt256::of_field(&a).to_bytes())
        })
    }

    pub fn field_of_bigint<F: PastaField>(&self, b: Slice, retptr: u32) -> Export<()> {
        self.guard("field_of_bigint", || {
            let b = BigInt256::from_bytes(&self.read_bytes(b)?)?;
            self.write_field(retptr, &b.to_field::<F>()?)
        })
    }

    pub fn field_two_adic_root_of_unity<F: PastaField>(&self, retptr: u32) -> Export<()> {
        self.guard("field_two_adic_root_of_unity", || {
            self.write_field(retptr, &F::ROOT_OF_UNITY)
        })
    }

    pub fn field_domain_generator<F: PastaField>(&self, log2: i32, retptr: u32) -> Export<()> {
        self.guard("field_domain_generator", || {
            let log2 = u32::try_from(log2)
                .map_err(|_| CoreError::InvalidArgument(format!("negative domain size 2^{log2}")))?;
            self.write_field(retptr, &fe::domain_generator::<F>(log2)?)
        })
    }

    /// Canonical encoding; the input must already be canonical.
    pub fn field_to_bytes<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.unary::<F>("field_to_bytes", a, retptr, Ok)
    }

    pub fn field_of_bytes<F: PastaField>(&self, bytes: Slice, retptr: u32) -> Export<()> {
        self.unary::<F>("field_of_bytes", bytes, retptr, Ok)
    }

    pub fn field_deep_copy<F: PastaField>(&self, a: Slice, retptr: u32) -> Export<()> {
        self.unary::<F>("field_deep_copy", a, retptr, Ok)
    }
}

#[cfg(test)]
mod tests {
    use ff::Field;
    use pasta_curves::Fp;

    use super::*;
    use crate::testing::TestCore;

    #[test]
    fn test_field_exports() {
        let core = TestCore::new();
        let inst = &core.instance;
        let a = core.pass(&fe::to_bytes(&Fp::from(6)));
        let b = core.pass(&fe::to_bytes(&Fp::from(4)));
        let ret = core.retptr();
        inst.field_sub::<Fp>(a, b, ret).unwrap();
        assert_eq!(fe::from_bytes::<Fp>(&core.take(ret)).unwrap(), Fp::from(2));

        let zero = core.pass(&fe::to_bytes(&Fp::ZERO));
        inst.field_inv::<Fp>(zero, ret).unwrap();
        assert!(core.take_option(ret).is_none());

        let a = core.pass(&fe::to_bytes(&Fp::from(6)));
        let zero = core.pass(&fe::to_bytes(&Fp::ZERO));
        let thrown = inst.field_div::<Fp>(a, zero, ret).unwrap_err();
        assert!(matches!(
            core.env.exception(thrown),
            Some(CoreError::InvalidArgument(_))
        ));
        assert_eq!(inst.field_size_in_bits::<Fp>(), 255);
        assert_eq!(core.live_allocations(), 0);
    }
}
