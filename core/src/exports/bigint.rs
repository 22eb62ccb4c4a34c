use crate::bigint::{BigInt256, BYTES_PER_LIMB, NUM_LIMBS};
use crate::error::Result;
use crate::imports::{Export, Slice};
use crate::module::Instance;

impl Instance {
    fn read_bigint(&self, arg: Slice) -> Result<BigInt256> {
        BigInt256::from_bytes(&self.read_bytes(arg)?)
    }

    pub fn bigint_of_numeral(&self, digits: Slice, base: u32, retptr: u32) -> Export<()> {
        self.guard("bigint_of_numeral", || {
            let digits = self.read_str(digits)?;
            self.write_bytes(retptr, &BigInt256::of_numeral(&digits, base)?.to_bytes())
        })
    }

    pub fn bigint_of_decimal_string(&self, digits: Slice, retptr: u32) -> Export<()> {
        self.guard("bigint_of_decimal_string", || {
            let digits = self.read_str(digits)?;
            self.write_bytes(retptr, &BigInt256::of_decimal_string(&digits)?.to_bytes())
        })
    }

    pub fn bigint_num_limbs(&self) -> i32 {
        NUM_LIMBS as i32
    }

    pub fn bigint_bytes_per_limb(&self) -> i32 {
        BYTES_PER_LIMB as i32
    }

    pub fn bigint_div(&self, a: Slice, b: Slice, retptr: u32) -> Export<()> {
        self.guard("bigint_div", || {
            let (a, b) = (self.read_bytes(a)?, self.read_bytes(b)?);
            let (a, b) = (BigInt256::from_bytes(&a)?, BigInt256::from_bytes(&b)?);
            self.write_bytes(retptr, &a.div(&b)?.to_bytes())
        })
    }

    pub fn bigint_compare(&self, a: Slice, b: Slice) -> Export<i32> {
        self.guard("bigint_compare", || {
            let (a, b) = (self.read_bytes(a)?, self.read_bytes(b)?);
            let (a, b) = (BigInt256::from_bytes(&a)?, BigInt256::from_bytes(&b)?);
            Ok(a.compare(&b) as i32)
        })
    }

    pub fn bigint_print(&self, a: Slice) -> Export<()> {
        self.guard("bigint_print", || {
            let a = self.read_bigint(a)?;
            self.imports().log(&a.to_string());
            Ok(())
        })
    }

    pub fn bigint_to_string(&self, a: Slice, retptr: u32) -> Export<()> {
        self.guard("bigint_to_string", || {
            let a = self.read_bigint(a)?;
            self.write_bytes(retptr, a.to_string().as_bytes())
        })
    }

    pub fn bigint_test_bit(&self, a: Slice, bit: i32) -> Export<bool> {
        self.guard("bigint_test_bit", || {
            let a = self.read_bigint(a)?;
            Ok(u32::try_from(bit).is_ok_and(|bit| a.test_bit(bit)))
        })
    }

    pub fn bigint_to_bytes(&self, a: Slice, retptr: u32) -> Export<()> {
        self.guard("bigint_to_bytes", || {
            let a = self.read_bigint(a)?;
            self.write_bytes(retptr, &a.to_bytes())
        })
    }

    pub fn bigint_of_bytes(&self, bytes: Slice, retptr: u32) -> Export<()> {
        self.guard("bigint_of_bytes", || {
            let a = self.read_bigint(bytes)?;
            self.write_bytes(retptr, &a.to_bytes())
        })
    }

    pub fn bigint_deep_copy(&self, a: Slice, retptr: u32) -> Export<()> {
        self.bigint_of_bytes(a, retptr)
    }
}
