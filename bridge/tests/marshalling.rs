mod common;

use std::cmp::Ordering;
use std::thread;

use anyhow::Result;
use ff::{Field, PrimeField};
use plonk_bridge::plonk_core::bigint::BigInt256;
use plonk_bridge::plonk_core::{Fp, Fq};
use proptest::prelude::*;

fn fp_from_seed(seed: u64) -> Fp {
    Fp::from(seed).square() + Fp::from(seed.rotate_left(17)) * Fp::MULTIPLICATIVE_GENERATOR
}

#[test]
fn test_field_arithmetic_matches_host() -> Result<()> {
    let bridge = common::bridge()?;
    let fp = bridge.fp();
    let (a, b) = (fp_from_seed(11), fp_from_seed(29));

    assert_eq!(fp.add(&a, &b)?, a + b);
    assert_eq!(fp.sub(&a, &b)?, a - b);
    assert_eq!(fp.mul(&a, &b)?, a * b);
    assert_eq!(fp.div(&a, &b)?, a * b.invert().unwrap());
    assert_eq!(fp.negate(&a)?, -a);
    assert_eq!(fp.square(&a)?, a.square());
    assert_eq!(fp.of_int(-5)?, -Fp::from(5));
    assert!(fp.div(&a, &Fp::ZERO).is_err());

    assert_eq!(fp.inv(&Fp::ZERO)?, None);
    assert_eq!(fp.inv(&a)?, Some(a.invert().unwrap()));
    let sq = a.square();
    assert!(fp.is_square(&sq)?);
    let root = fp.sqrt(&sq)?.unwrap();
    assert_eq!(root.square(), sq);
    assert_eq!(fp.sqrt(&Fp::MULTIPLICATIVE_GENERATOR)?, None);

    assert_eq!(fp.compare(&Fp::from(2), &Fp::from(3))?, Ordering::Less);
    assert!(fp.equal(&a, &fp.deep_copy(&a)?)?);
    assert_eq!(fp.rng(7)?, fp.rng(7)?);
    assert_ne!(fp.random()?, fp.random()?);
    assert_eq!(bridge.live_allocations(), 0);
    Ok(())
}

#[test]
fn test_field_constants() -> Result<()> {
    let bridge = common::bridge()?;
    let fq = bridge.fq();
    assert_eq!(fq.size_in_bits(), Fq::NUM_BITS);
    let modulus = fq.size()?;
    let minus_one = fq.to_bigint(&-Fq::ONE)?;
    assert_eq!(bridge.bigint().compare(&minus_one, &modulus)?, Ordering::Less);
    assert!(fq.of_bigint(&modulus).is_err());

    let root = fq.two_adic_root_of_unity()?;
    assert_eq!(root, Fq::ROOT_OF_UNITY);
    let g = fq.domain_generator(3)?;
    assert_eq!(g.pow_vartime([8]), Fq::ONE);
    assert_ne!(g.pow_vartime([4]), Fq::ONE);
    Ok(())
}

#[test]
fn test_strings_and_bigints() -> Result<()> {
    let bridge = common::bridge()?;
    let fp = bridge.fp();
    let x = fp.of_string("123456789012345678901234567890")?;
    assert_eq!(fp.to_string(&x)?, "123456789012345678901234567890");
    assert!(fp.of_string("12ab").is_err());
    fp.print(&x)?;

    let big = bridge.bigint();
    assert_eq!(big.num_limbs(), 4);
    assert_eq!(big.bytes_per_limb(), 8);
    let a = big.of_decimal_string("1000000")?;
    let b = big.of_numeral("ff", 16)?;
    assert_eq!(big.to_string(&big.div(&a, &b)?)?, "3921");
    assert!(big.test_bit(&b, 7)?);
    assert!(!big.test_bit(&b, 8)?);
    assert!(!big.test_bit(&b, -1)?);
    assert_eq!(big.of_bytes(&big.to_bytes(&a)?)?, a);
    assert_eq!(big.deep_copy(&a)?, a);
    assert!(big.div(&a, &BigInt256::default()).is_err());
    assert!(big.of_bytes(&[1, 2, 3]).is_err());
    assert_eq!(bridge.live_allocations(), 0);
    Ok(())
}

#[test]
fn test_concurrent_calls_on_shared_bridge() -> Result<()> {
    let bridge = common::bridge()?;
    let baseline = bridge.live_allocations();
    let workers: Vec<_> = (0..8u64)
        .map(|t| {
            let bridge = bridge.clone();
            thread::spawn(move || -> Result<usize> {
                let fp = bridge.fp();
                let seven = Fp::from(7);
                let mut wrong = 0;
                for i in 0..500 {
                    let a = fp_from_seed(t * 1_000 + i);
                    if fp.add(&a, &seven)? != a + seven {
                        wrong += 1;
                    }
                    if fp.to_string(&seven)? != "7" {
                        wrong += 1;
                    }
                }
                Ok(wrong)
            })
        })
        .collect();
    for worker in workers {
        let wrong = worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))??;
        assert_eq!(wrong, 0);
    }
    assert_eq!(bridge.live_allocations(), baseline);
    assert_eq!(
        bridge.instance().image().memory().stack_pointer(),
        common::bridge()?.instance().image().memory().stack_pointer()
    );
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(20))]

    #[test]
    fn test_field_bytes_round_trip(seed in any::<u64>()) {
        let bridge = common::bridge().unwrap();
        let fp = bridge.fp();
        let x = fp_from_seed(seed);
        let bytes = fp.to_bytes(&x).unwrap();
        let repr = x.to_repr();
        prop_assert_eq!(bytes.as_slice(), repr.as_slice());
        prop_assert_eq!(fp.of_bytes(&bytes).unwrap(), x);
        prop_assert_eq!(bridge.live_allocations(), 0);
    }

    #[test]
    fn test_strings_round_trip(s in "\\PC{0,64}") {
        let bridge = common::bridge().unwrap();
        let slice = bridge.pass_str(&s).unwrap();
        prop_assert_eq!(slice.len as usize, s.len());
        prop_assert_eq!(bridge.take_string(slice.ptr, slice.len).unwrap(), s);
        prop_assert_eq!(bridge.live_allocations(), 0);
    }
}
