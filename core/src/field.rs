//! Pasta scalar and base fields as seen from the boundary.
//!
//! Elements cross the boundary as 32-byte little-endian canonical encodings.

use std::cmp::Ordering;

use ff::PrimeField;
use num_bigint::BigUint;
use pasta_curves::{Fp, Fq};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{CoreError, Result};

/// Bytes in one encoded field element.
pub const FIELD_BYTES: usize = 32;

/// A Pasta prime field with a 32-byte canonical encoding.
pub trait PastaField: PrimeField<Repr = [u8; FIELD_BYTES]> {
    const NAME: &'static str;
}

impl PastaField for Fp {
    const NAME: &'static str = "Fp";
}

impl PastaField for Fq {
    const NAME: &'static str = "Fq";
}

pub fn from_bytes<F: PastaField>(bytes: &[u8]) -> Result<F> {
    let repr: [u8; FIELD_BYTES] = bytes.try_into().map_err(|_| {
        CoreError::Decode(format!(
            "expected {FIELD_BYTES} bytes for {}, got {}",
            F::NAME,
            bytes.len()
        ))
    })?;
    Option::from(F::from_repr(repr))
        .ok_or_else(|| CoreError::Decode(format!("non-canonical {} encoding", F::NAME)))
}

pub fn to_bytes<F: PastaField>(value: &F) -> [u8; FIELD_BYTES] {
    value.to_repr()
}

/// Decodes a flat byte array of concatenated elements.
pub fn vec_from_bytes<F: PastaField>(bytes: &[u8]) -> Result<Vec<F>> {
    if bytes.len() % FIELD_BYTES != 0 {
        return Err(CoreError::Decode(format!(
            "{} bytes do not form a vector of {} elements",
            bytes.len(),
            F::NAME
        )));
    }
    bytes.chunks_exact(FIELD_BYTES).map(from_bytes).collect()
}

pub fn vec_to_bytes<F: PastaField>(values: &[F]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_repr()).collect()
}

pub fn to_biguint<F: PastaField>(value: &F) -> BigUint {
    BigUint::from_bytes_le(&value.to_repr())
}

/// The field modulus.
pub fn modulus<F: PastaField>() -> BigUint {
    to_biguint(&-F::ONE) + 1u32
}

pub fn from_biguint<F: PastaField>(value: &BigUint) -> Result<F> {
    if *value >= modulus::<F>() {
        return Err(CoreError::InvalidArgument(format!(
            "{value} is not below the {} modulus",
            F::NAME
        )));
    }
    let mut repr = [0u8; FIELD_BYTES];
    let bytes = value.to_bytes_le();
    repr[..bytes.len()].copy_from_slice(&bytes);
    from_bytes(&repr)
}

pub fn to_decimal<F: PastaField>(value: &F) -> String {
    to_biguint(value).to_str_radix(10)
}

pub fn from_decimal<F: PastaField>(s: &str) -> Result<F> {
    let value = BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| CoreError::Decode(format!("{s:?} is not a decimal integer")))?;
    from_biguint(&value)
}

pub fn of_int<F: PastaField>(value: i64) -> F {
    let magnitude = F::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Orders elements by their canonical integer representative.
pub fn compare<F: PastaField>(a: &F, b: &F) -> Ordering {
    to_biguint(a).cmp(&to_biguint(b))
}

pub fn inverse<F: PastaField>(value: &F) -> Option<F> {
    Option::from(value.invert())
}

pub fn sqrt<F: PastaField>(value: &F) -> Option<F> {
    Option::from(value.sqrt())
}

pub fn is_square<F: PastaField>(value: &F) -> bool {
    value.sqrt().is_some().into()
}

pub fn pow_big<F: PastaField>(base: &F, exp: &BigUint) -> F {
    base.pow_vartime(exp.to_u64_digits())
}

/// Generator of the multiplicative subgroup of order `2^log2`.
pub fn domain_generator<F: PastaField>(log2: u32) -> Result<F> {
    if log2 > F::S {
        return Err(CoreError::InvalidArgument(format!(
            "{} has no subgroup of order 2^{log2}",
            F::NAME
        )));
    }
    Ok(F::ROOT_OF_UNITY.pow_vartime([1u64 << (F::S - log2)]))
}

/// A primitive cube root of unity.
pub fn cube_root_of_unity<F: PastaField>() -> F {
    let exp = (modulus::<F>() - 1u32) / 3u32;
    pow_big(&F::MULTIPLICATIVE_GENERATOR, &exp)
}

/// Maps 32 hash bytes to an element. Clearing the top two bits keeps the value below both moduli.
pub fn from_hash<F: PastaField>(mut bytes: [u8; FIELD_BYTES]) -> F {
    bytes[FIELD_BYTES - 1] &= 0x3f;
    Option::from(F::from_repr(bytes)).unwrap_or(F::ZERO)
}

/// Deterministic generator used by the `rng(seed)` entry points.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

pub fn random_from_seed<F: PastaField>(seed: [u8; 32]) -> F {
    F::random(ChaCha20Rng::from_seed(seed))
}

/// `#[serde(with = ...)]` adaptors storing elements as canonical bytes.
pub mod serde_field {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::PastaField;

    pub fn serialize<F: PastaField, S: Serializer>(value: &F, s: S) -> Result<S::Ok, S::Error> {
        value.to_repr().serialize(s)
    }

    pub fn deserialize<'de, F: PastaField, D: Deserializer<'de>>(d: D) -> Result<F, D::Error> {
        let repr = <[u8; 32]>::deserialize(d)?;
        Option::from(F::from_repr(repr)).ok_or_else(|| D::Error::custom("non-canonical field element"))
    }
}

pub mod serde_field_vec {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PastaField;

    pub fn serialize<F: PastaField, S: Serializer>(values: &[F], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.to_repr()))
    }

    pub fn deserialize<'de, F: PastaField, D: Deserializer<'de>>(d: D) -> Result<Vec<F>, D::Error> {
        Vec::<[u8; 32]>::deserialize(d)?
            .into_iter()
            .map(|repr| {
                Option::from(F::from_repr(repr))
                    .ok_or_else(|| D::Error::custom("non-canonical field element"))
            })
            .collect()
    }
}

pub mod serde_field_vec_vec {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PastaField;

    pub fn serialize<F: PastaField, S: Serializer>(
        values: &[Vec<F>],
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_seq(
            values
                .iter()
                .map(|row| row.iter().map(|v| v.to_repr()).collect::<Vec<_>>()),
        )
    }

    pub fn deserialize<'de, F: PastaField, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<Vec<F>>, D::Error> {
        Vec::<Vec<[u8; 32]>>::deserialize(d)?
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|repr| {
                        Option::from(F::from_repr(repr))
                            .ok_or_else(|| D::Error::custom("non-canonical field element"))
                    })
                    .collect()
            })
            .collect()
    }
}
