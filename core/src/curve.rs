//! Pallas and Vesta behind one trait.
//!
//! Points cross the boundary either as projective objects or as affine
//! records `{ x, y, infinity }`. Conversions go through the compressed
//! encoding: `x` little-endian with the parity of `y` in bit 255.

use std::fmt::Debug;

use blake2b_simd::Params as Blake2bParams;
use ff::{Field, PrimeField};
use group::{Group, GroupEncoding};
use pasta_curves::{pallas, vesta, Fp, Fq};
use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::error::{CoreError, Result};
use crate::field::{self, serde_field, PastaField};

/// One of the two Pasta curves.
pub trait PastaCurve: Copy + Debug + PartialEq + Eq + Send + Sync + 'static {
    type Scalar: PastaField;
    type Base: PastaField;
    type Point: Group<Scalar = Self::Scalar> + GroupEncoding<Repr = [u8; 32]>;
    const NAME: &'static str;
}

/// y² = x³ + 5 over Fp, scalars in Fq.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pallas;

/// y² = x³ + 5 over Fq, scalars in Fp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vesta;

impl PastaCurve for Pallas {
    type Scalar = Fq;
    type Base = Fp;
    type Point = pallas::Point;
    const NAME: &'static str = "Pallas";
}

impl PastaCurve for Vesta {
    type Scalar = Fp;
    type Base = Fq;
    type Point = vesta::Point;
    const NAME: &'static str = "Vesta";
}

const CURVE_B: u64 = 5;

/// Projective point owned by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Projective<C: PastaCurve>(#[serde(with = "serde_point")] pub C::Point);

/// Affine point record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Affine<C: PastaCurve> {
    #[serde(with = "serde_field")]
    pub x: C::Base,
    #[serde(with = "serde_field")]
    pub y: C::Base,
    pub infinity: bool,
}

impl<C: PastaCurve> Affine<C> {
    pub fn identity() -> Self {
        Self {
            x: C::Base::ZERO,
            y: C::Base::ZERO,
            infinity: true,
        }
    }

    pub fn from_point(point: &C::Point) -> Self {
        if bool::from(point.is_identity()) {
            return Self::identity();
        }
        let mut repr = point.to_bytes();
        let odd = repr[31] >> 7 == 1;
        repr[31] &= 0x7f;
        let x = Option::from(C::Base::from_repr(repr)).unwrap_or(C::Base::ZERO);
        let y = curve_y::<C>(&x, odd).unwrap_or(C::Base::ZERO);
        Self {
            x,
            y,
            infinity: false,
        }
    }

    pub fn to_point(&self) -> Result<C::Point> {
        if self.infinity {
            return Ok(C::Point::identity());
        }
        let mut repr = self.x.to_repr();
        repr[31] |= u8::from(bool::from(self.y.is_odd())) << 7;
        let point: C::Point = Option::from(C::Point::from_bytes(&repr)).ok_or_else(not_on_curve::<C>)?;
        if Self::from_point(&point) != *self {
            return Err(not_on_curve::<C>());
        }
        Ok(point)
    }

    pub fn generator() -> Self {
        Self::from_point(&C::Point::generator())
    }
}

fn not_on_curve<C: PastaCurve>() -> CoreError {
    CoreError::InvalidArgument(format!("point is not on {}", C::NAME))
}

/// The `y` coordinate over `x` with the requested parity.
fn curve_y<C: PastaCurve>(x: &C::Base, odd: bool) -> Option<C::Base> {
    let rhs = x.square() * x + C::Base::from(CURVE_B);
    field::sqrt(&rhs).map(|y| if bool::from(y.is_odd()) == odd { y } else { -y })
}

/// Deterministically maps `(domain, index)` to a non-identity point by try-and-increment.
pub fn hash_to_point<C: PastaCurve>(domain: &[u8], index: u64) -> C::Point {
    let mut counter = 0u32;
    loop {
        let mut state = Blake2bParams::new().hash_length(32).to_state();
        state
            .update(domain)
            .update(&index.to_le_bytes())
            .update(&counter.to_le_bytes());
        let mut repr = [0u8; 32];
        repr.copy_from_slice(state.finalize().as_bytes());
        // Keep the parity bit; clear bit 254 so that x is below the modulus.
        repr[31] &= 0xbf;
        if let Some(point) = Option::<C::Point>::from(C::Point::from_bytes(&repr)) {
            if !bool::from(point.is_identity()) {
                return point;
            }
        }
        counter += 1;
    }
}

/// β in the base field such that (x, y) ↦ (βx, y) is an endomorphism.
pub fn endo_base<C: PastaCurve>() -> C::Base {
    field::cube_root_of_unity()
}

/// λ in the scalar field with λ·(x, y) = (βx, y).
pub fn endo_scalar<C: PastaCurve>() -> C::Scalar {
    let beta = endo_base::<C>();
    let g = C::Point::generator();
    let ga = Affine::<C>::from_point(&g);
    let lambda: C::Scalar = field::cube_root_of_unity();
    let image = Affine::<C>::from_point(&(g * lambda));
    if image.x == ga.x * beta && image.y == ga.y {
        lambda
    } else {
        lambda.square()
    }
}

/// Σ sᵢ·Pᵢ over the common prefix of both slices.
pub fn msm<C: PastaCurve>(bases: &[C::Point], scalars: &[C::Scalar]) -> C::Point {
    bases
        .iter()
        .zip(scalars)
        .fold(C::Point::identity(), |acc, (base, scalar)| acc + *base * *scalar)
}

impl<C: PastaCurve> NativeObject for Projective<C> {}
impl<C: PastaCurve> NativeObject for Affine<C> {}

pub mod serde_point {
    use group::GroupEncoding;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<P: GroupEncoding<Repr = [u8; 32]>, S: Serializer>(
        point: &P,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        point.to_bytes().serialize(s)
    }

    pub fn deserialize<'de, P: GroupEncoding<Repr = [u8; 32]>, D: Deserializer<'de>>(
        d: D,
    ) -> Result<P, D::Error> {
        let repr = <[u8; 32]>::deserialize(d)?;
        Option::from(P::from_bytes(&repr)).ok_or_else(|| D::Error::custom("invalid point encoding"))
    }
}

pub mod serde_point_vec {
    use group::GroupEncoding;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<P: GroupEncoding<Repr = [u8; 32]>, S: Serializer>(
        points: &[P],
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_seq(points.iter().map(|p| p.to_bytes()))
    }

    pub fn deserialize<'de, P: GroupEncoding<Repr = [u8; 32]>, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<P>, D::Error> {
        Vec::<[u8; 32]>::deserialize(d)?
            .iter()
            .map(|repr| {
                Option::from(P::from_bytes(repr))
                    .ok_or_else(|| D::Error::custom("invalid point encoding"))
            })
            .collect()
    }
}

pub mod serde_opt_point {
    use group::GroupEncoding;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<P: GroupEncoding<Repr = [u8; 32]>, S: Serializer>(
        point: &Option<P>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        point.as_ref().map(|p| p.to_bytes()).serialize(s)
    }

    pub fn deserialize<'de, P: GroupEncoding<Repr = [u8; 32]>, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<P>, D::Error> {
        Option::<[u8; 32]>::deserialize(d)?
            .map(|repr| {
                Option::from(P::from_bytes(&repr))
                    .ok_or_else(|| D::Error::custom("invalid point encoding"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affine_round_trip<C: PastaCurve>() {
        let p = C::Point::generator() * C::Scalar::from(12345);
        let a = Affine::<C>::from_point(&p);
        assert!(!a.infinity);
        assert_eq!(a.to_point().unwrap(), p);
        let rhs = a.x.square() * a.x + C::Base::from(CURVE_B);
        assert_eq!(a.y.square(), rhs);
    }

    #[test]
    fn test_affine_round_trip() {
        affine_round_trip::<Pallas>();
        affine_round_trip::<Vesta>();
    }

    #[test]
    fn test_identity_affine() {
        let a = Affine::<Vesta>::from_point(&vesta::Point::identity());
        assert!(a.infinity);
        assert!(bool::from(a.to_point().unwrap().is_identity()));
    }

    #[test]
    fn test_off_curve_rejected() {
        let mut a = Affine::<Pallas>::generator();
        a.y += Fp::ONE;
        assert!(a.to_point().is_err());
    }

    fn endo_relation<C: PastaCurve>() {
        let p = C::Point::generator() * C::Scalar::from(77);
        let a = Affine::<C>::from_point(&p);
        let image = Affine::<C>::from_point(&(p * endo_scalar::<C>()));
        assert_eq!(image.x, a.x * endo_base::<C>());
        assert_eq!(image.y, a.y);
    }

    #[test]
    fn test_endomorphism() {
        endo_relation::<Pallas>();
        endo_relation::<Vesta>();
    }

    #[test]
    fn test_hash_to_point_is_deterministic() {
        let a = hash_to_point::<Vesta>(b"test", 3);
        assert_eq!(a, hash_to_point::<Vesta>(b"test", 3));
        assert_ne!(a, hash_to_point::<Vesta>(b"test", 4));
    }

    #[test]
    fn test_msm() {
        let g = pallas::Point::generator();
        let bases = [g, g.double()];
        let scalars = [Fq::from(3), Fq::from(4)];
        assert_eq!(msm::<Pallas>(&bases, &scalars), g * Fq::from(11));
    }
}
