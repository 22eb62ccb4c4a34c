//! Pallas and Vesta points. Projective points and affine records both live in
//! the arena.

use group::Group;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::arena::RawHandle;
use crate::curve::{endo_base, endo_scalar, Affine, PastaCurve, Projective};
use crate::error::Result;
use crate::field::{self as fe};
use crate::imports::{Export, Slice};
use crate::module::Instance;

impl Instance {
    fn point_op<C: PastaCurve>(
        &self,
        export: &'static str,
        operands: &[RawHandle],
        op: impl FnOnce(&[C::Point]) -> C::Point,
    ) -> Export<RawHandle> {
        self.guard(export, || {
            let points = operands
                .iter()
                .map(|h| Ok(self.get::<Projective<C>>(*h)?.0))
                .collect::<Result<Vec<_>>>()?;
            Ok(self.insert(Projective::<C>(op(&points))))
        })
    }

    pub fn curve_one<C: PastaCurve>(&self) -> Export<RawHandle> {
        self.point_op::<C>("curve_one", &[], |_| C::Point::generator())
    }

    pub fn curve_add<C: PastaCurve>(&self, a: RawHandle, b: RawHandle) -> Export<RawHandle> {
        self.point_op::<C>("curve_add", &[a, b], |p| p[0] + p[1])
    }

    pub fn curve_sub<C: PastaCurve>(&self, a: RawHandle, b: RawHandle) -> Export<RawHandle> {
        self.point_op::<C>("curve_sub", &[a, b], |p| p[0] - p[1])
    }

    pub fn curve_negate<C: PastaCurve>(&self, a: RawHandle) -> Export<RawHandle> {
        self.point_op::<C>("curve_negate", &[a], |p| -p[0])
    }

    pub fn curve_double<C: PastaCurve>(&self, a: RawHandle) -> Export<RawHandle> {
        self.point_op::<C>("curve_double", &[a], |p| p[0].double())
    }

    /// `a` times the scalar encoded in `scalar`.
    pub fn curve_scale<C: PastaCurve>(&self, a: RawHandle, scalar: Slice) -> Export<RawHandle> {
        self.guard("curve_scale", || {
            let s: C::Scalar = fe::from_bytes(&self.read_bytes(scalar)?)?;
            let p = self.get::<Projective<C>>(a)?.0;
            Ok(self.insert(Projective::<C>(p * s)))
        })
    }

    pub fn curve_random<C: PastaCurve>(&self) -> Export<RawHandle> {
        self.guard("curve_random", || {
            let mut seed = [0u8; 32];
            self.imports().fill_random(&mut seed)?;
            let rng = ChaCha20Rng::from_seed(seed);
            Ok(self.insert(Projective::<C>(C::Point::random(rng))))
        })
    }

    pub fn curve_rng<C: PastaCurve>(&self, seed: i32) -> Export<RawHandle> {
        self.guard("curve_rng", || {
            let rng = fe::seeded_rng(seed as u32 as u64);
            Ok(self.insert(Projective::<C>(C::Point::random(rng))))
        })
    }

    pub fn curve_endo_base<C: PastaCurve>(&self, retptr: u32) -> Export<()> {
        self.guard("curve_endo_base", || {
            self.write_bytes(retptr, &fe::to_bytes(&endo_base::<C>()))
        })
    }

    pub fn curve_endo_scalar<C: PastaCurve>(&self, retptr: u32) -> Export<()> {
        self.guard("curve_endo_scalar", || {
            self.write_bytes(retptr, &fe::to_bytes(&endo_scalar::<C>()))
        })
    }

    pub fn curve_to_affine<C: PastaCurve>(&self, a: RawHandle) -> Export<RawHandle> {
        self.guard("curve_to_affine", || {
            let p = self.get::<Projective<C>>(a)?.0;
            Ok(self.insert(Affine::<C>::from_point(&p)))
        })
    }

    pub fn curve_of_affine<C: PastaCurve>(&self, a: RawHandle) -> Export<RawHandle> {
        self.guard("curve_of_affine", || {
            let p = self.get::<Affine<C>>(a)?.to_point()?;
            Ok(self.insert(Projective::<C>(p)))
        })
    }

    /// Projective point from base-field coordinates, rejected when off the curve.
    pub fn curve_of_affine_coordinates<C: PastaCurve>(
        &self,
        x: Slice,
        y: Slice,
    ) -> Export<RawHandle> {
        self.guard("curve_of_affine_coordinates", || {
            let (x, y) = (self.read_bytes(x)?, self.read_bytes(y)?);
            let affine = Affine::<C> {
                x: fe::from_bytes(&x)?,
                y: fe::from_bytes(&y)?,
                infinity: false,
            };
            Ok(self.insert(Projective::<C>(affine.to_point()?)))
        })
    }

    pub fn curve_affine_one<C: PastaCurve>(&self) -> Export<RawHandle> {
        self.guard("curve_affine_one", || Ok(self.insert(Affine::<C>::generator())))
    }

    pub fn curve_affine_deep_copy<C: PastaCurve>(&self, a: RawHandle) -> Export<RawHandle> {
        self.object_deep_copy::<Affine<C>>(a)
    }
}

#[cfg(test)]
mod tests {
    use pasta_curves::{vesta, Fp};

    use super::*;
    use crate::curve::Vesta;
    use crate::error::CoreError;
    use crate::testing::TestCore;

    #[test]
    fn test_point_arithmetic_through_handles() {
        let core = TestCore::new();
        let inst = &core.instance;
        let g = inst.curve_one::<Vesta>().unwrap();
        let g2 = inst.curve_double::<Vesta>(g).unwrap();
        let three = core.pass(&fe::to_bytes(&Fp::from(3)));
        let g3 = inst.curve_scale::<Vesta>(g, three).unwrap();
        let sum = inst.curve_add::<Vesta>(g2, g).unwrap();
        assert_eq!(
            inst.get::<Projective<Vesta>>(sum).unwrap().0,
            inst.get::<Projective<Vesta>>(g3).unwrap().0
        );

        let affine = inst.curve_to_affine::<Vesta>(g3).unwrap();
        let back = inst.curve_of_affine::<Vesta>(affine).unwrap();
        assert_eq!(
            inst.get::<Projective<Vesta>>(back).unwrap().0,
            vesta::Point::generator() * Fp::from(3)
        );

        // An affine handle is not a projective one.
        let thrown = inst.curve_double::<Vesta>(affine).unwrap_err();
        assert!(matches!(
            core.env.exception(thrown),
            Some(CoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_of_affine_coordinates_rejects_off_curve() {
        let core = TestCore::new();
        let inst = &core.instance;
        let one = Affine::<Vesta>::generator();
        let x = core.pass(&fe::to_bytes(&one.x));
        let y = core.pass(&fe::to_bytes(&one.y));
        assert!(inst.curve_of_affine_coordinates::<Vesta>(x, y).is_ok());
        let x = core.pass(&fe::to_bytes(&one.x));
        let y = core.pass(&fe::to_bytes(&(one.y + one.y)));
        assert!(inst.curve_of_affine_coordinates::<Vesta>(x, y).is_err());
    }
}
