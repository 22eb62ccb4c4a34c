//! Pallas and Vesta points.

use std::marker::PhantomData;

use plonk_core::curve::{Affine, PastaCurve, Projective};
use plonk_core::field::{self as fe, PastaField};
use plonk_core::{Export, Instance, RawHandle};

use crate::context::Bridge;
use crate::error::Result;
use crate::native::Native;

#[derive(Clone, Copy, Debug)]
pub struct CurveOps<'a, C> {
    bridge: &'a Bridge,
    _curve: PhantomData<C>,
}

pub type ProjectivePoint<C> = Native<Projective<C>>;
pub type AffinePoint<C> = Native<Affine<C>>;

impl<'a, C: PastaCurve> CurveOps<'a, C> {
    pub(crate) fn new(bridge: &'a Bridge) -> Self {
        Self {
            bridge,
            _curve: PhantomData,
        }
    }

    fn wrap<T: plonk_core::NativeObject>(&self, f: impl FnOnce(&Instance) -> Export<RawHandle>) -> Result<Native<T>> {
        let handle = self.bridge.call(f)?;
        Ok(Native::wrap(self.bridge, handle))
    }

    fn field<F: PastaField>(&self, f: impl FnOnce(&Instance, u32) -> Export<()>) -> Result<F> {
        let ret = self.bridge.return_area()?;
        self.bridge.call(|core| f(core, ret.ptr()))?;
        Ok(fe::from_bytes(&ret.take_bytes()?)?)
    }

    /// The generator.
    pub fn one(&self) -> Result<ProjectivePoint<C>> {
        self.wrap(|core| core.curve_one::<C>())
    }

    pub fn add(&self, a: &ProjectivePoint<C>, b: &ProjectivePoint<C>) -> Result<ProjectivePoint<C>> {
        let (a, b) = (a.raw()?, b.raw()?);
        self.wrap(|core| core.curve_add::<C>(a, b))
    }

    pub fn sub(&self, a: &ProjectivePoint<C>, b: &ProjectivePoint<C>) -> Result<ProjectivePoint<C>> {
        let (a, b) = (a.raw()?, b.raw()?);
        self.wrap(|core| core.curve_sub::<C>(a, b))
    }

    pub fn negate(&self, a: &ProjectivePoint<C>) -> Result<ProjectivePoint<C>> {
        let a = a.raw()?;
        self.wrap(|core| core.curve_negate::<C>(a))
    }

    pub fn double(&self, a: &ProjectivePoint<C>) -> Result<ProjectivePoint<C>> {
        let a = a.raw()?;
        self.wrap(|core| core.curve_double::<C>(a))
    }

    pub fn scale(&self, a: &ProjectivePoint<C>, scalar: &C::Scalar) -> Result<ProjectivePoint<C>> {
        let a = a.raw()?;
        let scalar = self.bridge.pass_bytes(&fe::to_bytes(scalar))?;
        self.wrap(|core| core.curve_scale::<C>(a, scalar))
    }

    pub fn random(&self) -> Result<ProjectivePoint<C>> {
        self.wrap(|core| core.curve_random::<C>())
    }

    /// Deterministic point for `seed`.
    pub fn rng(&self, seed: i32) -> Result<ProjectivePoint<C>> {
        self.wrap(|core| core.curve_rng::<C>(seed))
    }

    pub fn endo_base(&self) -> Result<C::Base> {
        self.field(|core, r| core.curve_endo_base::<C>(r))
    }

    pub fn endo_scalar(&self) -> Result<C::Scalar> {
        self.field(|core, r| core.curve_endo_scalar::<C>(r))
    }

    pub fn to_affine(&self, a: &ProjectivePoint<C>) -> Result<AffinePoint<C>> {
        let a = a.raw()?;
        self.wrap(|core| core.curve_to_affine::<C>(a))
    }

    pub fn of_affine(&self, a: &AffinePoint<C>) -> Result<ProjectivePoint<C>> {
        let a = a.raw()?;
        self.wrap(|core| core.curve_of_affine::<C>(a))
    }

    /// Fails when `(x, y)` is not on the curve.
    pub fn of_affine_coordinates(&self, x: &C::Base, y: &C::Base) -> Result<ProjectivePoint<C>> {
        let x = self.bridge.pass_bytes(&fe::to_bytes(x))?;
        let y = self.bridge.pass_bytes(&fe::to_bytes(y))?;
        self.wrap(|core| core.curve_of_affine_coordinates::<C>(x, y))
    }

    pub fn affine_one(&self) -> Result<AffinePoint<C>> {
        self.wrap(|core| core.curve_affine_one::<C>())
    }

    pub fn affine_deep_copy(&self, a: &AffinePoint<C>) -> Result<AffinePoint<C>> {
        let a = a.raw()?;
        self.wrap(|core| core.curve_affine_deep_copy::<C>(a))
    }
}
