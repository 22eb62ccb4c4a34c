//! URS creation, persistence and commitment utilities.

use std::path::Path;

use plonk_core::curve::{Affine, PastaCurve};
use plonk_core::persist::encode_append;
use plonk_core::poly_comm::PolyComm;
use plonk_core::urs::Urs;
use plonk_core::RawHandle;
use tracing::instrument;

use super::plonk::{encode_offset, PlonkOps};
use crate::error::Result;
use crate::native::{into_raw_all, Native};

impl<C: PastaCurve> PlonkOps<'_, C> {
    #[instrument(level = "debug", skip(self), fields(curve = C::NAME))]
    pub fn urs_create(&self, depth: u32) -> Result<Native<Urs<C>>> {
        self.wrap(|core| core.urs_create::<C>(depth))
    }

    /// Writes `urs` to `path`, appending unless `append` is `Some(false)`.
    pub fn urs_write(&self, append: Option<bool>, urs: &Native<Urs<C>>, path: &Path) -> Result<()> {
        let urs = urs.raw()?;
        let path = self.bridge.pass_path(path)?;
        self.bridge
            .call(|core| core.urs_write::<C>(encode_append(append), urs, path))
    }

    /// `None` when nothing is stored at the location.
    pub fn urs_read(&self, offset: Option<u32>, path: &Path) -> Result<Option<Native<Urs<C>>>> {
        let (is_some, offset) = encode_offset(offset);
        let path = self.bridge.pass_path(path)?;
        let handle = self
            .bridge
            .call(|core| core.urs_read::<C>(is_some, offset, path))?;
        Ok(handle.map(|h| Native::wrap(self.bridge, h)))
    }

    /// Commitment to the `i`-th Lagrange polynomial of the domain of `domain_size`.
    pub fn urs_lagrange_commitment(
        &self,
        urs: &Native<Urs<C>>,
        domain_size: u32,
        i: u32,
    ) -> Result<Native<PolyComm<C>>> {
        let urs = urs.raw()?;
        self.wrap(|core| core.urs_lagrange_commitment::<C>(urs, domain_size, i))
    }

    /// The first `count` Lagrange commitments, as verification expects them.
    pub fn urs_lagrange_commitments(
        &self,
        urs: &Native<Urs<C>>,
        domain_size: u32,
        count: u32,
    ) -> Result<Vec<Native<PolyComm<C>>>> {
        (0..count)
            .map(|i| self.urs_lagrange_commitment(urs, domain_size, i))
            .collect()
    }

    pub fn urs_commit_evaluations(
        &self,
        urs: &Native<Urs<C>>,
        domain_size: u32,
        evals: &[C::Scalar],
    ) -> Result<Native<PolyComm<C>>> {
        let urs = urs.raw()?;
        let evals = self.pass_fields(evals)?;
        self.wrap(|core| core.urs_commit_evaluations::<C>(urs, domain_size, evals))
    }

    pub fn urs_b_poly_commitment(&self, urs: &Native<Urs<C>>, chals: &[C::Scalar]) -> Result<Native<PolyComm<C>>> {
        let urs = urs.raw()?;
        let chals = self.pass_fields(chals)?;
        self.wrap(|core| core.urs_b_poly_commitment::<C>(urs, chals))
    }

    /// Checks every accumulator in `comms` against its slice of `chals` at
    /// once. The points move into the call.
    pub fn urs_batch_accumulator_check(
        &self,
        urs: &Native<Urs<C>>,
        comms: Vec<Native<Affine<C>>>,
        chals: &[C::Scalar],
    ) -> Result<bool> {
        let urs = urs.raw()?;
        let comms: Vec<RawHandle> = into_raw_all(comms)?;
        let comms = self.bridge.pass_handles(&comms)?;
        let chals = self.pass_fields(chals)?;
        self.bridge
            .call(|core| core.urs_batch_accumulator_check::<C>(urs, comms, chals))
    }

    /// The blinding base.
    pub fn urs_h(&self, urs: &Native<Urs<C>>) -> Result<Native<Affine<C>>> {
        let urs = urs.raw()?;
        self.wrap(|core| core.urs_h::<C>(urs))
    }
}
