//! URS creation, persistence and commitment utilities.

use crate::arena::RawHandle;
use crate::curve::{Affine, PastaCurve};
use crate::error::{CoreError, Result};
use crate::exports::decode_offset;
use crate::field as fe;
use crate::imports::{Export, Slice};
use crate::module::Instance;
use crate::persist;
use crate::poly_comm::PolyComm;
use crate::urs::Urs;

impl Instance {
    pub fn urs_create<C: PastaCurve>(&self, depth: u32) -> Export<RawHandle> {
        self.guard("urs_create", || Ok(self.insert(Urs::<C>::create(depth as usize))))
    }

    /// `append` is 0, 1 or [`APPEND_NONE`](crate::persist::APPEND_NONE).
    pub fn urs_write<C: PastaCurve>(&self, append: u32, urs: RawHandle, path: Slice) -> Export<()> {
        self.guard("urs_write", || {
            let path = self.read_path(path)?;
            let append = persist::decode_append(append)?;
            self.get::<Urs<C>>(urs)?.write(&path, append)
        })
    }

    /// `None` when the location holds no URS.
    pub fn urs_read<C: PastaCurve>(
        &self,
        offset_is_some: u32,
        offset: u32,
        path: Slice,
    ) -> Export<Option<RawHandle>> {
        self.guard("urs_read", || {
            let path = self.read_path(path)?;
            let offset = decode_offset(offset_is_some, offset)?;
            Ok(Urs::<C>::read(&path, offset)?.map(|urs| self.insert(urs)))
        })
    }

    pub fn urs_lagrange_commitment<C: PastaCurve>(
        &self,
        urs: RawHandle,
        domain_size: u32,
        i: u32,
    ) -> Export<RawHandle> {
        self.guard("urs_lagrange_commitment", || {
            let urs = self.get::<Urs<C>>(urs)?;
            let comm = urs.lagrange_commitment(domain_size as usize, i as usize, self.runtime())?;
            Ok(self.insert(comm))
        })
    }

    pub fn urs_commit_evaluations<C: PastaCurve>(
        &self,
        urs: RawHandle,
        domain_size: u32,
        evals: Slice,
    ) -> Export<RawHandle> {
        self.guard("urs_commit_evaluations", || {
            let evals = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(evals)?)?;
            let urs = self.get::<Urs<C>>(urs)?;
            let comm = urs.commit_evaluations(domain_size as usize, &evals, self.runtime())?;
            Ok(self.insert(comm))
        })
    }

    pub fn urs_b_poly_commitment<C: PastaCurve>(&self, urs: RawHandle, chals: Slice) -> Export<RawHandle> {
        self.guard("urs_b_poly_commitment", || {
            let chals = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(chals)?)?;
            let urs = self.get::<Urs<C>>(urs)?;
            Ok(self.insert(urs.b_poly_commitment(&chals)))
        })
    }

    /// `comms` holds affine handles, consumed by the call.
    pub fn urs_batch_accumulator_check<C: PastaCurve>(
        &self,
        urs: RawHandle,
        comms: Slice,
        chals: Slice,
    ) -> Export<bool> {
        self.guard("urs_batch_accumulator_check", || {
            let handles = self.read_handles(comms)?;
            let chals = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(chals)?)?;
            let points = self
                .take_all::<Affine<C>>(&handles)?
                .iter()
                .map(Affine::to_point)
                .collect::<Result<Vec<_>>>()?;
            self.get::<Urs<C>>(urs)?.batch_accumulator_check(&points, &chals)
        })
    }

    pub fn urs_h<C: PastaCurve>(&self, urs: RawHandle) -> Export<RawHandle> {
        self.guard("urs_h", || {
            let h = self.get::<Urs<C>>(urs)?.h;
            Ok(self.insert(Affine::<C>::from_point(&h)))
        })
    }
}

impl Instance {
    /// A single-chunk commitment from an affine point.
    pub(crate) fn single_chunk<C: PastaCurve>(affine: &Affine<C>) -> Result<PolyComm<C>> {
        Ok(PolyComm::new(vec![affine.to_point()?]))
    }

    pub(crate) fn missing(what: &str) -> CoreError {
        CoreError::InvalidArgument(format!("no {what} at the given location"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Vesta;
    use crate::testing::TestCore;

    #[test]
    fn test_urs_persistence() {
        let core = TestCore::new();
        let inst = &core.instance;
        let path = std::env::temp_dir().join(format!("plonk-urs-export-{}.bin", std::process::id()));
        let path_str = path.to_str().unwrap();
        let urs = inst.urs_create::<Vesta>(4).unwrap();
        inst.urs_write::<Vesta>(0, urs, core.pass_str(path_str)).unwrap();
        let first_len = std::fs::metadata(&path).unwrap().len() as u32;
        inst.urs_write::<Vesta>(persist::APPEND_NONE, urs, core.pass_str(path_str))
            .unwrap();

        let read = inst.urs_read::<Vesta>(1, first_len, core.pass_str(path_str)).unwrap();
        let read = read.unwrap();
        assert_eq!(*inst.get::<Urs<Vesta>>(read).unwrap(), *inst.get::<Urs<Vesta>>(urs).unwrap());
        let past_end = inst.urs_read::<Vesta>(1, 2 * first_len, core.pass_str(path_str)).unwrap();
        assert!(past_end.is_none());
        assert!(inst.urs_write::<Vesta>(7, urs, core.pass_str(path_str)).is_err());
        std::fs::remove_file(&path).unwrap();
        assert!(inst.urs_read::<Vesta>(0, 0, core.pass_str(path_str)).unwrap().is_none());
    }
}
