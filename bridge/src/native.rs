//! Typed host wrappers around core object handles.

use std::marker::PhantomData;

use plonk_core::arena::short_name;
use plonk_core::{NativeObject, RawHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::context::Bridge;
use crate::error::{BridgeError, Result};

fn use_after_transfer<T: NativeObject>() -> BridgeError {
    BridgeError::UseAfterTransfer {
        kind: short_name(T::kind()),
    }
}

/// Owns one object in the core's arena.
///
/// Passing the wrapper by value into a consuming operation moves the object
/// into the core; passing it by reference leaves it owned here.
pub struct Native<T: NativeObject> {
    handle: Option<RawHandle>,
    bridge: Bridge,
    _kind: PhantomData<fn() -> T>,
}

impl<T: NativeObject> std::fmt::Debug for Native<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Native")
            .field("kind", &short_name(T::kind()))
            .field("handle", &self.handle)
            .finish()
    }
}

impl<T: NativeObject> Native<T> {
    /// Takes ownership of `raw`, which must name a `T`.
    pub fn wrap(bridge: &Bridge, raw: RawHandle) -> Self {
        Self {
            handle: Some(raw),
            bridge: bridge.clone(),
            _kind: PhantomData,
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub const fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// The handle for a borrowing call.
    pub fn raw(&self) -> Result<RawHandle> {
        self.handle.ok_or_else(use_after_transfer::<T>)
    }

    /// Empties the wrapper and returns the handle for a consuming call.
    pub fn into_raw(mut self) -> Result<RawHandle> {
        self.handle.take().ok_or_else(use_after_transfer::<T>)
    }

    /// Releases the object. Later calls do nothing.
    pub fn free(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.bridge.call(|core| core.object_free(handle)),
            None => Ok(()),
        }
    }

    pub fn deep_copy(&self) -> Result<Self> {
        let handle = self.raw()?;
        let copy = self.bridge.call(|core| core.object_deep_copy::<T>(handle))?;
        Ok(Self::wrap(&self.bridge, copy))
    }

    pub fn erase(self) -> Result<AnyNative> {
        let bridge = self.bridge.clone();
        Ok(AnyNative {
            handle: Some(self.into_raw()?),
            bridge,
        })
    }
}

impl<T: NativeObject + Serialize + DeserializeOwned> Native<T> {
    /// Stores a record in the core.
    pub fn new(bridge: &Bridge, value: &T) -> Result<Self> {
        let bytes = bridge.pass_record(value)?;
        let handle = bridge.call(|core| core.record_new::<T>(bytes))?;
        Ok(Self::wrap(bridge, handle))
    }

    /// Copy of the record's current value.
    pub fn get(&self) -> Result<T> {
        let handle = self.raw()?;
        let ret = self.bridge.return_area()?;
        self.bridge.call(|core| core.record_get::<T>(handle, ret.ptr()))?;
        ret.take_record()
    }

    /// Replaces the record in place.
    pub fn set(&self, value: &T) -> Result<()> {
        let handle = self.raw()?;
        let bytes = self.bridge.pass_record(value)?;
        self.bridge.call(|core| core.record_set::<T>(handle, bytes))
    }
}

impl<T: NativeObject> Drop for Native<T> {
    fn drop(&mut self) {
        if let Err(err) = self.free() {
            warn!(kind = %short_name(T::kind()), %err, "failed to free native object");
        }
    }
}

/// A handle whose kind is only known to the core.
#[derive(Debug)]
pub struct AnyNative {
    handle: Option<RawHandle>,
    bridge: Bridge,
}

impl AnyNative {
    pub fn wrap(bridge: &Bridge, raw: RawHandle) -> Self {
        Self {
            handle: Some(raw),
            bridge: bridge.clone(),
        }
    }

    /// Short type name of the object, as the core reports it.
    pub fn kind(&self) -> Result<String> {
        let handle = self.handle.ok_or_else(|| BridgeError::UseAfterTransfer {
            kind: "object".into(),
        })?;
        let ret = self.bridge.return_area()?;
        self.bridge.call(|core| core.object_kind(handle, ret.ptr()))?;
        ret.take_string()
    }

    /// Recovers the typed wrapper. A kind mismatch releases the object.
    pub fn downcast<T: NativeObject>(mut self) -> Result<Native<T>> {
        let expected = short_name(T::kind());
        if self.kind()? != expected {
            return Err(BridgeError::TypeMismatch { expected });
        }
        let handle = self.handle.take().ok_or_else(use_after_transfer::<T>)?;
        Ok(Native::wrap(&self.bridge, handle))
    }

    pub fn free(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.bridge.call(|core| core.object_free(handle)),
            None => Ok(()),
        }
    }
}

impl Drop for AnyNative {
    fn drop(&mut self) {
        if let Err(err) = self.free() {
            warn!(%err, "failed to free native object");
        }
    }
}

/// Moves every wrapper into a handle array for a consuming call. Nothing is
/// moved unless every wrapper is live.
pub fn into_raw_all<T: NativeObject>(items: Vec<Native<T>>) -> Result<Vec<RawHandle>> {
    if items.iter().any(|item| !item.is_live()) {
        return Err(use_after_transfer::<T>());
    }
    items.into_iter().map(Native::into_raw).collect()
}

/// Borrows every wrapper as a handle array.
pub fn raw_all<T: NativeObject>(items: &[Native<T>]) -> Result<Vec<RawHandle>> {
    items.iter().map(Native::raw).collect()
}

/// Declares `Fp`/`Fq` aliases for one family of wrappers, e.g.
/// `field_aliases!(GateVector)` gives `FpGateVector` and `FqGateVector`.
macro_rules! field_aliases {
    ($($ty:ident),* $(,)?) => {
        paste::paste! {
            $(
                pub type [<Fp $ty>] = $crate::native::Native<plonk_core::[<$ty:snake>]::$ty<plonk_core::Fp>>;
                pub type [<Fq $ty>] = $crate::native::Native<plonk_core::[<$ty:snake>]::$ty<plonk_core::Fq>>;
            )*
        }
    };
}

/// Declares `Vesta`/`Pallas` aliases for one family of wrappers.
macro_rules! curve_aliases {
    ($($module:ident :: $ty:ident),* $(,)?) => {
        paste::paste! {
            $(
                pub type [<Vesta $ty>] = $crate::native::Native<plonk_core::$module::$ty<plonk_core::Vesta>>;
                pub type [<Pallas $ty>] = $crate::native::Native<plonk_core::$module::$ty<plonk_core::Pallas>>;
            )*
        }
    };
}

pub mod aliases {
    //! Concrete wrapper names for each field and curve.

    pub type Wire = super::Native<plonk_core::circuit::Wire>;
    pub type Wires = super::Native<plonk_core::circuit::Wires>;
    pub type PoolBuilder = super::Native<plonk_core::pool::PoolBuilder>;
    pub type SignalCell = super::Native<plonk_core::pool::SignalCell>;
    pub type WorkerReceiver = super::Native<plonk_core::pool::WorkerReceiver>;

    field_aliases!(Domain, Oracles);

    pub type FpGate = super::Native<plonk_core::circuit::Gate<plonk_core::Fp>>;
    pub type FqGate = super::Native<plonk_core::circuit::Gate<plonk_core::Fq>>;
    pub type FpGateVector = super::Native<plonk_core::circuit::GateVector<plonk_core::Fp>>;
    pub type FqGateVector = super::Native<plonk_core::circuit::GateVector<plonk_core::Fq>>;
    pub type FpVecVec = super::Native<plonk_core::vec_vec::VecVecField<plonk_core::Fp>>;
    pub type FqVecVec = super::Native<plonk_core::vec_vec::VecVecField<plonk_core::Fq>>;
    pub type FpRandomOracles = super::Native<plonk_core::oracles::RandomOracles<plonk_core::Fp>>;
    pub type FqRandomOracles = super::Native<plonk_core::oracles::RandomOracles<plonk_core::Fq>>;
    pub type FpProofEvaluations = super::Native<plonk_core::proof::ProofEvaluations<plonk_core::Fp>>;
    pub type FqProofEvaluations = super::Native<plonk_core::proof::ProofEvaluations<plonk_core::Fq>>;
    pub type FpVerificationShifts =
        super::Native<plonk_core::verifier_index::VerificationShifts<plonk_core::Fp>>;
    pub type FqVerificationShifts =
        super::Native<plonk_core::verifier_index::VerificationShifts<plonk_core::Fq>>;

    curve_aliases!(
        curve::Projective,
        curve::Affine,
        poly_comm::PolyComm,
        urs::Urs,
        index::ProverIndex,
        verifier_index::VerifierIndex,
        verifier_index::VerificationEvals,
        proof::ProverProof,
        proof::ProverCommitments,
        proof::OpeningProof,
        vec_vec::VecVecPolyComm,
    );
}
