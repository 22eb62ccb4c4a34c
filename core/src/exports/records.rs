//! Kind-agnostic object operations and bincode-encoded records.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::arena::{short_name, NativeObject, RawHandle};
use crate::imports::{Export, Slice};
use crate::module::Instance;

impl Instance {
    /// Decodes a record and stores it in the arena.
    pub fn record_new<T: NativeObject + DeserializeOwned>(&self, bytes: Slice) -> Export<RawHandle> {
        self.guard("record_new", || {
            let value: T = bincode::deserialize(&self.read_bytes(bytes)?)?;
            Ok(self.insert(value))
        })
    }

    /// Encodes the record behind `handle` at `retptr`.
    pub fn record_get<T: NativeObject + Serialize>(&self, handle: RawHandle, retptr: u32) -> Export<()> {
        self.guard("record_get", || {
            let value = self.get::<T>(handle)?;
            self.write_bytes(retptr, &bincode::serialize(value.as_ref())?)
        })
    }

    /// Replaces the record behind `handle` in place.
    pub fn record_set<T: NativeObject + DeserializeOwned>(&self, handle: RawHandle, bytes: Slice) -> Export<()> {
        self.guard("record_set", || {
            let value: T = bincode::deserialize(&self.read_bytes(bytes)?)?;
            self.arena().with_mut::<T, _>(handle, |slot| *slot = value)
        })
    }

    /// Releases an object of any kind.
    pub fn object_free(&self, handle: RawHandle) -> Export<()> {
        self.guard("object_free", || {
            self.arena().remove(handle)?;
            Ok(())
        })
    }

    pub fn object_deep_copy<T: NativeObject>(&self, handle: RawHandle) -> Export<RawHandle> {
        self.guard("object_deep_copy", || {
            let value = self.get::<T>(handle)?;
            Ok(self.insert(T::clone(&value)))
        })
    }

    /// Short type name of the object behind `handle`.
    pub fn object_kind(&self, handle: RawHandle, retptr: u32) -> Export<()> {
        self.guard("object_kind", || {
            let kind = self.arena().kind_of(handle)?;
            self.write_bytes(retptr, short_name(kind).as_bytes())
        })
    }
}
