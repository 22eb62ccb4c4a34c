//! Generation-stamped object arena.
//!
//! Every native object the host can name lives in a slot of an [`ObjectArena`].
//! A [`RawHandle`] names a slot together with the generation it was issued for,
//! so a handle to a freed or moved object is rejected instead of reaching
//! whatever occupies the slot later.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque reference to an object in a core's arena. Crosses the boundary as three words.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct RawHandle {
    pub arena: u32,
    pub index: u32,
    pub generation: u32,
}

impl RawHandle {
    /// Words occupied by one handle in a marshalled word array.
    pub const WORDS: usize = 3;

    pub fn to_words(self) -> [u32; 3] {
        bytemuck::cast(self)
    }

    pub fn from_words(words: [u32; 3]) -> Self {
        bytemuck::cast(words)
    }

    /// Decodes a flat word array into handles.
    pub fn decode_all(words: &[u32]) -> Result<Vec<Self>> {
        if words.len() % Self::WORDS != 0 {
            return Err(CoreError::Decode(format!(
                "handle array of {} words is not a multiple of {}",
                words.len(),
                Self::WORDS
            )));
        }
        Ok(words
            .chunks_exact(Self::WORDS)
            .map(|w| Self::from_words([w[0], w[1], w[2]]))
            .collect())
    }

    pub fn encode_all(handles: &[Self]) -> Vec<u32> {
        bytemuck::cast_slice::<Self, u32>(handles).to_vec()
    }
}

/// An object that can live in the arena.
pub trait NativeObject: Any + Send + Sync + Clone {
    /// Name used in type errors.
    fn kind() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Strips module paths from a type name, e.g. `a::Gate<b::Fp>` becomes `Gate<Fp>`.
pub fn short_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());
    out
}

struct Entry {
    kind: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

pub struct ObjectArena {
    id: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Default for ObjectArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectArena")
            .field("id", &self.id)
            .field("live", &self.live())
            .finish()
    }
}

impl ObjectArena {
    pub fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Number of live objects.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn insert<T: NativeObject>(&mut self, value: T) -> RawHandle {
        let entry = Entry {
            kind: T::kind(),
            type_id: TypeId::of::<T>(),
            value: Arc::new(value),
        };
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entry = Some(entry);
        RawHandle {
            arena: self.id,
            index,
            generation: slot.generation,
        }
    }

    fn slot_index(&self, handle: RawHandle, kind: &'static str) -> Result<usize> {
        if handle.arena != self.id || handle.index as usize >= self.slots.len() {
            return Err(CoreError::InvalidHandle(handle));
        }
        let slot = &self.slots[handle.index as usize];
        if slot.generation != handle.generation || slot.entry.is_none() {
            return Err(CoreError::UseAfterTransfer { kind });
        }
        Ok(handle.index as usize)
    }

    fn entry<T: NativeObject>(&self, handle: RawHandle) -> Result<&Entry> {
        let index = self.slot_index(handle, T::kind())?;
        let entry = self.slots[index]
            .entry
            .as_ref()
            .ok_or(CoreError::UseAfterTransfer { kind: T::kind() })?;
        if entry.type_id != TypeId::of::<T>() {
            return Err(CoreError::TypeMismatch {
                expected: T::kind(),
                found: entry.kind,
            });
        }
        Ok(entry)
    }

    /// Kind of the object behind `handle`.
    pub fn kind_of(&self, handle: RawHandle) -> Result<&'static str> {
        let index = self.slot_index(handle, "object")?;
        Ok(self.slots[index].entry.as_ref().map_or("object", |e| e.kind))
    }

    /// Shares the object without removing it.
    pub fn get<T: NativeObject>(&self, handle: RawHandle) -> Result<Arc<T>> {
        let entry = self.entry::<T>(handle)?;
        entry
            .value
            .clone()
            .downcast::<T>()
            .map_err(|_| CoreError::TypeMismatch {
                expected: T::kind(),
                found: entry.kind,
            })
    }

    /// Runs `f` on the object in place. Fails while another call still shares it.
    pub fn with_mut<T: NativeObject, R>(
        &mut self,
        handle: RawHandle,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        self.entry::<T>(handle)?;
        let entry = self.slots[handle.index as usize]
            .entry
            .as_mut()
            .ok_or(CoreError::UseAfterTransfer { kind: T::kind() })?;
        let found = entry.kind;
        let value = Arc::get_mut(&mut entry.value)
            .ok_or(CoreError::Busy { kind: T::kind() })?
            .downcast_mut::<T>()
            .ok_or(CoreError::TypeMismatch {
                expected: T::kind(),
                found,
            })?;
        Ok(f(value))
    }

    /// Moves the object out of the arena. The handle is dead afterwards.
    pub fn take<T: NativeObject>(&mut self, handle: RawHandle) -> Result<T> {
        self.entry::<T>(handle)?;
        let entry = self.vacate(handle.index as usize)?;
        let value = entry
            .value
            .downcast::<T>()
            .map_err(|_| CoreError::TypeMismatch {
                expected: T::kind(),
                found: entry.kind,
            })?;
        Ok(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Fails unless `handle` names a live object of kind `T`.
    pub fn check<T: NativeObject>(&self, handle: RawHandle) -> Result<()> {
        self.entry::<T>(handle).map(|_| ())
    }

    /// Fails unless every handle names a distinct live object of kind `T`.
    pub fn check_all<T: NativeObject>(&self, handles: &[RawHandle]) -> Result<()> {
        let mut seen = HashSet::with_capacity(handles.len());
        for handle in handles {
            self.check::<T>(*handle)?;
            if !seen.insert(*handle) {
                return Err(CoreError::InvalidArgument(format!(
                    "{} handle {} passed twice",
                    T::kind(),
                    handle.index
                )));
            }
        }
        Ok(())
    }

    /// Moves every object out, or none of them if any handle is bad.
    pub fn take_all<T: NativeObject>(&mut self, handles: &[RawHandle]) -> Result<Vec<T>> {
        self.check_all::<T>(handles)?;
        handles.iter().map(|h| self.take(*h)).collect()
    }

    /// Drops the object regardless of its kind and returns that kind.
    pub fn remove(&mut self, handle: RawHandle) -> Result<&'static str> {
        let index = self.slot_index(handle, "object")?;
        Ok(self.vacate(index)?.kind)
    }

    fn vacate(&mut self, index: usize) -> Result<Entry> {
        let slot = &mut self.slots[index];
        let entry = slot
            .entry
            .take()
            .ok_or(CoreError::UseAfterTransfer { kind: "object" })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Apple(u32);
    impl NativeObject for Apple {}

    #[derive(Clone, Debug)]
    struct Pear;
    impl NativeObject for Pear {}

    #[test]
    fn test_insert_get_take() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(Apple(7));
        assert_eq!(*arena.get::<Apple>(h).unwrap(), Apple(7));
        assert_eq!(arena.take::<Apple>(h).unwrap(), Apple(7));
        assert_eq!(
            arena.get::<Apple>(h).unwrap_err(),
            CoreError::UseAfterTransfer {
                kind: Apple::kind()
            }
        );
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_stale_generation_after_reuse() {
        let mut arena = ObjectArena::new();
        let old = arena.insert(Apple(1));
        arena.remove(old).unwrap();
        let new = arena.insert(Apple(2));
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(matches!(
            arena.get::<Apple>(old),
            Err(CoreError::UseAfterTransfer { .. })
        ));
        assert_eq!(*arena.get::<Apple>(new).unwrap(), Apple(2));
    }

    #[test]
    fn test_type_mismatch() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(Pear);
        assert_eq!(
            arena.get::<Apple>(h).unwrap_err(),
            CoreError::TypeMismatch {
                expected: Apple::kind(),
                found: Pear::kind()
            }
        );
        assert_eq!(short_name(arena.kind_of(h).unwrap()), "Pear");
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a = ObjectArena::new();
        let b = ObjectArena::new();
        let h = a.insert(Apple(3));
        assert_eq!(b.get::<Apple>(h).unwrap_err(), CoreError::InvalidHandle(h));
    }

    #[test]
    fn test_with_mut_busy_while_shared() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(Apple(1));
        let shared = arena.get::<Apple>(h).unwrap();
        assert_eq!(
            arena.with_mut::<Apple, _>(h, |a| a.0 += 1).unwrap_err(),
            CoreError::Busy {
                kind: Apple::kind()
            }
        );
        drop(shared);
        arena.with_mut::<Apple, _>(h, |a| a.0 += 1).unwrap();
        assert_eq!(*arena.get::<Apple>(h).unwrap(), Apple(2));
    }

    #[test]
    fn test_take_all_is_all_or_nothing() {
        let mut arena = ObjectArena::new();
        let a = arena.insert(Apple(1));
        let b = arena.insert(Apple(2));
        let pear = arena.insert(Pear);

        assert!(matches!(
            arena.take_all::<Apple>(&[a, pear]),
            Err(CoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            arena.take_all::<Apple>(&[a, b, a]),
            Err(CoreError::InvalidArgument(_))
        ));
        assert_eq!(arena.live(), 3);

        assert_eq!(arena.take_all::<Apple>(&[b, a]).unwrap(), vec![Apple(2), Apple(1)]);
        assert!(arena.check::<Apple>(a).is_err());
        arena.check::<Pear>(pear).unwrap();
        assert_eq!(arena.live(), 1);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("a::b::Gate<c::Fp>"), "Gate<Fp>");
        assert_eq!(short_name("Vec<(x::A, y::B)>"), "Vec<(A, B)>");
    }

    #[test]
    fn test_handle_words() {
        let h = RawHandle {
            arena: 1,
            index: 2,
            generation: 3,
        };
        assert_eq!(h.to_words(), [1, 2, 3]);
        let words = RawHandle::encode_all(&[h, h]);
        assert_eq!(RawHandle::decode_all(&words).unwrap(), vec![h, h]);
        assert!(RawHandle::decode_all(&words[..4]).is_err());
    }
}
