//! Host-side registry of values the core refers to by slot.
//!
//! Slots `0..4` hold the sentinels `undefined`, `null`, `true` and `false`.
//! They are never vacated or reassigned. Every other slot holds at most one
//! live value; the smallest vacated slot is reused first.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use plonk_core::{CompiledModule, CoreError, SharedImage};
use tracing::trace;

use crate::error::{BridgeError, Result};

/// Number of reserved sentinel slots.
pub const RESERVED_SLOTS: u32 = 4;

pub const UNDEFINED: u32 = 0;
pub const NULL: u32 = 1;
pub const TRUE: u32 = 2;
pub const FALSE: u32 = 3;

/// A value the host keeps on behalf of the core.
#[derive(Clone)]
pub enum HostValue {
    Undefined,
    Null,
    Bool(bool),
    String(String),
    /// An error stored by a failing export
    Exception(CoreError),
    Module(Arc<CompiledModule>),
    Memory(SharedImage),
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Exception(e) => write!(f, "Exception({e})"),
            Self::Module(m) => write!(f, "Module({} bytes)", m.len()),
            Self::Memory(_) => f.write_str("Memory"),
        }
    }
}

#[derive(Debug)]
pub struct HandleTable {
    slots: Vec<Option<HostValue>>,
    free: BTreeSet<u32>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            slots: vec![
                Some(HostValue::Undefined),
                Some(HostValue::Null),
                Some(HostValue::Bool(true)),
                Some(HostValue::Bool(false)),
            ],
            free: BTreeSet::new(),
        }
    }

    /// Stores `value` in the smallest vacant slot, growing the table if none.
    pub fn add(&mut self, value: HostValue) -> u32 {
        let slot = match self.free.pop_first() {
            Some(slot) => {
                self.slots[slot as usize] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() as u32 - 1
            }
        };
        trace!(slot, "registry add");
        slot
    }

    /// Reads the value in `slot`. The sentinel region is not addressable.
    pub fn get(&self, slot: u32) -> Result<&HostValue> {
        if slot < RESERVED_SLOTS {
            return Err(BridgeError::InvalidSlot(slot));
        }
        self.slots
            .get(slot as usize)
            .and_then(Option::as_ref)
            .ok_or(BridgeError::InvalidSlot(slot))
    }

    /// Vacates `slot`. Sentinels and vacant slots are left alone.
    pub fn remove(&mut self, slot: u32) {
        if slot < RESERVED_SLOTS {
            return;
        }
        if let Some(entry) = self.slots.get_mut(slot as usize) {
            if entry.take().is_some() {
                self.free.insert(slot);
                trace!(slot, "registry remove");
            }
        }
    }

    /// Reads and vacates `slot`, for values that cross exactly once.
    pub fn take(&mut self, slot: u32) -> Result<HostValue> {
        let value = self.get(slot)?.clone();
        self.remove(slot);
        Ok(value)
    }

    /// Duplicates the value in `slot` into a new slot. Sentinels are their
    /// own clones.
    pub fn clone_ref(&mut self, slot: u32) -> Result<u32> {
        if slot < RESERVED_SLOTS {
            return Ok(slot);
        }
        let value = self.get(slot)?.clone();
        Ok(self.add(value))
    }

    /// Number of occupied slots beyond the sentinels.
    pub fn live(&self) -> usize {
        self.slots[RESERVED_SLOTS as usize..]
            .iter()
            .filter(|s| s.is_some())
            .count()
    }
}
