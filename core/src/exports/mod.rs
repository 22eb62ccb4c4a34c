//! Exported entry points of the core.
//!
//! Arguments arrive as [`Slice`]s the host allocated with [`Instance::malloc`];
//! the core reads and frees them. Variable-length results are allocated by
//! the core and described by `(ptr, len)` words written at `retptr`, which the
//! host reserves with [`Instance::add_to_stack_pointer`]. Objects stay in the
//! arena and cross as [`RawHandle`]s.

mod bigint;
mod curve;
mod field;
mod memory;
mod plonk;
mod pool;
mod records;
mod urs;

use std::path::PathBuf;

use crate::error::{CoreError, Result};
use crate::imports::{Export, Slice};
use crate::module::Instance;

/// Decodes an `(is_some, value)` pair for an optional byte offset.
pub(crate) fn decode_offset(is_some: u32, offset: u32) -> Result<Option<u64>> {
    match is_some {
        0 => Ok(None),
        1 => Ok(Some(u64::from(offset))),
        other => Err(CoreError::Decode(format!("invalid option tag {other}"))),
    }
}

impl Instance {
    pub(crate) fn read_path(&self, path: Slice) -> Result<PathBuf> {
        Ok(PathBuf::from(self.read_str(path)?))
    }

    /// Slot of the memory this instance runs on.
    pub fn memory_ref(&self) -> u32 {
        self.imports().current_memory()
    }

    /// Routes a message through the host logger.
    pub fn console_log(&self, message: Slice) -> Export<()> {
        self.guard("console_log", || {
            let message = self.read_str(message)?;
            self.imports().log(&message);
            Ok(())
        })
    }

    /// Interned version string of the core.
    pub fn version(&self) -> u32 {
        self.imports()
            .string_new(concat!("plonk-core ", env!("CARGO_PKG_VERSION")))
    }

    /// Number of live objects in the arena.
    pub fn live_objects(&self) -> u32 {
        self.arena().live() as u32
    }
}
