//! What the core imports from its host.

use crate::error::{CoreError, Result};

/// Host functions available to the core. Slots are indices into the host
/// registry; the core never interprets them.
pub trait HostImports: Send + Sync {
    /// Interns a string and returns its slot.
    fn string_new(&self, s: &str) -> u32;

    fn log(&self, message: &str);

    fn alert(&self, message: &str);

    /// Fills `buf` with cryptographically secure random bytes.
    fn fill_random(&self, buf: &mut [u8]) -> Result<()>;

    /// Slot referring to the module this instance was compiled from.
    fn current_module(&self) -> u32;

    /// Slot referring to the memory this instance runs on.
    fn current_memory(&self) -> u32;

    fn clone_ref(&self, slot: u32) -> u32;

    fn drop_ref(&self, slot: u32);

    /// Stores an error raised by an export and returns its slot.
    fn store_exception(&self, err: CoreError) -> u32;
}

/// Slot of an error stored through [`HostImports::store_exception`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thrown(pub u32);

/// Result of an exported entry point.
pub type Export<T> = std::result::Result<T, Thrown>;

/// A `(ptr, len)` argument in linear memory. `len` counts bytes for byte
/// buffers and strings, words for word arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slice {
    pub ptr: u32,
    pub len: u32,
}

impl Slice {
    pub const EMPTY: Self = Self { ptr: 0, len: 0 };

    pub const fn new(ptr: u32, len: u32) -> Self {
        Self { ptr, len }
    }
}
