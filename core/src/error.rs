//! Error types for the compute core.

use thiserror::Error;

use crate::arena::{short_name, RawHandle};
use crate::memory::MemoryError;

/// Errors raised inside the core.
///
/// Every exported entry point catches these and stores them in the host
/// registry through [`HostImports::store_exception`](crate::HostImports::store_exception).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Linear memory failure
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A handle referred to an object of another kind
    #[error("expected instance of {}, found {}", short_name(.expected), short_name(.found))]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The object behind a handle was freed or moved into another call
    #[error("{} handle was already freed or moved", short_name(.kind))]
    UseAfterTransfer { kind: &'static str },

    /// The handle does not belong to this core
    #[error("invalid handle {0:?}")]
    InvalidHandle(RawHandle),

    /// The object is borrowed by another in-flight call and cannot be mutated
    #[error("{} is in use by another call", short_name(.kind))]
    Busy { kind: &'static str },

    /// Malformed bytes crossing the boundary
    #[error("decode error: {0}")]
    Decode(String),

    /// Argument rejected by an operation
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The witness does not satisfy the circuit
    #[error("unsatisfied constraint at row {row}: {reason}")]
    Unsatisfied { row: usize, reason: String },

    /// Gates were added after the vector was wired
    #[error("gate vector is sealed by wiring")]
    Sealed,

    /// Persistence failure
    #[error("i/o error: {0}")]
    Io(String),

    /// The host entropy source failed
    #[error("entropy unavailable: {0}")]
    Entropy(String),

    /// Thread pool setup failure
    #[error("thread pool: {0}")]
    Pool(String),

    /// A panic unwound out of an entry point
    #[error("core panicked: {0}")]
    Panic(String),
}

impl From<bincode::Error> for CoreError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => Self::Io(io.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for the compute core
pub type Result<T> = std::result::Result<T, CoreError>;
