//! Error types for the host side of the bridge.

use plonk_core::arena::short_name;
use plonk_core::CoreError;
use thiserror::Error;

/// Errors raised while loading the core module.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The module bytes were rejected
    #[error("failed to compile core module: {0}")]
    Compile(#[source] CoreError),

    /// The memory or instance could not be created
    #[error("failed to instantiate core module: {0}")]
    Instantiate(#[source] CoreError),

    /// Reading the module body failed
    #[error("failed to read core module: {0}")]
    Read(#[from] std::io::Error),
}

/// Errors surfaced by bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A handle named an object of another kind
    #[error("expected instance of {expected}")]
    TypeMismatch { expected: String },

    /// A host registry slot was out of range or vacant
    #[error("invalid registry slot {0}")]
    InvalidSlot(u32),

    /// Bytes crossing the boundary did not decode
    #[error("decode error: {0}")]
    Decode(String),

    /// The handle was already freed or moved into another call
    #[error("{kind} handle was already freed or moved")]
    UseAfterTransfer { kind: String },

    /// Any other failure raised inside the core, kept intact
    #[error("core failure: {payload}")]
    CoreFailure { payload: CoreError },

    /// Loading the core module failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The execution-unit pool could not be started
    #[error("pool bootstrap failed: {0}")]
    Bootstrap(String),

    /// Host-side i/o failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for BridgeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TypeMismatch { expected, .. } => Self::TypeMismatch {
                expected: short_name(expected),
            },
            CoreError::UseAfterTransfer { kind } => Self::UseAfterTransfer {
                kind: short_name(kind),
            },
            CoreError::Decode(msg) => Self::Decode(msg),
            payload => Self::CoreFailure { payload },
        }
    }
}

impl From<bincode::Error> for BridgeError {
    fn from(err: bincode::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
