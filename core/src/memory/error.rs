use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("null pointer dereference")]
    NullPointer,
    #[error("access of {len} bytes at {ptr:#x} is out of bounds ({size} bytes mapped)")]
    OutOfBounds { ptr: u32, len: u32, size: u32 },
    #[error("pointer {0:#x} was not allocated")]
    UnknownAllocation(u32),
    #[error("memory cannot grow beyond {max} pages")]
    GrowthLimit { max: u32 },
    #[error("stack pointer moved outside the stack region to {0}")]
    StackOverflow(i64),
    #[error("invalid memory descriptor: {0}")]
    InvalidDescriptor(String),
}
