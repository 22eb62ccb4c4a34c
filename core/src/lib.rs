//! Compute core of the Pasta PLONK bridge.
//!
//! The core owns a linear memory and an object arena, and exposes its proof
//! system through exported entry points on [`Instance`]. Hosts reach it only
//! through those exports and the [`HostImports`] they provide.

pub mod arena;
pub mod bigint;
pub mod circuit;
pub mod curve;
pub mod domain;
pub mod error;
mod exports;
pub mod field;
pub mod image;
pub mod imports;
pub mod index;
pub mod memory;
pub mod module;
pub mod oracles;
pub mod persist;
pub mod poly_comm;
pub mod pool;
pub mod proof;
pub mod runtime;
pub mod transcript;
pub mod urs;
pub mod vec_vec;
pub mod verifier_index;

#[cfg(test)]
mod testing;

pub use arena::{NativeObject, RawHandle};
pub use curve::{Pallas, PastaCurve, Vesta};
pub use error::{CoreError, Result};
pub use field::PastaField;
pub use image::{MemoryImage, SharedImage};
pub use imports::{Export, HostImports, Slice, Thrown};
pub use memory::{MemoryDescriptor, MemoryError};
pub use module::{module_image, CompiledModule, Instance};
pub use pasta_curves::{Fp, Fq};
