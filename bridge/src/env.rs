//! The host environment the core is instantiated with.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plonk_core::{CompiledModule, CoreError, HostImports, SharedImage};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::registry::{HandleTable, HostValue};

/// Largest request a `getRandomValues`-style provider accepts at once.
pub const GET_RANDOM_VALUES_MAX: usize = 65536;

/// Which entropy provider the environment uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntropyPreference {
    /// `getRandomValues` when it works, `randomFillSync` otherwise.
    #[default]
    Auto,
    GetRandomValues,
    RandomFillSync,
}

/// A source of cryptographically secure bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntropyProvider {
    /// The operating system generator, read in bounded chunks.
    GetRandomValues,
    /// A generator seeded from the operating system.
    RandomFillSync,
}

impl EntropyProvider {
    pub fn select(preference: EntropyPreference) -> Self {
        match preference {
            EntropyPreference::GetRandomValues => Self::GetRandomValues,
            EntropyPreference::RandomFillSync => Self::RandomFillSync,
            EntropyPreference::Auto => {
                let mut byte = [0u8; 1];
                match OsRng.try_fill_bytes(&mut byte) {
                    Ok(()) => Self::GetRandomValues,
                    Err(err) => {
                        debug!(%err, "getRandomValues unavailable, using randomFillSync");
                        Self::RandomFillSync
                    }
                }
            }
        }
    }

    pub fn fill(&self, buf: &mut [u8]) -> std::result::Result<(), CoreError> {
        match self {
            Self::GetRandomValues => {
                for chunk in buf.chunks_mut(GET_RANDOM_VALUES_MAX) {
                    OsRng
                        .try_fill_bytes(chunk)
                        .map_err(|e| CoreError::Entropy(e.to_string()))?;
                }
                Ok(())
            }
            Self::RandomFillSync => rand::thread_rng()
                .try_fill_bytes(buf)
                .map_err(|e| CoreError::Entropy(e.to_string())),
        }
    }
}

/// Implements the core's imports on top of a [`HandleTable`].
#[derive(Debug)]
pub struct HostEnv {
    registry: Mutex<HandleTable>,
    module: Arc<CompiledModule>,
    image: SharedImage,
    entropy: EntropyProvider,
}

impl HostEnv {
    pub fn new(module: Arc<CompiledModule>, image: SharedImage, entropy: EntropyProvider) -> Self {
        Self {
            registry: Mutex::new(HandleTable::new()),
            module,
            image,
            entropy,
        }
    }

    pub fn registry(&self) -> MutexGuard<'_, HandleTable> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn entropy(&self) -> EntropyProvider {
        self.entropy
    }

    /// Removes the exception stored in `slot`.
    pub fn take_exception(&self, slot: u32) -> Result<CoreError> {
        match self.registry().take(slot)? {
            HostValue::Exception(err) => Ok(err),
            other => Ok(CoreError::InvalidArgument(format!(
                "slot {slot} holds {other:?}, not an exception"
            ))),
        }
    }

    /// Removes the module referenced by `slot`.
    pub fn take_module(&self, slot: u32) -> Result<Arc<CompiledModule>> {
        match self.registry().take(slot)? {
            HostValue::Module(module) => Ok(module),
            _ => Err(crate::BridgeError::InvalidSlot(slot)),
        }
    }

    /// Removes the memory referenced by `slot`.
    pub fn take_memory(&self, slot: u32) -> Result<SharedImage> {
        match self.registry().take(slot)? {
            HostValue::Memory(image) => Ok(image),
            _ => Err(crate::BridgeError::InvalidSlot(slot)),
        }
    }
}

impl HostImports for HostEnv {
    fn string_new(&self, s: &str) -> u32 {
        self.registry().add(HostValue::String(s.to_string()))
    }

    fn log(&self, message: &str) {
        info!(target: "plonk_core", "{message}");
    }

    fn alert(&self, message: &str) {
        warn!(target: "plonk_core", "{message}");
    }

    fn fill_random(&self, buf: &mut [u8]) -> plonk_core::Result<()> {
        self.entropy.fill(buf)
    }

    fn current_module(&self) -> u32 {
        self.registry().add(HostValue::Module(self.module.clone()))
    }

    fn current_memory(&self) -> u32 {
        self.registry().add(HostValue::Memory(self.image.clone()))
    }

    fn clone_ref(&self, slot: u32) -> u32 {
        let mut registry = self.registry();
        registry.clone_ref(slot).unwrap_or_else(|err| {
            warn!(%err, "clone of a dead reference");
            registry.add(HostValue::Undefined)
        })
    }

    fn drop_ref(&self, slot: u32) {
        self.registry().remove(slot);
    }

    fn store_exception(&self, err: CoreError) -> u32 {
        self.registry().add(HostValue::Exception(err))
    }
}

#[cfg(test)]
mod tests {
    use plonk_core::{module_image, MemoryDescriptor, MemoryImage};

    use super::*;

    fn env() -> HostEnv {
        let module = Arc::new(CompiledModule::compile(&module_image()).unwrap());
        let image = MemoryImage::new(MemoryDescriptor::default()).unwrap();
        HostEnv::new(module, image, EntropyProvider::select(EntropyPreference::Auto))
    }

    #[test]
    fn test_entropy_fills_large_buffers() {
        for provider in [EntropyProvider::GetRandomValues, EntropyProvider::RandomFillSync] {
            let mut buf = vec![0u8; GET_RANDOM_VALUES_MAX * 2 + 17];
            provider.fill(&mut buf).unwrap();
            assert!(buf.iter().any(|b| *b != 0));
        }
    }

    #[test]
    fn test_references_cross_once() {
        let env = env();
        let module = env.current_module();
        let copy = env.clone_ref(module);
        assert!(env.take_module(module).is_ok());
        assert!(env.take_module(module).is_err());
        assert!(env.take_module(copy).is_ok());

        let memory = env.current_memory();
        assert!(env.take_module(memory).is_err());
        assert_eq!(env.registry().live(), 0);
    }

    #[test]
    fn test_exceptions_are_taken() {
        let env = env();
        let slot = env.store_exception(CoreError::Sealed);
        assert_eq!(env.take_exception(slot).unwrap(), CoreError::Sealed);
        assert!(env.take_exception(slot).is_err());
    }
}
