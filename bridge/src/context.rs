//! The bridge context: one instantiated core and the host environment it imports.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plonk_core::{module_image, Export, Instance, MemoryImage, Thrown};
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::env::{EntropyProvider, HostEnv};
use crate::error::{LoadError, Result};
use crate::loader::{self, ModuleSource};
use crate::pool::PoolState;

/// Handle to a loaded core. Clones share the same core; separately loaded
/// bridges share nothing.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

struct Inner {
    config: BridgeConfig,
    env: Arc<HostEnv>,
    instance: Instance,
    pool: Mutex<PoolState>,
    /// Serializes use of the core stack, which every clone shares.
    stack: Mutex<()>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .field("instance", &self.inner.instance)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Loads the bundled core module.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Self::load(ModuleSource::Bytes(module_image()), config)
    }

    pub fn load(source: ModuleSource, config: BridgeConfig) -> Result<Self> {
        let module = loader::compile(source)?;
        let image = MemoryImage::new(config.memory).map_err(LoadError::Instantiate)?;
        let entropy = EntropyProvider::select(config.entropy);
        let env = Arc::new(HostEnv::new(module.clone(), image.clone(), entropy));
        let instance = module
            .instantiate(env.clone(), image)
            .map_err(LoadError::Instantiate)?;
        info!(?entropy, memory = ?config.memory, "core module loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                env,
                instance,
                pool: Mutex::new(PoolState::Uninitialized),
                stack: Mutex::new(()),
            }),
        })
    }

    /// Invokes one core entry point, re-raising a stored exception as a [`BridgeError`](crate::BridgeError).
    pub fn call<T>(&self, f: impl FnOnce(&Instance) -> Export<T>) -> Result<T> {
        f(&self.inner.instance).map_err(|Thrown(slot)| {
            match self.inner.env.take_exception(slot) {
                Ok(err) => {
                    debug!(slot, %err, "core raised");
                    err.into()
                }
                Err(err) => err,
            }
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn env(&self) -> &Arc<HostEnv> {
        &self.inner.env
    }

    pub fn instance(&self) -> &Instance {
        &self.inner.instance
    }

    pub fn pool_state(&self) -> PoolState {
        *self.pool()
    }

    pub(crate) fn pool(&self) -> MutexGuard<'_, PoolState> {
        self.inner.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_stack(&self) -> MutexGuard<'_, ()> {
        self.inner.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live objects in the core's arena.
    pub fn live_objects(&self) -> u32 {
        self.inner.instance.live_objects()
    }

    /// Number of live allocations in the core's heap.
    pub fn live_allocations(&self) -> usize {
        self.inner.instance.image().memory().live_allocations()
    }

    /// Version string reported by the core.
    pub fn core_version(&self) -> Result<String> {
        let slot = self.inner.instance.version();
        match self.inner.env.registry().take(slot)? {
            crate::registry::HostValue::String(s) => Ok(s),
            _ => Err(crate::BridgeError::InvalidSlot(slot)),
        }
    }

    /// Routes a message through the core into the host logger.
    pub fn console_log(&self, message: &str) -> Result<()> {
        let message = self.pass_str(message)?;
        self.call(|core| core.console_log(message))
    }
}
