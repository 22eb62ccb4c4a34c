//! The memory image shared by every execution unit of one core.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use rayon::ThreadPool;

use crate::arena::ObjectArena;
use crate::error::{CoreError, Result};
use crate::memory::{LinearMemory, MemoryDescriptor};
use crate::runtime::Runtime;

pub type SharedImage = Arc<MemoryImage>;

/// Linear memory, object arena and, once bootstrapped, the execution-unit pool.
#[derive(Debug)]
pub struct MemoryImage {
    memory: Mutex<LinearMemory>,
    arena: Mutex<ObjectArena>,
    pool: OnceCell<ThreadPool>,
}

impl MemoryImage {
    /// Constructs the memory an instance imports. Rejects any descriptor the
    /// module was not built for.
    pub fn new(descriptor: MemoryDescriptor) -> Result<SharedImage> {
        Ok(Arc::new(Self {
            memory: Mutex::new(LinearMemory::new(descriptor)?),
            arena: Mutex::new(ObjectArena::new()),
            pool: OnceCell::new(),
        }))
    }

    pub fn memory(&self) -> MutexGuard<'_, LinearMemory> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn arena(&self) -> MutexGuard<'_, ObjectArena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn runtime(&self) -> Runtime<'_> {
        Runtime::new(self.pool.get())
    }

    pub fn has_pool(&self) -> bool {
        self.pool.get().is_some()
    }

    /// Hands the pool to the runtime. Happens at most once.
    pub(crate) fn install_pool(&self, pool: ThreadPool) -> Result<()> {
        self.pool
            .set(pool)
            .map_err(|_| CoreError::Pool("a pool is already installed".into()))
    }
}
