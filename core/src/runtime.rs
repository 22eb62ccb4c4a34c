use rayon::prelude::*;
use rayon::ThreadPool;

/// Where data-parallel work runs: the execution-unit pool once it is built,
/// the calling thread before that.
#[derive(Clone, Copy, Debug, Default)]
pub struct Runtime<'a> {
    pool: Option<&'a ThreadPool>,
}

impl<'a> Runtime<'a> {
    pub const fn new(pool: Option<&'a ThreadPool>) -> Self {
        Self { pool }
    }

    pub const fn sequential() -> Self {
        Self { pool: None }
    }

    pub const fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        match self.pool {
            Some(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
            None => items.into_iter().map(f).collect(),
        }
    }
}
