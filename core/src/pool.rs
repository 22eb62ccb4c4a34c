//! Execution-unit pool primitives: signal cells, the pool builder and the
//! worker channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::ThreadBuilder;
use tracing::debug;

use crate::arena::NativeObject;
use crate::error::{CoreError, Result};

/// An integer cell one thread can block on until another sets it.
#[derive(Clone, Debug, Default)]
pub struct SignalCell {
    state: Arc<(Mutex<i32>, Condvar)>,
}

impl SignalCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i32 {
        *self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, value: i32) {
        let (lock, cvar) = &*self.state;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = value;
        cvar.notify_all();
    }

    /// Blocks until the cell is non-zero and returns its value, or returns 0
    /// once `timeout` has elapsed.
    pub fn wait_until_non_zero(&self, timeout: Duration) -> i32 {
        let (lock, cvar) = &*self.state;
        let deadline = Instant::now() + timeout;
        let mut value = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while *value == 0 {
            let now = Instant::now();
            if now >= deadline {
                return 0;
            }
            value = cvar
                .wait_timeout(value, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *value
    }
}

/// The receiving end of the task distribution channel, shared by all units.
#[derive(Clone, Debug)]
pub struct WorkerReceiver(Arc<Mutex<Receiver<ThreadBuilder>>>);

impl WorkerReceiver {
    /// Waits for this unit's worker and runs it until the pool shuts down.
    /// Returns `false` when the channel closed before a worker arrived.
    pub fn run_next(&self) -> bool {
        let next = self.0.lock().unwrap_or_else(PoisonError::into_inner).recv();
        match next {
            Ok(worker) => {
                debug!(index = worker.index(), "execution unit joined the pool");
                worker.run();
                true
            }
            Err(_) => false,
        }
    }
}

/// A pool of `num_threads` workers waiting to be built.
#[derive(Clone, Debug)]
pub struct PoolBuilder {
    num_threads: usize,
    main_entry: u32,
    sender: Arc<Mutex<Option<Sender<ThreadBuilder>>>>,
    receiver: WorkerReceiver,
}

impl PoolBuilder {
    /// `main_entry` is the host slot of the module every unit instantiates.
    pub fn new(num_threads: usize, main_entry: u32) -> Result<Self> {
        if num_threads == 0 {
            return Err(CoreError::Pool("a pool needs at least one execution unit".into()));
        }
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            num_threads,
            main_entry,
            sender: Arc::new(Mutex::new(Some(tx))),
            receiver: WorkerReceiver(Arc::new(Mutex::new(rx))),
        })
    }

    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub const fn main_entry(&self) -> u32 {
        self.main_entry
    }

    pub fn receiver(&self) -> WorkerReceiver {
        self.receiver.clone()
    }

    /// Builds the pool, sending one worker down the channel per unit.
    pub fn build(&self) -> Result<rayon::ThreadPool> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| CoreError::Pool("pool was already built or aborted".into()))?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("execution-unit-{i}"))
            .spawn_handler(move |worker| {
                sender
                    .send(worker)
                    .map_err(|_| std::io::Error::other("execution units are gone"))
            })
            .build()
            .map_err(|e| CoreError::Pool(e.to_string()))
    }

    /// Closes the channel so units blocked on it return.
    pub fn abort(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl NativeObject for SignalCell {}
impl NativeObject for WorkerReceiver {}
impl NativeObject for PoolBuilder {}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_signal_wakes_waiter() {
        let cell = SignalCell::new();
        let setter = cell.clone();
        let handle = thread::spawn(move || setter.set(7));
        assert_eq!(cell.wait_until_non_zero(Duration::from_secs(5)), 7);
        handle.join().unwrap();
        assert_eq!(cell.get(), 7);
    }

    #[test]
    fn test_signal_times_out() {
        let cell = SignalCell::new();
        assert_eq!(cell.wait_until_non_zero(Duration::from_millis(10)), 0);
    }

    #[test]
    fn test_build_feeds_waiting_units() {
        let builder = PoolBuilder::new(2, 0).unwrap();
        let units: Vec<_> = (0..2)
            .map(|_| {
                let rx = builder.receiver();
                thread::spawn(move || rx.run_next())
            })
            .collect();
        let pool = builder.build().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(pool.install(|| rayon::current_thread_index().is_some()));
        assert!(builder.build().is_err());
        drop(pool);
        for unit in units {
            assert!(unit.join().unwrap());
        }
    }

    #[test]
    fn test_abort_releases_units() {
        let builder = PoolBuilder::new(1, 0).unwrap();
        let rx = builder.receiver();
        let unit = thread::spawn(move || rx.run_next());
        builder.abort();
        assert!(!unit.join().unwrap());
        assert!(PoolBuilder::new(0, 0).is_err());
    }
}
