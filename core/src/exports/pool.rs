//! Execution-unit pool and signal cells.

use std::time::Duration;

use tracing::{debug, info};

use crate::arena::RawHandle;
use crate::imports::Export;
use crate::module::Instance;
use crate::pool::{PoolBuilder, SignalCell, WorkerReceiver};

impl Instance {
    /// Prepares a pool of `num_threads` units. The builder references this
    /// module as the entry point every unit instantiates.
    pub fn init_pool(&self, num_threads: u32) -> Export<RawHandle> {
        self.guard("init_pool", || {
            let main_entry = self.imports().current_module();
            match PoolBuilder::new(num_threads as usize, main_entry) {
                Ok(builder) => Ok(self.insert(builder)),
                Err(err) => {
                    self.imports().drop_ref(main_entry);
                    Err(err)
                }
            }
        })
    }

    pub fn pool_builder_num_threads(&self, builder: RawHandle) -> Export<u32> {
        self.guard("pool_builder_num_threads", || {
            Ok(self.get::<PoolBuilder>(builder)?.num_threads() as u32)
        })
    }

    pub fn pool_builder_receiver(&self, builder: RawHandle) -> Export<RawHandle> {
        self.guard("pool_builder_receiver", || {
            let receiver = self.get::<PoolBuilder>(builder)?.receiver();
            Ok(self.insert(receiver))
        })
    }

    /// A new slot referring to the entry point.
    pub fn pool_builder_main_entry(&self, builder: RawHandle) -> Export<u32> {
        self.guard("pool_builder_main_entry", || {
            let slot = self.get::<PoolBuilder>(builder)?.main_entry();
            Ok(self.imports().clone_ref(slot))
        })
    }

    /// Builds the pool from units already waiting in [`Instance::start_worker`]
    /// and installs it. Consumes the builder.
    pub fn pool_builder_build(&self, builder: RawHandle) -> Export<()> {
        self.guard("pool_builder_build", || {
            let builder = self.take::<PoolBuilder>(builder)?;
            self.imports().drop_ref(builder.main_entry());
            let pool = builder.build()?;
            info!(threads = builder.num_threads(), "execution-unit pool ready");
            self.image().install_pool(pool)
        })
    }

    /// Abandons a pool before it was built, releasing waiting units.
    pub fn pool_abort(&self, builder: RawHandle) -> Export<()> {
        self.guard("pool_abort", || {
            let builder = self.take::<PoolBuilder>(builder)?;
            builder.abort();
            self.imports().drop_ref(builder.main_entry());
            debug!("execution-unit pool aborted");
            Ok(())
        })
    }

    /// Runs this unit's pool worker. Returns `false` if the pool was aborted
    /// before a worker arrived, and `true` once the pool shut down.
    pub fn start_worker(&self, receiver: RawHandle) -> Export<bool> {
        let receiver = self.guard("start_worker", || self.get::<WorkerReceiver>(receiver))?;
        Ok(receiver.run_next())
    }

    pub fn signal_create(&self) -> Export<RawHandle> {
        self.guard("signal_create", || Ok(self.insert(SignalCell::new())))
    }

    pub fn signal_get(&self, signal: RawHandle) -> Export<i32> {
        self.guard("signal_get", || Ok(self.get::<SignalCell>(signal)?.get()))
    }

    pub fn signal_set(&self, signal: RawHandle, value: i32) -> Export<()> {
        self.guard("signal_set", || {
            self.get::<SignalCell>(signal)?.set(value);
            Ok(())
        })
    }

    /// Value of the cell once non-zero, or 0 after `timeout_ms`.
    pub fn signal_wait_until_non_zero(&self, signal: RawHandle, timeout_ms: u32) -> Export<i32> {
        let signal = self.guard("signal_wait_until_non_zero", || self.get::<SignalCell>(signal))?;
        Ok(signal.wait_until_non_zero(Duration::from_millis(u64::from(timeout_ms))))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::testing::TestCore;

    #[test]
    fn test_signal_cells() {
        let core = TestCore::new();
        let inst = &core.instance;
        let signal = inst.signal_create().unwrap();
        assert_eq!(inst.signal_wait_until_non_zero(signal, 5).unwrap(), 0);
        inst.signal_set(signal, 2).unwrap();
        assert_eq!(inst.signal_get(signal).unwrap(), 2);
        assert_eq!(inst.signal_wait_until_non_zero(signal, 5).unwrap(), 2);
    }

    #[test]
    fn test_pool_build_installs_runtime() {
        let core = TestCore::new();
        let inst = &core.instance;
        let builder = inst.init_pool(2).unwrap();
        assert_eq!(inst.pool_builder_num_threads(builder).unwrap(), 2);
        let units: Vec<_> = (0..2)
            .map(|_| {
                let rx = inst.get::<WorkerReceiver>(inst.pool_builder_receiver(builder).unwrap()).unwrap();
                thread::spawn(move || rx.run_next())
            })
            .collect();
        assert!(!core.image.has_pool());
        inst.pool_builder_build(builder).unwrap();
        assert!(core.image.has_pool());
        assert!(inst.runtime().is_parallel());
        assert!(inst.pool_builder_build(builder).is_err());
        drop(units);
    }

    #[test]
    fn test_pool_abort_drops_entry_ref() {
        let core = TestCore::new();
        let inst = &core.instance;
        let builder = inst.init_pool(1).unwrap();
        let entry = inst.pool_builder_main_entry(builder).unwrap();
        assert!(entry > 3);
        let before = core.env.live_refs();
        inst.pool_abort(builder).unwrap();
        assert_eq!(core.env.live_refs(), before - 1);
        assert!(inst.init_pool(0).is_err());
    }
}
