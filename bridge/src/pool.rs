//! Starting the execution units that share one core's memory image.
//!
//! Units are started one at a time. Each instantiates the core module on the
//! shared image, acknowledges through a signal cell and then blocks until the
//! pool is built and hands it a worker. The pool only becomes ready once
//! every unit has acknowledged; any failure aborts the whole attempt.

use std::sync::Arc;
use std::thread;

use plonk_core::pool::{PoolBuilder, SignalCell, WorkerReceiver};
use plonk_core::{CompiledModule, RawHandle, SharedImage};
use tracing::{debug, error, info, instrument, warn};

use crate::context::Bridge;
use crate::env::{EntropyProvider, HostEnv};
use crate::error::{BridgeError, Result};
use crate::native::Native;

/// Lifecycle of a bridge's execution-unit pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PoolState {
    #[default]
    Uninitialized,
    Starting,
    Ready,
}

/// Everything one execution unit needs to join the pool.
#[derive(Debug)]
pub struct ExecutionUnit {
    index: usize,
    module: Arc<CompiledModule>,
    image: SharedImage,
    entropy: EntropyProvider,
    receiver: RawHandle,
    ready: RawHandle,
}

impl ExecutionUnit {
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Body of the unit: instantiate, acknowledge, then serve the pool until it shuts down.
    pub fn run(self) {
        let env = Arc::new(HostEnv::new(self.module.clone(), self.image.clone(), self.entropy));
        let instance = match self.module.instantiate(env, self.image) {
            Ok(instance) => instance,
            Err(err) => {
                error!(index = self.index, %err, "execution unit failed to instantiate");
                return;
            }
        };
        if instance.signal_set(self.ready, 1).is_err() {
            warn!(index = self.index, "bootstrap abandoned before the unit was ready");
            return;
        }
        match instance.start_worker(self.receiver) {
            Ok(true) => debug!(index = self.index, "execution unit finished"),
            Ok(false) => debug!(index = self.index, "pool aborted, execution unit exits"),
            Err(_) => warn!(index = self.index, "execution unit lost its receiver"),
        }
    }
}

/// Starts execution units.
pub trait UnitLauncher {
    /// Starts `unit` so that it eventually calls [`ExecutionUnit::run`].
    fn launch(&self, unit: ExecutionUnit) -> std::io::Result<()>;
}

/// Runs each unit on a dedicated OS thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadLauncher;

impl UnitLauncher for ThreadLauncher {
    fn launch(&self, unit: ExecutionUnit) -> std::io::Result<()> {
        thread::Builder::new()
            .name(format!("plonk-unit-{}", unit.index()))
            .spawn(move || unit.run())
            .map(|_| ())
    }
}

impl Bridge {
    /// Starts the configured number of units on OS threads.
    pub fn bootstrap(&self) -> Result<()> {
        self.bootstrap_with(&ThreadLauncher)
    }

    /// Starts the pool with a custom launcher. Fails without side effects if
    /// the pool is already starting or ready.
    #[instrument(level = "info", skip_all, fields(threads = self.config().threads))]
    pub fn bootstrap_with(&self, launcher: &dyn UnitLauncher) -> Result<()> {
        {
            let mut state = self.pool();
            if *state != PoolState::Uninitialized {
                return Err(BridgeError::Bootstrap(format!("pool is already {:?}", *state)));
            }
            *state = PoolState::Starting;
        }
        let result = self.start_units(launcher);
        *self.pool() = match result {
            Ok(()) => PoolState::Ready,
            Err(_) => PoolState::Uninitialized,
        };
        result
    }

    fn start_units(&self, launcher: &dyn UnitLauncher) -> Result<()> {
        let threads = self.config().threads;
        let timeout_ms = u32::try_from(self.config().handshake_timeout.as_millis()).unwrap_or(u32::MAX);

        let builder: Native<PoolBuilder> = Native::wrap(
            self,
            self.call(|core| core.init_pool(threads as u32))?,
        );
        let b = builder.raw()?;
        let receiver: Native<WorkerReceiver> =
            Native::wrap(self, self.call(|core| core.pool_builder_receiver(b))?);
        let module = self
            .env()
            .take_module(self.call(|core| core.pool_builder_main_entry(b))?)?;
        let image = self.env().take_memory(self.instance().memory_ref())?;

        for index in 0..threads {
            let ready: Native<SignalCell> = Native::wrap(self, self.call(|core| core.signal_create())?);
            let unit = ExecutionUnit {
                index,
                module: module.clone(),
                image: image.clone(),
                entropy: self.env().entropy(),
                receiver: receiver.raw()?,
                ready: ready.raw()?,
            };
            let acked = launcher
                .launch(unit)
                .map_err(|e| BridgeError::Bootstrap(format!("unit {index} failed to start: {e}")))
                .and_then(|()| {
                    let h = ready.raw()?;
                    match self.call(|core| core.signal_wait_until_non_zero(h, timeout_ms))? {
                        0 => Err(BridgeError::Bootstrap(format!(
                            "unit {index} did not acknowledge within {timeout_ms} ms"
                        ))),
                        _ => Ok(()),
                    }
                });
            if let Err(err) = acked {
                warn!(index, %err, "aborting pool bootstrap");
                let b = builder.into_raw()?;
                self.call(|core| core.pool_abort(b))?;
                return Err(err);
            }
            debug!(index, "execution unit acknowledged");
        }

        let b = builder.into_raw()?;
        self.call(|core| core.pool_builder_build(b))?;
        // Units look the receiver up after building; it lives as long as the pool.
        receiver.into_raw()?;
        info!(threads, "execution units ready");
        Ok(())
    }
}
