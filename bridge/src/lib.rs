//! Host side of the Pasta PLONK bridge.
//!
//! A [`Bridge`] loads the compute core, owns the host registry it imports and
//! exposes the core's operations through typed, ownership-aware wrappers:
//!
//! ```no_run
//! use plonk_bridge::{Bridge, BridgeConfig};
//!
//! let bridge = Bridge::new(BridgeConfig::from_env())?;
//! let fp = bridge.fp();
//! let three = fp.add(&fp.of_int(1)?, &fp.of_int(2)?)?;
//! assert_eq!(fp.to_string(&three)?, "3");
//! # Ok::<(), plonk_bridge::BridgeError>(())
//! ```

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod facade;
pub mod loader;
mod logging;
pub mod marshal;
pub mod native;
pub mod pool;
pub mod registry;

pub use config::BridgeConfig;
pub use context::Bridge;
pub use env::{EntropyPreference, EntropyProvider, HostEnv};
pub use error::{BridgeError, LoadError, Result};
pub use loader::{ModuleSource, Response};
pub use logging::{init_logger, LoggerGuard};
pub use marshal::ReturnArea;
pub use native::{AnyNative, Native};
pub use plonk_core;
pub use pool::{ExecutionUnit, PoolState, ThreadLauncher, UnitLauncher};
