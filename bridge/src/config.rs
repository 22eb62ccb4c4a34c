//! Bridge configuration.

use std::time::Duration;

use plonk_core::MemoryDescriptor;
use tracing::warn;

use crate::env::EntropyPreference;

/// Pool size used when none is configured.
pub const DEFAULT_THREADS: usize = 4;
/// How long the bootstrapper waits for each unit's readiness acknowledgement.
pub const DEFAULT_HANDSHAKE: Duration = Duration::from_secs(5);

pub const THREADS_VAR: &str = "PLONK_BRIDGE_THREADS";
pub const HANDSHAKE_VAR: &str = "PLONK_BRIDGE_HANDSHAKE_MS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Memory the core module is instantiated on.
    pub memory: MemoryDescriptor,
    /// Number of execution units started by [`Bridge::bootstrap`](crate::Bridge::bootstrap).
    pub threads: usize,
    pub handshake_timeout: Duration,
    pub entropy: EntropyPreference,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            memory: MemoryDescriptor::default(),
            threads: DEFAULT_THREADS,
            handshake_timeout: DEFAULT_HANDSHAKE,
            entropy: EntropyPreference::Auto,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by `PLONK_BRIDGE_THREADS` and `PLONK_BRIDGE_HANDSHAKE_MS`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(threads) = parse_var::<usize>(&lookup, THREADS_VAR).filter(|n| *n > 0) {
            config.threads = threads;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, HANDSHAKE_VAR) {
            config.handshake_timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_entropy(mut self, entropy: EntropyPreference) -> Self {
        self.entropy = entropy;
        self
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T> {
    let raw = lookup(var)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let config = BridgeConfig::from_lookup(|var| match var {
            THREADS_VAR => Some("8".into()),
            HANDSHAKE_VAR => Some(" 250 ".into()),
            _ => None,
        });
        assert_eq!(config.threads, 8);
        assert_eq!(config.handshake_timeout, Duration::from_millis(250));
        assert_eq!(config.memory, MemoryDescriptor::default());
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = BridgeConfig::from_lookup(|var| match var {
            THREADS_VAR => Some("0".into()),
            HANDSHAKE_VAR => Some("soon".into()),
            _ => None,
        });
        assert_eq!(config, BridgeConfig::default());
    }
}
