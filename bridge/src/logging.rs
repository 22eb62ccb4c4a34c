use std::any::Any;

use tracing_forest::ForestLayer;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Keeps the profiling layer flushing until dropped. Hold it for as long as
/// spans should be recorded, normally the whole of `main`.
#[must_use = "dropping the guard stops profile output"]
pub struct LoggerGuard {
    _profile: Option<Box<dyn Any>>,
}

/// Initializes the global tracing subscriber.
///
/// The default `Level` is `INFO`. It can be overridden with `RUST_LOG`.
/// Returns an error if a subscriber is already installed.
pub fn init_logger() -> anyhow::Result<LoggerGuard> {
    if cfg!(feature = "tracing-profile") || cfg!(feature = "perfetto") {
        use tracing_profile::init_tracing;
        let guard =
            init_tracing().map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e:?}"))?;
        Ok(LoggerGuard {
            _profile: Some(Box::new(guard)),
        })
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(ForestLayer::default())
            .try_init()?;
        Ok(LoggerGuard { _profile: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(feature = "tracing-profile", feature = "perfetto")))]
    fn test_second_init_fails_without_dropping_the_first() {
        let first = init_logger();
        assert!(init_logger().is_err());
        drop(first);
    }
}
