//! Tracing subscriber bootstrap
//!
//! The engine only emits `tracing` events; embedding applications decide
//! whether to install a subscriber. This helper installs the same fmt
//! subscriber the services use, driven by [`ObservabilityConfig`].

use crate::config::ObservabilityConfig;
use crate::errors::{EngineError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Fails if a global
/// subscriber is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| EngineError::Internal {
        message: format!("Failed to install tracing subscriber: {}", e),
    })?;

    tracing::info!(
        level = %config.log_level,
        json = config.json_logging,
        "Tracing initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let config = ObservabilityConfig {
            json_logging: false,
            ..ObservabilityConfig::default()
        };
        // Whichever call installs first wins; the second must error, not panic.
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
