//! Process-wide `tracing` setup.

use tracing_subscriber::EnvFilter;

use crate::config::ArborConfig;
use crate::error::{SdkError, SdkResult};

/// Install a formatting subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Fails if a global
/// subscriber is already installed or the filter does not parse.
pub fn init_tracing(default_filter: &str) -> SdkResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| SdkError::Telemetry(e.to_string()))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| SdkError::Telemetry(e.to_string()))
}

/// Install a formatting subscriber using the `[log]` section of `config`.
pub fn init_tracing_from(config: &ArborConfig) -> SdkResult<()> {
    init_tracing(&config.log.filter)
}
