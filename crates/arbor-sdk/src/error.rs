use arbor_store::{ConfigError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no store named \"{0}\"")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
