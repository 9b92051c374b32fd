use std::path::PathBuf;
use thiserror::Error;
use wiser_event_bus::EventBusError;

/// Trigger errors
///
/// Every variant describes a configuration the caller has to fix; lookups that
/// simply find nothing are not errors.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Invalid trigger configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported trigger type: {0}")]
    UnsupportedType(String),

    #[error("Trigger subscription rejected: {0}")]
    Subscription(#[from] EventBusError),

    #[error("Failed to read trigger configuration {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse trigger configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse trigger configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for trigger operations
pub type TriggerResult<T> = Result<T, TriggerError>;
