use thiserror::Error;
use wiser_core::EntityIdError;
use wiser_registries::EntityRegistryError;

/// Errors raised by hub-backed entities
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Invalid entity_id: {0}")]
    InvalidEntityId(#[from] EntityIdError),

    #[error("Entity registry error: {0}")]
    Registry(#[from] EntityRegistryError),

    #[error("Failed to serialize event: {0}")]
    Event(#[from] serde_json::Error),
}

pub type HubResult<T> = Result<T, HubError>;
