//! Registries for the Wiser integration
//!
//! Currently only the entity registry, which links the entities the integration
//! creates to the hub devices they belong to.

pub mod entity_registry;

pub use entity_registry::{
    DisabledBy, EntityEntry, EntityRegistry, EntityRegistryError, EntityRegistryResult,
};
