//! Core types for the Wiser integration
//!
//! The fundamental values shared by the event bus, the entity registry and the
//! device trigger layer: [`EntityId`], [`Event`], [`EventType`] and [`Context`].

mod entity_id;
mod event;

pub use entity_id::{EntityId, EntityIdError};
pub use event::{Context, Event, EventData, EventOrigin, EventType};

/// Integration domain used in device trigger descriptors
pub const DOMAIN: &str = "wiser";

/// Entity domains the integration creates entities in
pub mod domains {
    pub const BINARY_SENSOR: &str = "binary_sensor";
    pub const CLIMATE: &str = "climate";
    pub const SENSOR: &str = "sensor";
}
