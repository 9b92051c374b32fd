//! Registration of hub-backed entities

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use wiser_core::{EntityId, DOMAIN};
use wiser_registries::{EntityEntry, EntityRegistry};

use crate::error::HubResult;

/// Manufacturer reported for every hub device
pub const MANUFACTURER: &str = "Schneider Electric";

/// Device card data for the entity's hub device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    /// `(integration domain, identifier)` pairs
    pub identifiers: Vec<(String, String)>,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
    /// The hub the device is reached through
    pub via_device: (String, String),
}

impl DeviceInfo {
    pub fn new(
        hub_name: &str,
        device_id: &str,
        name: impl Into<String>,
        model: impl Into<String>,
        sw_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifiers: vec![(DOMAIN.to_string(), format!("{hub_name}-{device_id}"))],
            manufacturer: MANUFACTURER.to_string(),
            model: model.into(),
            sw_version: sw_version.into(),
            via_device: (DOMAIN.to_string(), hub_name.to_string()),
        }
    }
}

/// An entity whose state comes from a hub device
pub trait HubEntity {
    fn entity_id(&self) -> &EntityId;

    /// Adopt the entity_id the registry holds for this entity
    fn set_entity_id(&mut self, entity_id: EntityId);

    /// Stable id, prefixed with the hub name
    fn unique_id(&self) -> String;

    /// Hub device the entity belongs to
    fn device_id(&self) -> &str;

    fn name(&self) -> String;

    /// Register the entity under its device, or return the existing entry
    ///
    /// The registry keeps the entity_id of an entry that is already known by
    /// unique_id, so renames made by the user survive a reload, and suffixes an
    /// entity_id another device already uses. Either way the entity switches to
    /// the registered id, so the events it fires match the triggers listed for it.
    fn register(&mut self, registry: &EntityRegistry) -> HubResult<Arc<EntityEntry>> {
        let unique_id = self.unique_id();
        let mut entry = registry.get_or_create(
            DOMAIN,
            self.entity_id().as_str(),
            Some(&unique_id),
            Some(self.device_id()),
        )?;

        if entry.original_name.is_none() {
            let name = self.name();
            debug!(entity_id = %entry.entity_id, %name, "Registered hub entity");
            entry = registry.update(entry.entity_id.as_str(), |e| e.original_name = Some(name))?;
        }

        if entry.entity_id != *self.entity_id() {
            debug!(
                from = %self.entity_id(),
                to = %entry.entity_id,
                "Using registered entity_id"
            );
            self.set_entity_id(entry.entity_id.clone());
        }
        Ok(entry)
    }
}

/// Register a batch of entities, returning how many are in the registry
pub fn register_all<'a, E>(
    registry: &EntityRegistry,
    entities: impl IntoIterator<Item = &'a mut E>,
) -> HubResult<usize>
where
    E: HubEntity + 'a,
{
    let mut count = 0;
    for entity in entities {
        entity.register(registry)?;
        count += 1;
    }
    Ok(count)
}
