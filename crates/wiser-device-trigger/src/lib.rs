//! Device triggers for Wiser devices
//!
//! This crate answers two questions for an automation engine:
//!
//! - which triggers does a device offer ([`DeviceTriggers::list_triggers`])
//! - how to listen for one of them ([`DeviceTriggers::attach`])
//!
//! # Trigger types
//!
//! ```text
//! climate.*  ──►  capability table   ──►  boosted, started_heating, ...  ──►  wiser_event
//! sensor.* (button_panel_last_button)  ──►  button_{1..4}[_long]_pressed  ──►  wiser_button_panel_event
//! ```
//!
//! # Key Types
//!
//! - [`CapabilityTable`] - static `(domain, type)` rows
//! - [`ButtonTrigger`] - decoded button token
//! - [`TriggerDescriptor`] - one selectable trigger, also used as configuration
//! - [`TriggerCatalog`] - resolves a device's triggers from the entity registry
//! - [`TriggerBinder`] - attaches a configuration to the event bus

pub mod binder;
pub mod button;
pub mod capability;
pub mod config;
mod error;
pub mod events;
pub mod resolver;

pub use binder::{SubscriptionRequest, TriggerBinder, TriggerData, TriggerHandle};
pub use button::{ButtonTrigger, PressKind, BUTTON_TRIGGER_TYPES};
pub use capability::{Capability, CapabilityTable, WISER_CAPABILITIES};
pub use config::{
    load_trigger_configs, parse_trigger_config, parse_trigger_config_yaml, TriggerDescriptor,
    DEVICE_PLATFORM,
};
pub use error::{TriggerError, TriggerResult};
pub use events::{ButtonPanelEvent, WiserEvent, WISER_BUTTON_PANEL_EVENT, WISER_EVENT};
pub use resolver::{TriggerCatalog, BUTTON_PANEL_MARKER};

use std::sync::Arc;

use tracing::{info, warn};
use wiser_event_bus::EventBus;
use wiser_registries::EntityRegistry;

/// Catalog and binder sharing one capability table
pub struct DeviceTriggers {
    capabilities: CapabilityTable,
    catalog: TriggerCatalog,
    binder: TriggerBinder,
}

impl DeviceTriggers {
    /// Set up device triggers with the built-in capability table
    pub fn new(registry: Arc<EntityRegistry>, bus: Arc<EventBus>) -> TriggerResult<Self> {
        Self::with_capabilities(registry, bus, CapabilityTable::default())
    }

    /// Set up device triggers with a custom capability table
    ///
    /// Registers the listener schemas for both Wiser event types on the bus.
    pub fn with_capabilities(
        registry: Arc<EntityRegistry>,
        bus: Arc<EventBus>,
        capabilities: CapabilityTable,
    ) -> TriggerResult<Self> {
        for trigger_type in capabilities.trigger_types() {
            if ButtonTrigger::decode(trigger_type).is_some() {
                warn!(trigger_type, "Capability token collides with a button token");
            }
        }

        bus.register_schema(WISER_EVENT, &events::wiser_event_schema(&capabilities))?;
        bus.register_schema(
            WISER_BUTTON_PANEL_EVENT,
            &events::button_panel_event_schema(),
        )?;
        info!(
            capabilities = capabilities.rows().len(),
            "Device triggers ready"
        );

        Ok(Self {
            capabilities,
            catalog: TriggerCatalog::new(registry, capabilities),
            binder: TriggerBinder::new(bus),
        })
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    /// Every trigger type a configuration may use
    pub fn trigger_types(&self) -> Vec<&'static str> {
        let mut types = self.capabilities.trigger_types();
        types.extend(BUTTON_TRIGGER_TYPES);
        types
    }

    pub fn list_triggers(&self, device_id: &str) -> Vec<TriggerDescriptor> {
        self.catalog.list_triggers(device_id)
    }

    /// Parse and validate a user-authored trigger configuration
    pub fn validate_config(&self, config: serde_json::Value) -> TriggerResult<TriggerDescriptor> {
        parse_trigger_config(config, &self.capabilities)
    }

    pub fn attach<F>(&self, config: &TriggerDescriptor, action: F) -> TriggerResult<TriggerHandle>
    where
        F: Fn(TriggerData) + Send + Sync + 'static,
    {
        self.binder.attach(config, action)
    }
}
