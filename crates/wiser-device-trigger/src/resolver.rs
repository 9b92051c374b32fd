//! Trigger catalog: which triggers does a device offer

use std::sync::Arc;

use tracing::debug;
use wiser_core::domains;
use wiser_registries::{EntityEntry, EntityRegistry};

use crate::button::ButtonTrigger;
use crate::capability::CapabilityTable;
use crate::config::TriggerDescriptor;

/// Marker in the unique_id of a button panel's "last button pressed" sensor
pub const BUTTON_PANEL_MARKER: &str = "button_panel_last_button";

/// Resolves the triggers available for a device from its registered entities
pub struct TriggerCatalog {
    registry: Arc<EntityRegistry>,
    capabilities: CapabilityTable,
}

impl TriggerCatalog {
    pub fn new(registry: Arc<EntityRegistry>, capabilities: CapabilityTable) -> Self {
        Self {
            registry,
            capabilities,
        }
    }

    /// List the triggers of a device
    ///
    /// Capability triggers for every entity come first (entity registration
    /// order, then table order), followed by the button triggers of any button
    /// panel sensors. Entities of the same domain each get their own copy of the
    /// capability triggers. A device without matching entities has no triggers.
    pub fn list_triggers(&self, device_id: &str) -> Vec<TriggerDescriptor> {
        let entries = self.registry.entries_for_device(device_id);

        let capability_triggers = entries.iter().flat_map(|entry| {
            self.capabilities
                .types_for_domain(entry.domain())
                .into_iter()
                .map(move |trigger_type| {
                    TriggerDescriptor::new(device_id, entry.entity_id.clone(), trigger_type)
                })
        });

        let button_triggers = entries
            .iter()
            .filter(|entry| is_button_panel_sensor(entry))
            .flat_map(|entry| {
                ButtonTrigger::all().map(move |button| {
                    TriggerDescriptor::new(device_id, entry.entity_id.clone(), button.encode())
                })
            });

        let triggers: Vec<TriggerDescriptor> =
            capability_triggers.chain(button_triggers).collect();

        debug!(
            device_id,
            entities = entries.len(),
            triggers = triggers.len(),
            "Resolved device triggers"
        );
        triggers
    }
}

fn is_button_panel_sensor(entry: &EntityEntry) -> bool {
    entry.domain() == domains::SENSOR
        && entry
            .unique_id
            .as_deref()
            .is_some_and(|uid| uid.contains(BUTTON_PANEL_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use wiser_registries::DisabledBy;

    static THREE_CLIMATE: &[Capability] = &[
        Capability::new("climate", "boosted"),
        Capability::new("climate", "mode_changed"),
        Capability::new("climate", "stopped_heating"),
    ];

    fn catalog(table: CapabilityTable) -> (TriggerCatalog, Arc<EntityRegistry>) {
        let registry = Arc::new(EntityRegistry::new());
        (TriggerCatalog::new(registry.clone(), table), registry)
    }

    fn types(triggers: &[TriggerDescriptor]) -> Vec<&str> {
        triggers.iter().map(|t| t.trigger_type.as_str()).collect()
    }

    #[test]
    fn test_climate_entity_gets_table_rows_in_order() {
        let (catalog, registry) = catalog(CapabilityTable::new(THREE_CLIMATE));
        registry
            .get_or_create("wiser", "climate.lounge", Some("wiser-climate-1"), Some("dev"))
            .unwrap();

        let triggers = catalog.list_triggers("dev");
        assert_eq!(types(&triggers), vec!["boosted", "mode_changed", "stopped_heating"]);
        for trigger in &triggers {
            assert_eq!(trigger.entity_id.as_str(), "climate.lounge");
            assert_eq!(trigger.device_id, "dev");
            assert_eq!(trigger.platform, "device");
            assert_eq!(trigger.domain, "wiser");
        }
    }

    #[test]
    fn test_button_panel_sensor_gets_eight_triggers() {
        let (catalog, registry) = catalog(CapabilityTable::new(THREE_CLIMATE));
        registry
            .get_or_create(
                "wiser",
                "sensor.hall_panel_last_button",
                Some("abc_button_panel_last_button_pressed"),
                Some("dev"),
            )
            .unwrap();

        let triggers = catalog.list_triggers("dev");
        assert_eq!(types(&triggers), crate::button::BUTTON_TRIGGER_TYPES);
        assert!(triggers
            .iter()
            .all(|t| t.entity_id.as_str() == "sensor.hall_panel_last_button"));
    }

    #[test]
    fn test_other_sensors_have_no_triggers() {
        let (catalog, registry) = catalog(CapabilityTable::default());
        registry
            .get_or_create("wiser", "sensor.hall_panel_battery", Some("abc_battery"), Some("dev"))
            .unwrap();
        registry
            .get_or_create("wiser", "sensor.hall_panel_signal", None, Some("dev"))
            .unwrap();
        // marker on a non-sensor entity does not count
        registry
            .get_or_create(
                "wiser",
                "binary_sensor.hall_panel",
                Some("abc_button_panel_last_button"),
                Some("dev"),
            )
            .unwrap();

        assert!(catalog.list_triggers("dev").is_empty());
        assert!(catalog.list_triggers("unknown-device").is_empty());
    }

    #[test]
    fn test_capability_triggers_precede_button_triggers() {
        let (catalog, registry) = catalog(CapabilityTable::new(THREE_CLIMATE));
        registry
            .get_or_create(
                "wiser",
                "sensor.panel_last",
                Some("x_button_panel_last_button"),
                Some("dev"),
            )
            .unwrap();
        registry
            .get_or_create("wiser", "climate.lounge", None, Some("dev"))
            .unwrap();
        registry
            .get_or_create("wiser", "climate.office", None, Some("dev"))
            .unwrap();

        let triggers = catalog.list_triggers("dev");
        assert_eq!(triggers.len(), 3 + 3 + 8);

        let entities: Vec<&str> = triggers.iter().map(|t| t.entity_id.as_str()).collect();
        assert_eq!(&entities[..3], ["climate.lounge"; 3]);
        assert_eq!(&entities[3..6], ["climate.office"; 3]);
        assert!(entities[6..].iter().all(|e| *e == "sensor.panel_last"));
    }

    #[test]
    fn test_disabled_entities_offer_no_triggers() {
        let (catalog, registry) = catalog(CapabilityTable::new(THREE_CLIMATE));
        registry
            .get_or_create("wiser", "climate.lounge", None, Some("dev"))
            .unwrap();
        registry
            .get_or_create("wiser", "climate.office", None, Some("dev"))
            .unwrap();
        registry
            .update("climate.lounge", |e| e.disabled_by = Some(DisabledBy::User))
            .unwrap();

        let triggers = catalog.list_triggers("dev");
        assert_eq!(triggers.len(), 3);
        assert!(triggers
            .iter()
            .all(|t| t.entity_id.as_str() == "climate.office"));

        registry
            .update("climate.office", |e| e.disabled_by = Some(DisabledBy::Integration))
            .unwrap();
        assert!(catalog.list_triggers("dev").is_empty());
    }

    #[test]
    fn test_results_are_fresh_and_structural() {
        let (catalog, registry) = catalog(CapabilityTable::default());
        registry
            .get_or_create("wiser", "climate.lounge", None, Some("dev"))
            .unwrap();

        let first = catalog.list_triggers("dev");
        assert_eq!(first, catalog.list_triggers("dev"));

        registry.remove("climate.lounge");
        assert!(catalog.list_triggers("dev").is_empty());
    }
}
