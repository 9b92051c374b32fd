//! Trigger descriptors and user-authored trigger configuration
//!
//! The same shape serves both directions: the catalog hands descriptors to the
//! automation editor, and the saved automation hands them back as configuration.
//!
//! ```yaml
//! platform: device
//! device_id: 5f1d3c0e
//! domain: wiser
//! entity_id: sensor.hall_panel_last_button_pressed
//! type: button_2_long_pressed
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wiser_core::{EntityId, DOMAIN};

use crate::button::ButtonTrigger;
use crate::capability::CapabilityTable;
use crate::error::{TriggerError, TriggerResult};

/// Trigger platform name for device triggers
pub const DEVICE_PLATFORM: &str = "device";

/// One selectable device trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub platform: String,
    pub device_id: String,
    pub domain: String,
    pub entity_id: EntityId,
    #[serde(rename = "type")]
    pub trigger_type: String,
}

impl TriggerDescriptor {
    pub fn new(
        device_id: impl Into<String>,
        entity_id: EntityId,
        trigger_type: impl Into<String>,
    ) -> Self {
        Self {
            platform: DEVICE_PLATFORM.to_string(),
            device_id: device_id.into(),
            domain: DOMAIN.to_string(),
            entity_id,
            trigger_type: trigger_type.into(),
        }
    }

    /// The decoded button trigger, if this is a button panel trigger
    pub fn button(&self) -> Option<ButtonTrigger> {
        ButtonTrigger::decode(&self.trigger_type)
    }

    /// Check platform, domain, and that the type is a known capability or button token
    pub fn validate(&self, capabilities: &CapabilityTable) -> TriggerResult<()> {
        if self.platform != DEVICE_PLATFORM {
            return Err(TriggerError::InvalidConfig(format!(
                "expected platform '{DEVICE_PLATFORM}', got '{}'",
                self.platform
            )));
        }
        if self.domain != DOMAIN {
            return Err(TriggerError::InvalidConfig(format!(
                "expected domain '{DOMAIN}', got '{}'",
                self.domain
            )));
        }
        if self.device_id.is_empty() {
            return Err(TriggerError::InvalidConfig(
                "device_id cannot be empty".to_string(),
            ));
        }
        if self.button().is_none() && !capabilities.contains_type(&self.trigger_type) {
            return Err(TriggerError::UnsupportedType(self.trigger_type.clone()));
        }
        Ok(())
    }
}

/// Parse and validate a trigger configuration from JSON
pub fn parse_trigger_config(
    value: serde_json::Value,
    capabilities: &CapabilityTable,
) -> TriggerResult<TriggerDescriptor> {
    let descriptor: TriggerDescriptor =
        serde_json::from_value(value).map_err(|e| TriggerError::InvalidConfig(e.to_string()))?;
    descriptor.validate(capabilities)?;
    Ok(descriptor)
}

/// Parse and validate a trigger configuration from YAML
pub fn parse_trigger_config_yaml(
    yaml: &str,
    capabilities: &CapabilityTable,
) -> TriggerResult<TriggerDescriptor> {
    let descriptor: TriggerDescriptor = serde_yaml::from_str(yaml)?;
    descriptor.validate(capabilities)?;
    Ok(descriptor)
}

/// Load a YAML file holding a list of trigger configurations
pub fn load_trigger_configs(
    path: impl AsRef<Path>,
    capabilities: &CapabilityTable,
) -> TriggerResult<Vec<TriggerDescriptor>> {
    let path = path.as_ref();
    debug!("Loading trigger configuration: {:?}", path);

    let contents = std::fs::read_to_string(path).map_err(|source| TriggerError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptors: Vec<TriggerDescriptor> = serde_yaml::from_str(&contents)?;
    for descriptor in &descriptors {
        descriptor.validate(capabilities)?;
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn table() -> CapabilityTable {
        CapabilityTable::default()
    }

    #[test]
    fn test_parse_button_config() {
        let descriptor = parse_trigger_config(
            json!({
                "platform": "device",
                "device_id": "device-1",
                "domain": "wiser",
                "entity_id": "sensor.hall_panel_last_button_pressed",
                "type": "button_2_long_pressed",
                "metadata": {}
            }),
            &table(),
        )
        .unwrap();

        assert_eq!(descriptor.button().unwrap().button_number(), 2);
        assert_eq!(descriptor.entity_id.domain(), "sensor");
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = parse_trigger_config(
            json!({
                "platform": "device",
                "device_id": "device-1",
                "domain": "wiser",
                "entity_id": "climate.lounge",
                "type": "button_9_pressed"
            }),
            &table(),
        )
        .unwrap_err();
        assert!(matches!(err, TriggerError::UnsupportedType(t) if t == "button_9_pressed"));
    }

    #[test]
    fn test_rejects_wrong_platform_or_domain() {
        let mut descriptor =
            TriggerDescriptor::new("device-1", "climate.lounge".parse().unwrap(), "boosted");
        assert!(descriptor.validate(&table()).is_ok());

        descriptor.platform = "state".to_string();
        assert!(matches!(
            descriptor.validate(&table()),
            Err(TriggerError::InvalidConfig(_))
        ));

        descriptor.platform = DEVICE_PLATFORM.to_string();
        descriptor.domain = "zha".to_string();
        assert!(matches!(
            descriptor.validate(&table()),
            Err(TriggerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_entity_id() {
        let err = parse_trigger_config(
            json!({
                "platform": "device",
                "device_id": "device-1",
                "domain": "wiser",
                "entity_id": "Lounge Thermostat",
                "type": "boosted"
            }),
            &table(),
        )
        .unwrap_err();
        assert!(matches!(err, TriggerError::InvalidConfig(_)));

        let err = parse_trigger_config(json!({"platform": "device"}), &table()).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_yaml() {
        let descriptor = parse_trigger_config_yaml(
            "platform: device\n\
             device_id: device-1\n\
             domain: wiser\n\
             entity_id: climate.lounge\n\
             type: started_heating\n",
            &table(),
        )
        .unwrap();
        assert_eq!(descriptor.trigger_type, "started_heating");
        assert!(descriptor.button().is_none());

        assert!(matches!(
            parse_trigger_config_yaml("platform: [", &table()),
            Err(TriggerError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- platform: device\n  device_id: device-1\n  domain: wiser\n  entity_id: climate.lounge\n  type: boosted\n\
             - platform: device\n  device_id: device-2\n  domain: wiser\n  entity_id: sensor.hall_panel\n  type: button_1_pressed"
        )
        .unwrap();

        let descriptors = load_trigger_configs(file.path(), &table()).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1].device_id, "device-2");

        let missing = load_trigger_configs("/nonexistent/triggers.yaml", &table()).unwrap_err();
        assert!(matches!(missing, TriggerError::ReadFile { .. }));
    }
}
