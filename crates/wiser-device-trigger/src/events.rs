//! Events raised by the hub for device triggers, and the listener schemas for them

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use wiser_core::{EntityId, EventData};

use crate::button::{ButtonTrigger, PressKind, BUTTON_COUNT};
use crate::capability::CapabilityTable;

/// Generic device event (climate boosts, heating started, ...)
pub const WISER_EVENT: &str = "wiser_event";

/// Button panel press event
pub const WISER_BUTTON_PANEL_EVENT: &str = "wiser_button_panel_event";

/// Payload of [`WISER_EVENT`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiserEvent {
    pub entity_id: EntityId,
    #[serde(rename = "type")]
    pub trigger_type: String,
}

impl EventData for WiserEvent {
    fn event_type() -> &'static str {
        WISER_EVENT
    }
}

/// Payload of [`WISER_BUTTON_PANEL_EVENT`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPanelEvent {
    pub entity_id: EntityId,
    pub button_number: u8,
    pub press_type: PressKind,
}

impl ButtonPanelEvent {
    pub fn new(entity_id: EntityId, button: ButtonTrigger) -> Self {
        Self {
            entity_id,
            button_number: button.button_number(),
            press_type: button.press_kind(),
        }
    }
}

impl EventData for ButtonPanelEvent {
    fn event_type() -> &'static str {
        WISER_BUTTON_PANEL_EVENT
    }
}

/// Listener schema for [`WISER_EVENT`]: `type` must be a capability token
pub fn wiser_event_schema(capabilities: &CapabilityTable) -> Value {
    json!({
        "type": "object",
        "required": ["entity_id", "type"],
        "properties": {
            "entity_id": {"type": "string"},
            "type": {"enum": capabilities.trigger_types()}
        }
    })
}

/// Listener schema for [`WISER_BUTTON_PANEL_EVENT`]
pub fn button_panel_event_schema() -> Value {
    json!({
        "type": "object",
        "required": ["entity_id", "button_number", "press_type"],
        "properties": {
            "entity_id": {"type": "string"},
            "button_number": {"type": "integer", "minimum": 1, "maximum": BUTTON_COUNT},
            "press_type": {"enum": [PressKind::Short.as_str(), PressKind::Long.as_str()]}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_panel_payload() {
        let button = ButtonTrigger::new(3, PressKind::Long).unwrap();
        let event = ButtonPanelEvent::new("sensor.hall_panel".parse().unwrap(), button);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"entity_id": "sensor.hall_panel", "button_number": 3, "press_type": "long"})
        );
    }

    #[test]
    fn test_wiser_event_payload() {
        let event: WiserEvent =
            serde_json::from_value(json!({"entity_id": "climate.lounge", "type": "boosted"}))
                .unwrap();
        assert_eq!(event.trigger_type, "boosted");
        assert_eq!(WiserEvent::event_type(), WISER_EVENT);
    }

    #[test]
    fn test_schema_lists_capability_tokens() {
        let schema = wiser_event_schema(&CapabilityTable::default());
        let tokens = schema["properties"]["type"]["enum"].as_array().unwrap();
        assert!(tokens.contains(&json!("started_heating")));
        assert!(!tokens.contains(&json!("button_1_pressed")));
    }
}
