//! Binding trigger configurations to event bus listeners
//!
//! A button trigger listens for [`WISER_BUTTON_PANEL_EVENT`] filtered on the
//! entity, button number and press type. Every other trigger type listens for
//! [`WISER_EVENT`] filtered on the entity and the type; unknown types are left
//! for the bus schema to reject.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use wiser_core::{EntityId, Event};
use wiser_event_bus::{EventBus, Listener};

use crate::button::ButtonTrigger;
use crate::config::{TriggerDescriptor, DEVICE_PLATFORM};
use crate::error::TriggerResult;
use crate::events::{WISER_BUTTON_PANEL_EVENT, WISER_EVENT};

/// Data handed to the automation when a device trigger fires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerData {
    /// Always `device`
    pub platform: String,

    /// `event_type`, `event` (the payload), `entity_id` and `type`
    #[serde(flatten)]
    pub variables: HashMap<String, Value>,

    pub triggered_at: DateTime<Utc>,
}

impl TriggerData {
    fn from_event(trigger_type: &str, entity_id: &EntityId, event: &Event) -> Self {
        let variables = HashMap::from([
            ("event_type".to_string(), json!(event.event_type.as_str())),
            ("event".to_string(), event.data.clone()),
            ("entity_id".to_string(), json!(entity_id.as_str())),
            ("type".to_string(), json!(trigger_type)),
        ]);

        Self {
            platform: DEVICE_PLATFORM.to_string(),
            variables,
            triggered_at: Utc::now(),
        }
    }
}

/// The listener a trigger configuration resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    pub event_type: &'static str,
    pub filter: Value,
}

impl SubscriptionRequest {
    /// Build the listener request for a trigger on `entity_id`
    pub fn for_trigger(entity_id: &EntityId, trigger_type: &str) -> Self {
        match ButtonTrigger::decode(trigger_type) {
            Some(button) => Self {
                event_type: WISER_BUTTON_PANEL_EVENT,
                filter: json!({
                    "entity_id": entity_id.as_str(),
                    "button_number": button.button_number(),
                    "press_type": button.press_kind().as_str(),
                }),
            },
            None => Self {
                event_type: WISER_EVENT,
                filter: json!({
                    "entity_id": entity_id.as_str(),
                    "type": trigger_type,
                }),
            },
        }
    }
}

/// Handle for an attached trigger
///
/// Detaching is idempotent; dropping the handle also detaches.
#[derive(Debug)]
pub struct TriggerHandle {
    listener: Listener,
    request: SubscriptionRequest,
}

impl TriggerHandle {
    pub fn detach(&self) {
        self.listener.detach();
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_active()
    }

    /// The listener request this handle was created from
    pub fn request(&self) -> &SubscriptionRequest {
        &self.request
    }
}

/// Attaches trigger configurations to the event bus
pub struct TriggerBinder {
    bus: Arc<EventBus>,
}

impl TriggerBinder {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Start listening for the events behind `config`
    ///
    /// `action` is called once per matching event until the handle is detached.
    /// A request the bus schema rejects is returned as
    /// [`TriggerError::Subscription`](crate::TriggerError::Subscription).
    pub fn attach<F>(&self, config: &TriggerDescriptor, action: F) -> TriggerResult<TriggerHandle>
    where
        F: Fn(TriggerData) + Send + Sync + 'static,
    {
        let request = SubscriptionRequest::for_trigger(&config.entity_id, &config.trigger_type);
        debug!(
            entity_id = %config.entity_id,
            trigger_type = %config.trigger_type,
            event_type = request.event_type,
            "Attaching device trigger"
        );

        let entity_id = config.entity_id.clone();
        let trigger_type = config.trigger_type.clone();
        let listener = self.bus.listen(
            request.event_type,
            request.filter.clone(),
            move |event| action(TriggerData::from_event(&trigger_type, &entity_id, event)),
        )?;

        Ok(TriggerHandle { listener, request })
    }
}
