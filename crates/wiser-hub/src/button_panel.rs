//! Button panel "last button pressed" sensor
//!
//! The sensor's unique id carries [`BUTTON_PANEL_MARKER`], which is how the
//! trigger catalog recognises it and offers the eight button triggers. On
//! refresh, a press the sensor has not seen yet is fired on the event bus as a
//! [`ButtonPanelEvent`].

use tracing::{debug, error, info};
use wiser_core::{domains, Context, EntityId};
use wiser_device_trigger::{ButtonPanelEvent, ButtonTrigger, BUTTON_PANEL_MARKER};
use wiser_event_bus::EventBus;

use crate::binary_sensor::device_display_name;
use crate::entity::HubEntity;
use crate::error::HubResult;
use crate::hub::{slugify, ButtonPress, DeviceHub};

pub struct ButtonPanelSensor {
    hub_name: String,
    device_id: String,
    device_name: String,
    entity_id: EntityId,
    last_press: Option<ButtonPress>,
}

impl ButtonPanelSensor {
    /// Create the sensor
    ///
    /// A press already reported by the hub becomes the initial state and is not
    /// fired.
    pub fn new(hub: &dyn DeviceHub, device_id: &str) -> HubResult<Self> {
        let device = hub.device(device_id);
        if device.is_none() {
            error!(device_id, "No device found for button panel");
        }

        let device_name = device_display_name(device.as_ref(), device_id);
        let entity_id = EntityId::new(
            domains::SENSOR,
            &slugify(&format!("{device_name} Last Button Pressed")),
        )?;
        let last_press = device
            .and_then(|d| d.button_panel)
            .and_then(|panel| panel.last_press);

        info!(hub = hub.name(), %entity_id, "Button panel sensor initialised");
        Ok(Self {
            hub_name: hub.name().to_string(),
            device_id: device_id.to_string(),
            device_name,
            entity_id,
            last_press,
        })
    }

    /// Token of the last button pressed, e.g. `button_2_long_pressed`
    pub fn state(&self) -> Option<&'static str> {
        self.last_press.map(|press| press.button.encode())
    }

    /// Re-read the panel and fire an event for a new press
    ///
    /// Returns the button that was fired, if any. A device that has gone missing
    /// is skipped.
    pub fn refresh(
        &mut self,
        hub: &dyn DeviceHub,
        bus: &EventBus,
    ) -> HubResult<Option<ButtonTrigger>> {
        let Some(device) = hub.device(&self.device_id) else {
            debug!(device_id = %self.device_id, "Device missing, keeping last state");
            return Ok(None);
        };
        let Some(press) = device.button_panel.and_then(|panel| panel.last_press) else {
            return Ok(None);
        };
        if self.last_press.map(|last| last.sequence) == Some(press.sequence) {
            return Ok(None);
        }

        self.last_press = Some(press);
        debug!(
            entity_id = %self.entity_id,
            button = press.button.button_number(),
            press_type = press.button.press_kind().as_str(),
            "Button panel pressed"
        );
        bus.fire_typed(
            &ButtonPanelEvent::new(self.entity_id.clone(), press.button),
            Context::new(),
        )?;
        Ok(Some(press.button))
    }
}

impl HubEntity for ButtonPanelSensor {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }

    fn unique_id(&self) -> String {
        format!("{}-{}-{}", self.hub_name, BUTTON_PANEL_MARKER, self.device_id)
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn name(&self) -> String {
        format!("{} Last Button Pressed", self.device_name)
    }
}

/// Create a last-button sensor for every button panel on the hub
pub fn setup_button_panels(hub: &dyn DeviceHub) -> HubResult<Vec<ButtonPanelSensor>> {
    let mut sensors = Vec::new();
    for device_id in hub.device_ids() {
        match hub.device(&device_id) {
            Some(device) if device.button_panel.is_some() => {
                sensors.push(ButtonPanelSensor::new(hub, &device_id)?);
            }
            Some(_) => {}
            None => error!(%device_id, "No device found for ID"),
        }
    }
    info!(count = sensors.len(), "Set up button panel sensors");
    Ok(sensors)
}
