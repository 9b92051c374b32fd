//! Hub-backed entities for Wiser devices
//!
//! Reads device snapshots through a [`DeviceHub`] and turns them into entities:
//! binary sensors for alarm, equipment, light and shutter flags, and the button
//! panel "last button pressed" sensor that feeds the device triggers.
//!
//! ```text
//! DeviceHub ──► setup_binary_sensors / setup_button_panels ──► HubEntity::register ──► EntityRegistry
//!                                       │
//!                                       └── ButtonPanelSensor::refresh ──► wiser_button_panel_event
//! ```

pub mod binary_sensor;
pub mod button_panel;
pub mod entity;
mod error;
pub mod hub;

pub use binary_sensor::{
    setup_binary_sensors, BinarySensor, BinarySensorDeviceClass, BinarySensorKind,
};
pub use button_panel::{setup_button_panels, ButtonPanelSensor};
pub use entity::{register_all, DeviceInfo, HubEntity, MANUFACTURER};
pub use error::{HubError, HubResult};
pub use hub::{
    ButtonPanelState, ButtonPress, DeviceHub, DeviceLookup, EquipmentState, HubDevice,
    InMemoryHub, LightState, ShutterState, SmokeAlarmSettings, SmokeAlarmState,
};
