//! Binary sensors read from hub device flags
//!
//! Each [`BinarySensorKind`] names one boolean on a [`HubDevice`] and reads it
//! through a typed accessor, so a kind can only ever point at a real field.
//!
//! | hardware      | kinds                                                          |
//! |---------------|----------------------------------------------------------------|
//! | smoke alarm   | smoke, heat, tamper, fault warning, remote alarm, battery defect |
//! | equipment     | controllable, pcm mode                                         |
//! | light         | is dimmable                                                    |
//! | shutter       | is tilt supported, is open, is closed                          |
//! | binary sensor | active                                                         |

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use wiser_core::{domains, EntityId};

use crate::entity::{DeviceInfo, HubEntity};
use crate::error::HubResult;
use crate::hub::{slugify, DeviceHub, HubDevice, SmokeAlarmSettings};

/// Device class shown by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Smoke,
    Heat,
    Tamper,
    Problem,
    Opening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarySensorKind {
    SmokeAlarm,
    HeatAlarm,
    TamperAlarm,
    FaultWarning,
    RemoteAlarm,
    BatteryDefect,
    Controllable,
    PcmMode,
    IsDimmable,
    IsTiltSupported,
    IsOpen,
    IsClosed,
    Active,
}

pub const SMOKE_ALARM_KINDS: [BinarySensorKind; 6] = [
    BinarySensorKind::SmokeAlarm,
    BinarySensorKind::HeatAlarm,
    BinarySensorKind::TamperAlarm,
    BinarySensorKind::FaultWarning,
    BinarySensorKind::RemoteAlarm,
    BinarySensorKind::BatteryDefect,
];

pub const EQUIPMENT_KINDS: [BinarySensorKind; 2] =
    [BinarySensorKind::Controllable, BinarySensorKind::PcmMode];

pub const SHUTTER_KINDS: [BinarySensorKind; 3] = [
    BinarySensorKind::IsTiltSupported,
    BinarySensorKind::IsOpen,
    BinarySensorKind::IsClosed,
];

impl BinarySensorKind {
    /// Display suffix appended to the device name
    pub fn name(&self) -> &'static str {
        match self {
            Self::SmokeAlarm => "Smoke Alarm",
            Self::HeatAlarm => "Heat Alarm",
            Self::TamperAlarm => "Tamper Alarm",
            Self::FaultWarning => "Fault Warning",
            Self::RemoteAlarm => "Remote Alarm",
            Self::BatteryDefect => "Battery Defect",
            Self::Controllable => "Controllable",
            Self::PcmMode => "PCM Mode",
            Self::IsDimmable => "Is Dimmable",
            Self::IsTiltSupported => "Is Tilt Supported",
            Self::IsOpen => "Is Open",
            Self::IsClosed => "Is Closed",
            Self::Active => "Active",
        }
    }

    /// Key used in unique ids
    pub fn key(&self) -> &'static str {
        match self {
            Self::SmokeAlarm => "smoke_alarm",
            Self::HeatAlarm => "heat_alarm",
            Self::TamperAlarm => "tamper_alarm",
            Self::FaultWarning => "fault_warning",
            Self::RemoteAlarm => "remote_alarm",
            Self::BatteryDefect => "battery_defect",
            Self::Controllable => "controllable",
            Self::PcmMode => "pcm_mode",
            Self::IsDimmable => "is_dimmable",
            Self::IsTiltSupported => "is_tilt_supported",
            Self::IsOpen => "is_open",
            Self::IsClosed => "is_closed",
            Self::Active => "active",
        }
    }

    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        match self {
            Self::SmokeAlarm => Some(BinarySensorDeviceClass::Smoke),
            Self::HeatAlarm => Some(BinarySensorDeviceClass::Heat),
            Self::TamperAlarm => Some(BinarySensorDeviceClass::Tamper),
            Self::FaultWarning | Self::BatteryDefect => Some(BinarySensorDeviceClass::Problem),
            Self::IsOpen | Self::IsClosed => Some(BinarySensorDeviceClass::Opening),
            _ => None,
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::BatteryDefect => Some("mdi:battery-alert"),
            Self::IsDimmable => Some("mdi:lightbulb-on-40"),
            Self::IsClosed => Some("mdi:window-shutter"),
            _ => None,
        }
    }

    /// Accessor for the flag this kind reports
    ///
    /// The accessor yields `None` when the device lacks the hardware block.
    pub fn accessor(&self) -> fn(&HubDevice) -> Option<bool> {
        match self {
            Self::SmokeAlarm => |d| d.smoke_alarm.map(|s| s.smoke_alarm),
            Self::HeatAlarm => |d| d.smoke_alarm.map(|s| s.heat_alarm),
            Self::TamperAlarm => |d| d.smoke_alarm.map(|s| s.tamper_alarm),
            Self::FaultWarning => |d| d.smoke_alarm.map(|s| s.fault_warning),
            Self::RemoteAlarm => |d| d.smoke_alarm.map(|s| s.remote_alarm),
            Self::BatteryDefect => |d| d.smoke_alarm.map(|s| s.battery_defect),
            Self::Controllable => |d| d.equipment.map(|e| e.controllable),
            Self::PcmMode => |d| d.equipment.map(|e| e.pcm_mode),
            Self::IsDimmable => |d| d.light.map(|l| l.is_dimmable),
            Self::IsTiltSupported => |d| d.shutter.map(|s| s.is_tilt_supported),
            Self::IsOpen => |d| d.shutter.map(|s| s.is_open),
            Self::IsClosed => |d| d.shutter.map(|s| s.is_closed),
            Self::Active => |d| d.active,
        }
    }

    pub fn read(&self, device: &HubDevice) -> Option<bool> {
        (self.accessor())(device)
    }

    /// Every kind a device supports, grouped by hardware
    pub fn for_device(device: &HubDevice) -> Vec<BinarySensorKind> {
        let mut kinds = Vec::new();
        if device.smoke_alarm.is_some() {
            kinds.extend(SMOKE_ALARM_KINDS);
        }
        if device.equipment.is_some() {
            kinds.extend(EQUIPMENT_KINDS);
        }
        if device.light.is_some() {
            kinds.push(Self::IsDimmable);
        }
        if device.shutter.is_some() {
            kinds.extend(SHUTTER_KINDS);
        }
        if device.active.is_some() {
            kinds.push(Self::Active);
        }
        kinds
    }
}

/// One binary sensor entity
#[derive(Debug, Clone)]
pub struct BinarySensor {
    kind: BinarySensorKind,
    hub_name: String,
    device_id: String,
    device_name: String,
    entity_id: EntityId,
    is_on: Option<bool>,
    /// `(product_type, firmware_version)` of the last snapshot
    model: Option<(String, String)>,
    settings: Option<SmokeAlarmSettings>,
}

impl BinarySensor {
    /// Create the sensor and read its initial state
    ///
    /// A device the hub does not know is logged; the sensor is still created and
    /// stays unknown until the device shows up.
    pub fn new(hub: &dyn DeviceHub, device_id: &str, kind: BinarySensorKind) -> HubResult<Self> {
        let device = hub.device(device_id);
        if device.is_none() {
            error!(device_id, kind = kind.key(), "No device found for binary sensor");
        }

        let device_name = device_display_name(device.as_ref(), device_id);
        let entity_id = EntityId::new(
            domains::BINARY_SENSOR,
            &slugify(&format!("{device_name} {}", kind.name())),
        )?;

        let mut sensor = Self {
            kind,
            hub_name: hub.name().to_string(),
            device_id: device_id.to_string(),
            device_name,
            entity_id,
            is_on: None,
            model: None,
            settings: None,
        };
        if let Some(device) = device {
            sensor.apply(&device);
        }
        info!(hub = %sensor.hub_name, name = %sensor.name(), "Binary sensor initialised");
        Ok(sensor)
    }

    pub fn kind(&self) -> BinarySensorKind {
        self.kind
    }

    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        self.kind.device_class()
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.kind.icon()
    }

    /// Product type and firmware version of the device, once seen
    pub fn model(&self) -> Option<(&str, &str)> {
        self.model
            .as_ref()
            .map(|(product, firmware)| (product.as_str(), firmware.as_str()))
    }

    /// Device card data, once the device has been seen
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.model().map(|(product, firmware)| {
            DeviceInfo::new(
                &self.hub_name,
                &self.device_id,
                self.device_name.clone(),
                product,
                firmware,
            )
        })
    }

    /// Alarm configuration, exposed as attributes of the smoke sensor only
    pub fn smoke_alarm_settings(&self) -> Option<&SmokeAlarmSettings> {
        match self.kind {
            BinarySensorKind::SmokeAlarm => self.settings.as_ref(),
            _ => None,
        }
    }

    /// Re-read the state from the hub, returning whether it changed
    ///
    /// A device that has gone missing is skipped and the last state is kept.
    pub fn refresh(&mut self, hub: &dyn DeviceHub) -> bool {
        debug!(entity_id = %self.entity_id, "Device update requested");
        let Some(device) = hub.device(&self.device_id) else {
            debug!(device_id = %self.device_id, "Device missing, keeping last state");
            return false;
        };
        let before = self.is_on;
        self.apply(&device);
        before != self.is_on
    }

    fn apply(&mut self, device: &HubDevice) {
        self.is_on = self.kind.read(device);
        self.model = Some((device.product_type.clone(), device.firmware_version.clone()));
        self.settings = device.smoke_alarm_settings.clone();
    }
}

impl HubEntity for BinarySensor {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }

    fn unique_id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.hub_name,
            domains::BINARY_SENSOR,
            self.kind.key(),
            self.device_id
        )
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn name(&self) -> String {
        format!("{} {}", self.device_name, self.kind.name())
    }
}

/// Create the binary sensors for every device on the hub
///
/// Devices are visited in hub order; a device that vanishes between listing and
/// lookup is logged and skipped.
pub fn setup_binary_sensors(hub: &dyn DeviceHub) -> HubResult<Vec<BinarySensor>> {
    let mut sensors = Vec::new();
    for device_id in hub.device_ids() {
        let Some(device) = hub.device(&device_id) else {
            error!(%device_id, "No device found for ID");
            continue;
        };
        for kind in BinarySensorKind::for_device(&device) {
            sensors.push(BinarySensor::new(hub, &device_id, kind)?);
        }
    }
    info!(count = sensors.len(), "Set up binary sensors");
    Ok(sensors)
}

/// Name of a device, falling back to its id when the hub has no usable name
pub(crate) fn device_display_name(device: Option<&HubDevice>, device_id: &str) -> String {
    match device {
        Some(device) if !slugify(&device.name).is_empty() => device.name.clone(),
        _ => format!("Wiser {device_id}"),
    }
}
