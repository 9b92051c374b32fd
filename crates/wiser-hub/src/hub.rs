//! Hub device snapshots and the lookup trait entities read them through

use std::sync::RwLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wiser_device_trigger::ButtonTrigger;

/// Smoke alarm flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeAlarmState {
    pub smoke_alarm: bool,
    pub heat_alarm: bool,
    pub tamper_alarm: bool,
    pub fault_warning: bool,
    pub remote_alarm: bool,
    pub battery_defect: bool,
}

/// Smoke alarm configuration reported next to the alarm flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeAlarmSettings {
    pub led_brightness: u8,
    pub alarm_sound_mode: String,
    pub alarm_sound_level: String,
    /// Remaining life in days
    pub life_time: u32,
    /// Seconds an alarm stays hushed
    pub hush_duration: u32,
}

/// Flags of a device driving controllable equipment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentState {
    pub controllable: bool,
    pub pcm_mode: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub is_dimmable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutterState {
    pub is_tilt_supported: bool,
    pub is_open: bool,
    pub is_closed: bool,
}

/// Last press reported by a button panel
///
/// `sequence` increases with every press, so two identical presses in a row are
/// still told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress {
    pub button: ButtonTrigger,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonPanelState {
    pub last_press: Option<ButtonPress>,
}

/// Snapshot of one hub device
///
/// The optional blocks say what kind of hardware this is; a device may carry
/// more than one (a light with equipment, for example).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HubDevice {
    pub id: String,
    pub name: String,
    pub product_type: String,
    pub firmware_version: String,
    pub smoke_alarm: Option<SmokeAlarmState>,
    pub smoke_alarm_settings: Option<SmokeAlarmSettings>,
    pub equipment: Option<EquipmentState>,
    pub light: Option<LightState>,
    pub shutter: Option<ShutterState>,
    pub button_panel: Option<ButtonPanelState>,
    /// State of a plain binary sensor (contact, motion, ...)
    pub active: Option<bool>,
}

impl HubDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// What the hub returns for a device id
///
/// Multi-contact devices report one entry per contact under the same id.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceLookup {
    Single(HubDevice),
    Contacts(Vec<HubDevice>),
}

impl DeviceLookup {
    /// Collapse to one device: the first contact of a multi-contact device
    pub fn into_device(self) -> Option<HubDevice> {
        match self {
            DeviceLookup::Single(device) => Some(device),
            DeviceLookup::Contacts(contacts) => contacts.into_iter().next(),
        }
    }
}

/// Read access to the devices of one hub
pub trait DeviceHub: Send + Sync {
    /// Hub name, used as the prefix of entity unique ids
    fn name(&self) -> &str;

    /// Ids of every device on the hub, in hub order
    fn device_ids(&self) -> Vec<String>;

    fn lookup(&self, device_id: &str) -> Option<DeviceLookup>;

    /// Current snapshot of a device
    ///
    /// `None` when the hub no longer knows the device, or a multi-contact device
    /// reports no contacts.
    fn device(&self, device_id: &str) -> Option<HubDevice> {
        self.lookup(device_id).and_then(DeviceLookup::into_device)
    }
}

/// Hub backed by an in-memory device table
///
/// Updated by whatever polls the physical hub; entities read it on refresh.
pub struct InMemoryHub {
    name: String,
    devices: RwLock<IndexMap<String, DeviceLookup>>,
}

impl InMemoryHub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: RwLock::new(IndexMap::new()),
        }
    }

    /// Insert or replace a device
    pub fn upsert(&self, device: HubDevice) {
        if let Ok(mut devices) = self.devices.write() {
            devices.insert(device.id.clone(), DeviceLookup::Single(device));
        }
    }

    /// Insert or replace a multi-contact device
    pub fn upsert_contacts(&self, device_id: impl Into<String>, contacts: Vec<HubDevice>) {
        if let Ok(mut devices) = self.devices.write() {
            devices.insert(device_id.into(), DeviceLookup::Contacts(contacts));
        }
    }

    pub fn remove(&self, device_id: &str) -> Option<DeviceLookup> {
        self.devices
            .write()
            .ok()
            .and_then(|mut devices| devices.shift_remove(device_id))
    }

    /// Apply `f` to a stored single device
    pub fn modify<F>(&self, device_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut HubDevice),
    {
        let Ok(mut devices) = self.devices.write() else {
            return false;
        };
        match devices.get_mut(device_id) {
            Some(DeviceLookup::Single(device)) => {
                f(device);
                true
            }
            _ => false,
        }
    }
}

impl DeviceHub for InMemoryHub {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_ids(&self) -> Vec<String> {
        self.devices
            .read()
            .map(|devices| devices.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lookup(&self, device_id: &str) -> Option<DeviceLookup> {
        self.devices
            .read()
            .ok()
            .and_then(|devices| devices.get(device_id).cloned())
    }
}

/// Lowercase a display name into an entity object id
///
/// Runs of anything but ASCII letters and digits become a single underscore.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
