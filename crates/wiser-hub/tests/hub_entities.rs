//! Hub entities registered in the entity registry and driving device triggers

use std::sync::{Arc, Mutex};

use wiser_device_trigger::{
    ButtonTrigger, DeviceTriggers, PressKind, TriggerData, BUTTON_TRIGGER_TYPES,
};
use wiser_event_bus::EventBus;
use wiser_hub::{
    register_all, setup_binary_sensors, setup_button_panels, ButtonPanelSensor,
    ButtonPanelState, ButtonPress, HubDevice, HubEntity, InMemoryHub, SmokeAlarmState,
};
use wiser_registries::EntityRegistry;

fn hub() -> InMemoryHub {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let hub = InMemoryHub::new("WiserHeat01");
    hub.upsert(HubDevice {
        smoke_alarm: Some(SmokeAlarmState::default()),
        ..HubDevice::new("3", "Landing Smoke")
    });
    hub.upsert(panel("5", "Hall Panel"));
    hub
}

fn panel(device_id: &str, name: &str) -> HubDevice {
    HubDevice {
        button_panel: Some(ButtonPanelState::default()),
        ..HubDevice::new(device_id, name)
    }
}

fn set_press(hub: &InMemoryHub, device_id: &str, button: u8, kind: PressKind, sequence: u64) {
    let press = ButtonPress {
        button: ButtonTrigger::new(button, kind).unwrap(),
        sequence,
    };
    assert!(hub.modify(device_id, |d| {
        d.button_panel = Some(ButtonPanelState {
            last_press: Some(press),
        })
    }));
}

type Fired = Arc<Mutex<Vec<TriggerData>>>;

/// Attach the listed `trigger_type` of `device_id`, recording what fires
fn attach_listed(
    triggers: &DeviceTriggers,
    device_id: &str,
    trigger_type: &str,
) -> (Fired, wiser_device_trigger::TriggerHandle) {
    let listed = triggers.list_triggers(device_id);
    let descriptor = listed
        .iter()
        .find(|t| t.trigger_type == trigger_type)
        .unwrap();

    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let handle = triggers
        .attach(descriptor, move |data: TriggerData| {
            sink.lock().unwrap().push(data)
        })
        .unwrap();
    (fired, handle)
}

#[test]
fn test_registered_entities_belong_to_their_devices() {
    let hub = hub();
    let registry = EntityRegistry::new();

    let mut binary_sensors = setup_binary_sensors(&hub).unwrap();
    let mut panels = setup_button_panels(&hub).unwrap();
    assert_eq!(register_all(&registry, &mut binary_sensors).unwrap(), 6);
    assert_eq!(register_all(&registry, &mut panels).unwrap(), 1);

    assert_eq!(registry.entries_for_device("3").len(), 6);
    let entry = registry
        .get("sensor.hall_panel_last_button_pressed")
        .unwrap();
    assert_eq!(entry.device_id.as_deref(), Some("5"));
    assert_eq!(entry.platform, "wiser");
    assert_eq!(entry.original_name.as_deref(), Some("Hall Panel Last Button Pressed"));

    // registering again finds the existing entries
    assert_eq!(register_all(&registry, &mut panels).unwrap(), 1);
    assert_eq!(registry.len(), 7);
}

#[test]
fn test_user_rename_survives_registration() {
    let hub = hub();
    let registry = Arc::new(EntityRegistry::new());
    let bus = Arc::new(EventBus::new());
    let triggers = DeviceTriggers::new(registry.clone(), bus.clone()).unwrap();

    let mut panels = setup_button_panels(&hub).unwrap();
    panels[0].register(&registry).unwrap();
    registry
        .update("sensor.hall_panel_last_button_pressed", |e| {
            e.entity_id = "sensor.front_panel".parse().unwrap()
        })
        .unwrap();

    // a reload builds the sensor from the device name again
    let mut panels = setup_button_panels(&hub).unwrap();
    let entry = panels[0].register(&registry).unwrap();
    assert_eq!(entry.entity_id.as_str(), "sensor.front_panel");
    assert_eq!(panels[0].entity_id().as_str(), "sensor.front_panel");

    let (fired, _handle) = attach_listed(&triggers, "5", "button_1_pressed");
    assert_eq!(
        triggers.list_triggers("5")[0].entity_id.as_str(),
        "sensor.front_panel"
    );

    set_press(&hub, "5", 1, PressKind::Short, 1);
    panels[0].refresh(&hub, &bus).unwrap();

    let fired = fired.lock().unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].variables["entity_id"], "sensor.front_panel");
}

#[test]
fn test_same_named_panels_keep_their_own_triggers() {
    let hub = InMemoryHub::new("WiserHeat01");
    hub.upsert(panel("6", "Panel"));
    hub.upsert(panel("5", "Panel"));
    let registry = Arc::new(EntityRegistry::new());
    let bus = Arc::new(EventBus::new());
    let triggers = DeviceTriggers::new(registry.clone(), bus.clone()).unwrap();

    let mut panels = setup_button_panels(&hub).unwrap();
    register_all(&registry, &mut panels).unwrap();

    let entity_ids: Vec<&str> = panels.iter().map(|p| p.entity_id().as_str()).collect();
    assert_eq!(
        entity_ids,
        vec!["sensor.panel_last_button_pressed", "sensor.panel_last_button_pressed_2"]
    );
    assert_eq!(triggers.list_triggers("5").len(), 8);
    assert_eq!(triggers.list_triggers("6").len(), 8);
    assert_eq!(
        registry
            .get("sensor.panel_last_button_pressed_2")
            .unwrap()
            .device_id
            .as_deref(),
        Some("5")
    );

    let (fired_5, _h5) = attach_listed(&triggers, "5", "button_4_pressed");
    let (fired_6, _h6) = attach_listed(&triggers, "6", "button_4_pressed");

    set_press(&hub, "5", 4, PressKind::Short, 1);
    let panel_5: &mut ButtonPanelSensor = panels
        .iter_mut()
        .find(|p| p.device_id() == "5")
        .unwrap();
    panel_5.refresh(&hub, &bus).unwrap();

    assert_eq!(fired_5.lock().unwrap().len(), 1);
    assert!(fired_6.lock().unwrap().is_empty());
}

#[test]
fn test_panel_press_reaches_attached_trigger() {
    let hub = hub();
    let registry = Arc::new(EntityRegistry::new());
    let bus = Arc::new(EventBus::new());
    let triggers = DeviceTriggers::new(registry.clone(), bus.clone()).unwrap();

    let mut panels = setup_button_panels(&hub).unwrap();
    register_all(&registry, &mut panels).unwrap();
    register_all(&registry, &mut setup_binary_sensors(&hub).unwrap()).unwrap();

    // binary sensors offer no triggers
    assert!(triggers.list_triggers("3").is_empty());

    let listed = triggers.list_triggers("5");
    assert_eq!(
        listed.iter().map(|t| t.trigger_type.as_str()).collect::<Vec<_>>(),
        BUTTON_TRIGGER_TYPES
    );

    let (fired, _handle) = attach_listed(&triggers, "5", "button_2_long_pressed");

    set_press(&hub, "5", 2, PressKind::Short, 1);
    panels[0].refresh(&hub, &bus).unwrap();
    set_press(&hub, "5", 2, PressKind::Long, 2);
    panels[0].refresh(&hub, &bus).unwrap();
    // no new press
    panels[0].refresh(&hub, &bus).unwrap();

    let fired = fired.lock().unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(
        fired[0].variables["entity_id"],
        "sensor.hall_panel_last_button_pressed"
    );
    assert_eq!(fired[0].variables["event"]["press_type"], "long");
}
