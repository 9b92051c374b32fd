//! Event bus for the Wiser integration
//!
//! The bus carries raw device events from the hub to whoever is interested.
//! Two kinds of consumers are supported:
//!
//! - channel subscribers ([`EventBus::subscribe`], [`EventBus::subscribe_all`]) that
//!   receive every event of a type through a `tokio` broadcast receiver
//! - callback listeners ([`EventBus::listen`]) that are invoked synchronously, in
//!   fire order, for events whose data contains the listener's filter payload
//!
//! Listener requests are validated against a JSON schema registered for the event
//! type, so a malformed filter is rejected when the listener is created instead of
//! silently never matching.

mod filter;

pub use filter::matches_filter;

use dashmap::DashMap;
use jsonschema::JSONSchema;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use wiser_core::{Context, Event, EventData, EventType};

/// Default channel capacity for broadcast subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Errors raised while registering schemas or listeners
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventBusError {
    #[error("invalid schema for {event_type}: {message}")]
    InvalidSchema { event_type: String, message: String },

    #[error("invalid listener filter for {event_type}: {message}")]
    InvalidFilter { event_type: String, message: String },
}

pub type EventBusResult<T> = Result<T, EventBusError>;

/// Callback invoked for every matching event
pub type ListenerCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// A unique identifier for an event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct RegisteredListener {
    id: ListenerId,
    filter: serde_json::Value,
    callback: ListenerCallback,
    active: Arc<AtomicBool>,
}

/// The event bus
pub struct EventBus {
    senders: DashMap<EventType, broadcast::Sender<Event>>,
    match_all_sender: broadcast::Sender<Event>,
    listeners: DashMap<EventType, Vec<Arc<RegisteredListener>>>,
    schemas: DashMap<EventType, Arc<JSONSchema>>,
    next_listener_id: AtomicU64,
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose broadcast channels hold `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (match_all_sender, _) = broadcast::channel(capacity);
        Self {
            senders: DashMap::new(),
            match_all_sender,
            listeners: DashMap::new(),
            schemas: DashMap::new(),
            next_listener_id: AtomicU64::new(1),
            capacity,
        }
    }

    /// Subscribe to every event of one type through a broadcast receiver
    pub fn subscribe(&self, event_type: impl Into<EventType>) -> broadcast::Receiver<Event> {
        let event_type = event_type.into();
        trace!(event_type = %event_type, "Subscribing to event type");

        if event_type.is_match_all() {
            return self.match_all_sender.subscribe();
        }

        self.senders
            .entry(event_type)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscribe_all(&self) -> broadcast::Receiver<Event> {
        self.match_all_sender.subscribe()
    }

    /// Register the JSON schema that listener filters for `event_type` must satisfy
    ///
    /// Replaces any schema previously registered for the type.
    pub fn register_schema(
        &self,
        event_type: impl Into<EventType>,
        schema: &serde_json::Value,
    ) -> EventBusResult<()> {
        let event_type = event_type.into();
        let compiled = JSONSchema::compile(schema).map_err(|e| EventBusError::InvalidSchema {
            event_type: event_type.to_string(),
            message: e.to_string(),
        })?;

        debug!(event_type = %event_type, "Registered listener schema");
        self.schemas.insert(event_type, Arc::new(compiled));
        Ok(())
    }

    /// Validate a listener filter without registering anything
    pub fn validate_filter(
        &self,
        event_type: &EventType,
        filter: &serde_json::Value,
    ) -> EventBusResult<()> {
        let invalid = |message: String| EventBusError::InvalidFilter {
            event_type: event_type.to_string(),
            message,
        };

        if event_type.as_str().is_empty() {
            return Err(invalid("event type cannot be empty".to_string()));
        }
        if !filter.is_object() {
            return Err(invalid(format!("filter must be an object, got {filter}")));
        }

        let Some(schema) = self.schemas.get(event_type).map(|s| Arc::clone(s.value())) else {
            return Ok(());
        };

        let result = schema.validate(filter).map_err(|errors| {
            invalid(errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; "))
        });
        result
    }

    /// Invoke `callback` for every event of `event_type` whose data contains `filter`
    ///
    /// The filter is checked against the schema registered for the type (if any)
    /// before the listener becomes active. The returned [`Listener`] detaches the
    /// callback when [`Listener::detach`] is called or when it is dropped.
    pub fn listen<F>(
        self: &Arc<Self>,
        event_type: impl Into<EventType>,
        filter: serde_json::Value,
        callback: F,
    ) -> EventBusResult<Listener>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        self.validate_filter(&event_type, &filter)?;

        let id = self.next_listener_id();
        let active = Arc::new(AtomicBool::new(true));

        debug!(event_type = %event_type, listener = id.0, "Attaching listener");
        self.listeners
            .entry(event_type.clone())
            .or_default()
            .push(Arc::new(RegisteredListener {
                id,
                filter,
                callback: Arc::new(callback),
                active: Arc::clone(&active),
            }));

        Ok(Listener {
            bus: Arc::downgrade(self),
            event_type,
            id,
            active,
        })
    }

    /// Fire an event to all subscribers and matching listeners
    pub fn fire(&self, event: Event) {
        debug!(event_type = %event.event_type, "Firing event");

        if let Some(sender) = self.senders.get(&event.event_type) {
            // no receivers is not an error
            let _ = sender.send(event.clone());
        }
        let _ = self.match_all_sender.send(event.clone());

        // snapshot so callbacks may attach or detach listeners while we iterate
        let targets: Vec<Arc<RegisteredListener>> = [event.event_type.clone(), EventType::match_all()]
            .iter()
            .filter_map(|t| self.listeners.get(t).map(|l| l.value().clone()))
            .flatten()
            .collect();

        for listener in targets {
            if !listener.active.load(Ordering::Acquire) {
                continue;
            }
            if matches_filter(&event.data, &listener.filter) {
                trace!(listener = listener.id.0, "Listener matched");
                (listener.callback)(&event);
            }
        }
    }

    /// Serialize a typed payload and fire it
    pub fn fire_typed<T: EventData + serde::Serialize>(
        &self,
        data: &T,
        context: Context,
    ) -> serde_json::Result<()> {
        self.fire(Event::from_data(data, context)?);
        Ok(())
    }

    pub fn next_listener_id(&self) -> ListenerId {
        ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of active callback listeners across all event types
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().map(|l| l.len()).sum()
    }

    fn remove_listener(&self, event_type: &EventType, id: ListenerId) {
        if let Some(mut listeners) = self.listeners.get_mut(event_type) {
            listeners.retain(|l| l.id != id);
        }
        self.listeners.remove_if(event_type, |_, l| l.is_empty());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Handle for a callback listener
///
/// Detaching is idempotent. Dropping the handle detaches the listener.
#[derive(Debug)]
pub struct Listener {
    bus: Weak<EventBus>,
    event_type: EventType,
    id: ListenerId,
    active: Arc<AtomicBool>,
}

impl Listener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop delivering events to this listener
    pub fn detach(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        debug!(event_type = %self.event_type, listener = self.id.0, "Detaching listener");
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_listener(&self.event_type, self.id);
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.detach();
    }
}
