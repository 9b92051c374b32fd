//! Entity Registry
//!
//! Tracks registered entities with unique_id tracking and a device index that
//! keeps entities in registration order.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use wiser_core::{EntityId, EntityIdError};

/// Errors that can occur in the entity registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityRegistryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid entity_id: {0}")]
    InvalidEntityId(#[from] EntityIdError),
}

pub type EntityRegistryResult<T> = Result<T, EntityRegistryError>;

/// Reason an entity was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledBy {
    ConfigEntry,
    Device,
    Integration,
    User,
}

/// A registered entity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Internal ULID
    pub id: String,
    pub entity_id: EntityId,
    /// Platform-specific unique identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Parent device ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Integration that provides this entity
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl EntityEntry {
    pub fn new(entity_id: EntityId, platform: impl Into<String>, unique_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            entity_id,
            unique_id,
            device_id: None,
            platform: platform.into(),
            original_name: None,
            disabled_by: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Entity domain, e.g. `climate` for `climate.lounge`
    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

/// Entity Registry
///
/// Entries are stored as `Arc<EntityEntry>` so lookups hand out cheap clones.
pub struct EntityRegistry {
    /// Primary index: entity_id -> entry, in registration order
    by_entity_id: RwLock<IndexMap<String, Arc<EntityEntry>>>,

    /// Index: unique_id -> entity_id
    by_unique_id: DashMap<String, String>,

    /// Index: device_id -> entity_ids in registration order
    by_device_id: DashMap<String, IndexSet<String>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            by_entity_id: RwLock::new(IndexMap::new()),
            by_unique_id: DashMap::new(),
            by_device_id: DashMap::new(),
        }
    }

    /// Build a registry from previously stored entries, keeping their order
    pub fn from_entries(entries: impl IntoIterator<Item = EntityEntry>) -> Self {
        let registry = Self::new();
        for entry in entries {
            registry.index_entry(Arc::new(entry));
        }
        info!("Loaded {} entities", registry.len());
        registry
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let entity_id = entry.entity_id.to_string();

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id.insert(unique_id.clone(), entity_id.clone());
        }

        if let Some(ref device_id) = entry.device_id {
            self.by_device_id
                .entry(device_id.clone())
                .or_default()
                .insert(entity_id.clone());
        }

        if let Ok(mut idx) = self.by_entity_id.write() {
            idx.insert(entity_id, entry);
        }
    }

    /// Remove an entry from the secondary indexes
    fn unindex_entry(&self, entry: &EntityEntry) {
        let entity_id = entry.entity_id.as_str();

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id.remove(unique_id);
        }

        if let Some(ref device_id) = entry.device_id {
            if let Some(mut ids) = self.by_device_id.get_mut(device_id) {
                ids.shift_remove(entity_id);
            }
            self.by_device_id.remove_if(device_id, |_, ids| ids.is_empty());
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .ok()
            .and_then(|idx| idx.get(entity_id).cloned())
    }

    pub fn get_by_unique_id(&self, unique_id: &str) -> Option<Arc<EntityEntry>> {
        let entity_id = self.by_unique_id.get(unique_id)?.value().clone();
        self.get(&entity_id)
    }

    /// Enabled entities of a device, in registration order
    pub fn entries_for_device(&self, device_id: &str) -> Vec<Arc<EntityEntry>> {
        self.entries_for_device_with_disabled(device_id, false)
    }

    /// Entities of a device, optionally including disabled ones
    pub fn entries_for_device_with_disabled(
        &self,
        device_id: &str,
        include_disabled: bool,
    ) -> Vec<Arc<EntityEntry>> {
        let Some(ids) = self.by_device_id.get(device_id).map(|ids| ids.value().clone()) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| self.get(id))
            .filter(|entry| include_disabled || !entry.is_disabled())
            .collect()
    }

    /// Register an entity, or return the existing entry
    ///
    /// An existing entry is found by unique_id first. Without a unique_id it is
    /// found by entity_id; with one, a taken entity_id gets a `_2`, `_3`, ...
    /// suffix so two devices never share an entry.
    pub fn get_or_create(
        &self,
        platform: &str,
        entity_id: &str,
        unique_id: Option<&str>,
        device_id: Option<&str>,
    ) -> EntityRegistryResult<Arc<EntityEntry>> {
        if let Some(existing) = unique_id.and_then(|uid| self.get_by_unique_id(uid)) {
            debug!("Found existing entity by unique_id: {}", existing.entity_id);
            return Ok(existing);
        }

        let mut entity_id: EntityId = entity_id.parse()?;
        if let Some(existing) = self.get(entity_id.as_str()) {
            if unique_id.is_none() {
                return Ok(existing);
            }
            // taken by another entity: pick the next free suffix
            entity_id = self.free_entity_id(&entity_id)?;
        }

        let mut entry = EntityEntry::new(entity_id, platform, unique_id.map(String::from));
        entry.device_id = device_id.map(String::from);

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));

        info!("Registered new entity: {}", entry.entity_id);
        Ok(entry)
    }

    /// First of `{object_id}_2`, `{object_id}_3`, ... that is not registered
    fn free_entity_id(&self, taken: &EntityId) -> EntityRegistryResult<EntityId> {
        let mut suffix = 2;
        loop {
            let candidate =
                EntityId::new(taken.domain(), &format!("{}_{suffix}", taken.object_id()))?;
            if self.get(candidate.as_str()).is_none() {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    /// Apply `f` to a copy of an entry and store the result
    pub fn update<F>(&self, entity_id: &str, f: F) -> EntityRegistryResult<Arc<EntityEntry>>
    where
        F: FnOnce(&mut EntityEntry),
    {
        let old = self
            .get(entity_id)
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;

        let mut entry = (*old).clone();
        f(&mut entry);
        entry.modified_at = Utc::now();

        let renamed = entry.entity_id != old.entity_id;
        if renamed || entry.unique_id != old.unique_id || entry.device_id != old.device_id {
            self.unindex_entry(&old);
        }
        // renamed entries move to the end of the primary index
        if renamed {
            if let Ok(mut idx) = self.by_entity_id.write() {
                idx.shift_remove(entity_id);
            }
        }

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    pub fn remove(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        let entry = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut idx| idx.shift_remove(entity_id))?;

        self.unindex_entry(&entry);
        info!("Removed entity: {}", entity_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_entity_id.read().map(|idx| idx.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries in registration order
    pub fn iter(&self) -> Vec<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .map(|idx| idx.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
