//! Durable collection of saved plants over a [`StorageMedium`].
//!
//! Every mutation reads the whole collection, applies the change and writes the
//! whole collection back. That cycle runs under a single writer lock per store,
//! so two mutations through the same store can never lose each other's update.
//! Reads are served from a cached copy refreshed after every successful write.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::PlantError;
use crate::plant_model::{PlantDraft, PlantStats, PlantUpdate, SavedPlant};
use crate::record_normalizer::sanitize_analysis;
use crate::stats_aggregator::StatsAggregator;
use crate::storage_medium::StorageMedium;

/// The plant collection of one device session, most recent first.
///
/// # Examples
///
/// ```rust
/// use plant_care_core::plant_model::{AnalysisResult, PlantDraft, PlantUpdate};
/// use plant_care_core::plant_store::PlantRecordStore;
/// use plant_care_core::storage_medium::MemoryMedium;
///
/// let store = PlantRecordStore::new(MemoryMedium::new());
/// let saved = store.save(PlantDraft::new(AnalysisResult::default(), "file:///fern.jpg"))?;
///
/// let patch = PlantUpdate { notes: Some("Repotted".to_string()), ..Default::default() };
/// let updated = store.update(&saved.id, patch)?.expect("plant exists");
/// assert_eq!(updated.notes.as_deref(), Some("Repotted"));
///
/// store.delete(&saved.id)?;
/// assert!(store.get_by_id(&saved.id)?.is_none());
/// # Ok::<(), plant_care_core::error::PlantError>(())
/// ```
pub struct PlantRecordStore<M: StorageMedium> {
    medium: M,
    writer: Mutex<()>,
    cache: RwLock<Option<Vec<SavedPlant>>>,
}

impl<M: StorageMedium> PlantRecordStore<M> {
    pub fn new(medium: M) -> Self {
        Self {
            medium,
            writer: Mutex::new(()),
            cache: RwLock::new(None),
        }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Mutable access to the medium, for lifecycle operations such as closing or
    /// resetting the database. The cached view is dropped.
    pub fn medium_mut(&mut self) -> &mut M {
        if let Ok(cache) = self.cache.get_mut() {
            *cache = None;
        }
        &mut self.medium
    }

    pub fn into_medium(self) -> M {
        self.medium
    }

    /// Creates a record from `draft`, assigning a fresh `id` and `dateAdded`.
    ///
    /// # Errors
    ///
    /// [`PlantError::Persistence`] if the collection cannot be read or written.
    pub fn save(&self, draft: PlantDraft) -> Result<SavedPlant, PlantError> {
        let _writer = self.lock_writer()?;
        let mut plants = self.load()?;

        let mut id = new_plant_id();
        while plants.iter().any(|plant| plant.id == id) {
            warn!("Generated plant id {id} collides with an existing record, drawing again");
            id = new_plant_id();
        }

        let mut plant = SavedPlant::from_draft(draft, id, Utc::now());
        sanitize_analysis(&mut plant.analysis);

        plants.insert(0, plant.clone());
        self.persist(plants)?;

        info!("Saved plant {} ({})", plant.id, plant.display_name());
        Ok(plant)
    }

    /// The full collection, most recent first. Empty on first use.
    pub fn get_all(&self) -> Result<Vec<SavedPlant>, PlantError> {
        {
            let cache = self.read_cache()?;
            if let Some(plants) = cache.as_ref() {
                return Ok(plants.clone());
            }
        }

        // Filling the cache takes the writer lock so a concurrent mutation cannot
        // be overwritten by an older snapshot.
        let _writer = self.lock_writer()?;
        let mut cache = self
            .cache
            .write()
            .map_err(|_| PlantError::Persistence("Store cache lock poisoned".to_string()))?;
        if let Some(plants) = cache.as_ref() {
            return Ok(plants.clone());
        }

        let plants = self.load()?;
        *cache = Some(plants.clone());
        Ok(plants)
    }

    /// The record with `id`, or `None` if there is none.
    pub fn get_by_id(&self, id: &str) -> Result<Option<SavedPlant>, PlantError> {
        {
            let cache = self.read_cache()?;
            if let Some(plants) = cache.as_ref() {
                return Ok(plants.iter().find(|plant| plant.id == id).cloned());
            }
        }

        Ok(self.get_all()?.into_iter().find(|plant| plant.id == id))
    }

    /// Merges the fields present in `patch` into the record with `id`.
    ///
    /// Returns `Ok(None)` without writing when no record has that id. An empty
    /// patch returns the record unchanged, also without writing.
    pub fn update(&self, id: &str, patch: PlantUpdate) -> Result<Option<SavedPlant>, PlantError> {
        let _writer = self.lock_writer()?;
        let mut plants = self.load()?;

        let Some(plant) = plants.iter_mut().find(|plant| plant.id == id) else {
            debug!("Update skipped, no plant with id {id}");
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(plant.clone()));
        }

        plant.apply(patch);
        let updated = plant.clone();

        self.persist(plants)?;
        info!("Updated plant {id}");
        Ok(Some(updated))
    }

    /// Records a watering at `at`.
    pub fn mark_watered(&self, id: &str, at: DateTime<Utc>) -> Result<Option<SavedPlant>, PlantError> {
        self.update(
            id,
            PlantUpdate {
                last_watered: Some(at),
                ..PlantUpdate::default()
            },
        )
    }

    /// Records a fertilizer application at `at`.
    pub fn mark_fertilized(&self, id: &str, at: DateTime<Utc>) -> Result<Option<SavedPlant>, PlantError> {
        self.update(
            id,
            PlantUpdate {
                last_fertilized: Some(at),
                ..PlantUpdate::default()
            },
        )
    }

    /// Removes the record with `id` if present. Deleting a missing id is a no-op
    /// that returns `Ok(false)`.
    pub fn delete(&self, id: &str) -> Result<bool, PlantError> {
        let _writer = self.lock_writer()?;
        let mut plants = self.load()?;

        let before = plants.len();
        plants.retain(|plant| plant.id != id);
        if plants.len() == before {
            debug!("Delete skipped, no plant with id {id}");
            return Ok(false);
        }

        self.persist(plants)?;
        info!("Deleted plant {id}");
        Ok(true)
    }

    /// Removes every record and returns how many there were.
    pub fn clear_all(&self) -> Result<usize, PlantError> {
        let _writer = self.lock_writer()?;
        let cleared = self.load()?.len();
        self.persist(Vec::new())?;
        info!("Cleared {cleared} plants");
        Ok(cleared)
    }

    /// Statistics over the current collection, recomputed on every call.
    pub fn stats(&self) -> Result<PlantStats, PlantError> {
        Ok(StatsAggregator::compute(&self.get_all()?))
    }

    /// Drops the cached view so the next read goes to the medium.
    pub fn reload(&self) -> Result<(), PlantError> {
        self.invalidate_cache()
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>, PlantError> {
        self.writer
            .lock()
            .map_err(|_| PlantError::Persistence("Store writer lock poisoned".to_string()))
    }

    fn read_cache(&self) -> Result<RwLockReadGuard<'_, Option<Vec<SavedPlant>>>, PlantError> {
        self.cache
            .read()
            .map_err(|_| PlantError::Persistence("Store cache lock poisoned".to_string()))
    }

    fn invalidate_cache(&self) -> Result<(), PlantError> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| PlantError::Persistence("Store cache lock poisoned".to_string()))?;
        *cache = None;
        Ok(())
    }

    /// Reads the collection from the medium. A missing or blank slot is empty.
    fn load(&self) -> Result<Vec<SavedPlant>, PlantError> {
        let bytes = match self.medium.read()? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => bytes,
            _ => return Ok(Vec::new()),
        };

        let stored: Vec<SavedPlant> = serde_json::from_slice(&bytes).map_err(|e| {
            PlantError::Persistence(format!("Stored plant collection is unreadable: {e}"))
        })?;

        let mut seen = HashSet::new();
        let mut plants = Vec::with_capacity(stored.len());
        for mut plant in stored {
            if !seen.insert(plant.id.clone()) {
                warn!("Dropping duplicate stored plant id {}", plant.id);
                continue;
            }
            sanitize_analysis(&mut plant.analysis);
            plants.push(plant);
        }

        debug!("Loaded {} plants from storage", plants.len());
        Ok(plants)
    }

    /// Writes the collection and refreshes the cache. On failure the cache is
    /// dropped, since the medium's state is then unknown.
    fn persist(&self, plants: Vec<SavedPlant>) -> Result<(), PlantError> {
        let bytes = serde_json::to_vec(&plants).map_err(|e| {
            PlantError::Persistence(format!("Failed to serialize plant collection: {e}"))
        })?;

        if let Err(e) = self.medium.write(&bytes) {
            warn!("Failed to persist plant collection: {e}");
            self.invalidate_cache()?;
            return Err(e);
        }

        let mut cache = self
            .cache
            .write()
            .map_err(|_| PlantError::Persistence("Store cache lock poisoned".to_string()))?;
        *cache = Some(plants);
        Ok(())
    }
}

/// UUIDv7: a millisecond timestamp followed by random bits, so ids stay unique
/// even when several plants are saved within the same millisecond.
fn new_plant_id() -> String {
    Uuid::now_v7().to_string()
}
