//! The single-slot persistence abstraction the plant store writes through.

use std::sync::Mutex;

use crate::error::PlantError;

/// A single opaque blob under one fixed logical key.
///
/// The store reads and rewrites the whole collection through this slot; the
/// medium never interprets the bytes.
pub trait StorageMedium: Send + Sync {
    /// Returns the stored blob, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<Vec<u8>>, PlantError>;

    /// Replaces the stored blob.
    fn write(&self, bytes: &[u8]) -> Result<(), PlantError>;
}

/// In-process medium for tests and ephemeral sessions. Nothing survives a drop.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium pre-loaded with `bytes`, as if written by an earlier session.
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            slot: Mutex::new(Some(bytes.into())),
        }
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self) -> Result<Option<Vec<u8>>, PlantError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| PlantError::Persistence("Memory slot lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), PlantError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| PlantError::Persistence("Memory slot lock poisoned".to_string()))?;
        *slot = Some(bytes.to_vec());
        Ok(())
    }
}
