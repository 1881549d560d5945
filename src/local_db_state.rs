//! LMDB-backed storage medium.
//!
//! [`AppDbState`] owns one LMDB environment with a single named database and
//! keeps the whole plant collection under one key. Writes are committed in a
//! read-write transaction, so the slot is always either the old or the new blob.

use std::fs;
use std::path::PathBuf;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::PlantError;
use crate::storage_medium::StorageMedium;

const DATABASE_NAME: &str = "plants";
const MAX_DBS: u32 = 4;

struct OpenEnv {
    env: Environment,
    db: Database,
}

/// Connection state for one on-disk plant database.
pub struct AppDbState {
    open: Option<OpenEnv>,
    config: StoreConfig,
}

impl AppDbState {
    /// Opens (creating if needed) the LMDB environment described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::Persistence`] if the directory cannot be created or
    /// LMDB refuses to open the environment.
    pub fn init(config: StoreConfig) -> Result<Self, PlantError> {
        let open = Self::open_environment(&config)?;
        Ok(Self {
            open: Some(open),
            config,
        })
    }

    fn open_environment(config: &StoreConfig) -> Result<OpenEnv, PlantError> {
        let path = config.db_path();
        fs::create_dir_all(&path)?;

        info!("Opening LMDB environment at: {}", path.display());

        let env = Environment::new()
            .set_max_dbs(MAX_DBS)
            .set_map_size(config.map_size)
            .open(&path)?;
        let db = env.create_db(Some(DATABASE_NAME), DatabaseFlags::empty())?;

        Ok(OpenEnv { env, db })
    }

    fn open_env(&self) -> Result<&OpenEnv, PlantError> {
        self.open
            .as_ref()
            .ok_or_else(|| PlantError::Persistence("Database is closed".to_string()))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> PathBuf {
        self.config.db_path()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Flushes and closes the environment. Later reads and writes fail with
    /// [`PlantError::Persistence`] until the database is reset.
    pub fn close_database(&mut self) -> Result<(), PlantError> {
        match self.open.take() {
            Some(open) => {
                open.env.sync(true)?;
                info!("Closed LMDB environment at: {}", self.path().display());
            }
            None => debug!("close_database called on an already closed environment"),
        }
        Ok(())
    }

    /// Closes the current environment, deletes its files and opens a fresh empty
    /// database named `name` in the same directory.
    pub fn reset_database(&mut self, name: &str) -> Result<(), PlantError> {
        self.close_database()?;

        let old_path = self.path();
        if old_path.exists() {
            fs::remove_dir_all(&old_path)?;
            info!("Removed database directory: {}", old_path.display());
        }

        self.config.name = name.to_string();
        let new_path = self.path();
        if new_path.exists() {
            warn!("Reset target already exists, removing: {}", new_path.display());
            fs::remove_dir_all(&new_path)?;
        }

        self.open = Some(Self::open_environment(&self.config)?);
        Ok(())
    }
}

impl StorageMedium for AppDbState {
    fn read(&self) -> Result<Option<Vec<u8>>, PlantError> {
        let open = self.open_env()?;
        let txn = open.env.begin_ro_txn()?;

        let result = match txn.get(open.db, &self.config.collection_key) {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(PlantError::from(e)),
        };

        txn.commit()?;
        result
    }

    fn write(&self, bytes: &[u8]) -> Result<(), PlantError> {
        let open = self.open_env()?;
        let mut txn = open.env.begin_rw_txn()?;
        txn.put(open.db, &self.config.collection_key, &bytes, WriteFlags::empty())?;
        txn.commit()?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.config.collection_key);
        Ok(())
    }
}
