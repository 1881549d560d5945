//! Configuration for the LMDB-backed plant store.

use std::path::PathBuf;

use log::warn;

/// Default LMDB map size: 16 MiB, far above what a personal plant collection needs.
pub const DEFAULT_MAP_SIZE: usize = 16 * 1024 * 1024;

/// Logical key the whole collection is stored under.
pub const DEFAULT_COLLECTION_KEY: &str = "saved_plants";

/// Environment variable overriding the directory databases are created in.
pub const DB_DIR_ENV: &str = "PLANT_CARE_DB_DIR";

/// Environment variable overriding the LMDB map size, in bytes.
pub const MAP_SIZE_ENV: &str = "PLANT_CARE_MAP_SIZE";

/// Where and how a store's LMDB environment is opened.
///
/// The database lives in `<directory>/<name>.lmdb`. When no directory is set the
/// path is relative to the process working directory, which is what the Flutter
/// host expects when it passes an absolute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub name: String,
    pub directory: Option<PathBuf>,
    pub map_size: usize,
    pub collection_key: String,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: None,
            map_size: DEFAULT_MAP_SIZE,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
        }
    }

    /// Builds a config for `name`, applying `PLANT_CARE_DB_DIR` and
    /// `PLANT_CARE_MAP_SIZE` when they are set. An unparseable map size falls back
    /// to the default.
    pub fn from_env(name: impl Into<String>) -> Self {
        let mut config = Self::new(name);

        if let Ok(dir) = std::env::var(DB_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.directory = Some(PathBuf::from(dir));
            }
        }

        if let Ok(raw) = std::env::var(MAP_SIZE_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.map_size = size,
                _ => warn!("Ignoring invalid {MAP_SIZE_ENV} value: {raw}"),
            }
        }

        config
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    /// Directory holding the LMDB data and lock files.
    pub fn db_path(&self) -> PathBuf {
        let dir_name = format!("{}.lmdb", self.name);
        match &self.directory {
            Some(directory) => directory.join(dir_name),
            None => PathBuf::from(dir_name),
        }
    }
}
