//! # Plant Care Core
//!
//! The offline core of a plant-care companion app, designed for FFI (Foreign
//! Function Interface) integration with Flutter. It turns the free-form text a
//! generative AI model returns for a plant photo into a strictly-typed analysis,
//! and keeps the user's saved plants in a local LMDB database.
//!
//! ## Features
//!
//! - **Defensive normalization**: missing, mistyped or out-of-range AI fields are
//!   defaulted or clamped instead of rejected
//! - **LMDB-based storage**: the whole collection lives in one transactional slot
//! - **Single-writer store**: read-modify-write cycles are serialized per store
//! - **Derived statistics**: health and watering counters recomputed on demand
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use plant_care_core::config::StoreConfig;
//! use plant_care_core::local_db_state::AppDbState;
//! use plant_care_core::plant_model::PlantDraft;
//! use plant_care_core::plant_store::PlantRecordStore;
//! use plant_care_core::record_normalizer::extract_and_normalize;
//!
//! let store = PlantRecordStore::new(AppDbState::init(StoreConfig::new("my_plants"))?);
//!
//! let raw = r#"Analysis: {"plantName": "Pothos", "healthScore": 92}"#;
//! if let Some(analysis) = extract_and_normalize(raw)?.into_analysis() {
//!     let saved = store.save(PlantDraft::new(analysis, "file:///photos/pothos.jpg"))?;
//!     println!("Saved {}", saved.id);
//! }
//!
//! println!("{:?}", store.stats()?);
//! # Ok::<(), plant_care_core::error::PlantError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Every function returning `*const c_char` returns a JSON-serialized
//! [`AppResponse`]; release it with [`free_c_string`].
//!
//! - [`create_store`] - Open the plant store for a database name
//! - [`normalize_ai_response`] - Extract and normalize a raw AI response
//! - [`save_plant`] - Save a new plant from a draft
//! - [`get_all_plants`] - Retrieve all plants, most recent first
//! - [`get_plant_by_id`] - Retrieve one plant
//! - [`update_plant`] - Merge partial fields into a plant
//! - [`delete_plant`] - Delete a plant (idempotent)
//! - [`mark_plant_watered`] - Record a watering now
//! - [`get_plant_stats`] - Aggregate health and watering statistics
//! - [`clear_all_plants`] - Remove every plant
//! - [`reset_store`] - Reset the database to a clean state
//! - [`close_store`] - Explicit connection cleanup
//! - [`destroy_store`] - Release the store handle

pub mod config;
pub mod error;
pub mod local_db_state;
pub mod plant_model;
pub mod plant_store;
pub mod record_normalizer;
pub mod response_extractor;
pub mod stats_aggregator;
pub mod storage_medium;
mod app_response;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::local_db_state::AppDbState;
use crate::plant_model::{PlantDraft, PlantUpdate};
use crate::plant_store::PlantRecordStore;

/// The store handle handed to FFI callers.
pub type LocalPlantStore = PlantRecordStore<AppDbState>;

/// Opens the plant store for the database `name`.
///
/// The database directory is `<name>.lmdb`, placed under `PLANT_CARE_DB_DIR`
/// when that environment variable is set.
///
/// # Returns
///
/// A pointer to the store, or a null pointer on failure. Release it with
/// [`destroy_store`].
///
/// # Errors
///
/// Returns null pointer if:
/// - Input name pointer is null
/// - Input string contains invalid UTF-8
/// - The LMDB environment cannot be opened
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut LocalPlantStore {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = StoreConfig::from_env(name_str);
    let db_path = config.db_path();

    match AppDbState::init(config) {
        Ok(state) => {
            info!("✅ Plant store opened at: {}", db_path.display());
            Box::into_raw(Box::new(PlantRecordStore::new(state)))
        }
        Err(e) => {
            warn!("❌ Failed to open plant store: {e}");
            warn!("Attempted path: {}", db_path.display());
            std::ptr::null_mut()
        }
    }
}

/// Extracts the JSON object from a raw AI response and normalizes it.
///
/// # Returns
///
/// `Ok` with a JSON [`plant_model::Classification`] (`"kind": "plant"` or
/// `"kind": "nonPlant"`), or `MalformedResponse` if the text holds no parseable
/// JSON object.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{free_c_string, normalize_ai_response};
///
/// let raw = CString::new(r#"{"isPlant": false, "objectName": "Mug"}"#).unwrap();
/// let result = normalize_ai_response(raw.as_ptr());
/// free_c_string(result as *mut _);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn normalize_ai_response(raw_ptr: *const c_char) -> *const c_char {
    let raw = match c_ptr_to_string(raw_ptr, "response") {
        Ok(raw) => raw,
        Err(err) => return err,
    };

    match record_normalizer::extract_and_normalize(&raw) {
        Ok(classification) => json_response(&classification),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Saves a new plant.
///
/// # JSON Format
///
/// A normalized analysis with the image reference and optional user fields:
/// ```json
/// {
///   "plantName": "Monstera deliciosa",
///   "commonName": "Swiss cheese plant",
///   "confidence": 91,
///   "healthScore": 84,
///   "imageUri": "file:///photos/monstera.jpg",
///   "customName": "Monty"
/// }
/// ```
/// Absent analysis fields take their defaults, and scores outside `[1, 100]`,
/// fractional or given as numeric strings are coerced and clamped. `id` and
/// `dateAdded` are assigned by the store.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `json_ptr` - Null-terminated C string containing the draft JSON
///
/// # Returns
///
/// `Ok` with the created record, `SerializationError` if the JSON cannot be
/// parsed, or `PersistenceError` if the collection cannot be written.
///
/// # Safety
///
/// Both parameters must be valid pointers. The JSON string must be valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{create_store, free_c_string, save_plant};
///
/// let name = CString::new("my_plants").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let draft = CString::new(r#"{"plantName":"Pothos","imageUri":"file:///pothos.jpg"}"#).unwrap();
/// let result = save_plant(store, draft.as_ptr());
/// free_c_string(result as *mut _);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_plant(state: *mut LocalPlantStore, json_ptr: *const c_char) -> *const c_char {
    let store = match store_ref(state, "save_plant") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let draft: PlantDraft = match serde_json::from_str(&json_str) {
        Ok(draft) => draft,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid plant JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match store.save(draft) {
        Ok(plant) => json_response(&plant),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Retrieves every saved plant, most recent first.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
///
/// # Returns
///
/// `Ok` with a JSON array of records (empty on first use), or
/// `PersistenceError` if the collection cannot be read.
///
/// # Safety
///
/// The state parameter must be a valid pointer to a [`LocalPlantStore`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{create_store, free_c_string, get_all_plants};
///
/// let name = CString::new("my_plants").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let all_plants = get_all_plants(store);
/// free_c_string(all_plants as *mut _);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_all_plants(state: *mut LocalPlantStore) -> *const c_char {
    let store = match store_ref(state, "get_all_plants") {
        Ok(store) => store,
        Err(err) => return err,
    };

    match store.get_all() {
        Ok(plants) => json_response(&plants),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Retrieves one plant by id.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `id` - Null-terminated C string containing the plant id
///
/// # Returns
///
/// `Ok` with the record, `NotFound` if no plant has that id, or
/// `PersistenceError` if the collection cannot be read.
///
/// # Safety
///
/// Both parameters must be valid pointers. The id string must be valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{create_store, get_plant_by_id};
///
/// let name = CString::new("my_plants").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let id = CString::new("0190a5c4-7b1e-7c3a-9f10-2d4e5f6a7b8c").unwrap();
/// let result = get_plant_by_id(store, id.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_plant_by_id(state: *mut LocalPlantStore, id: *const c_char) -> *const c_char {
    let store = match store_ref(state, "get_plant_by_id") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match store.get_by_id(&id_str) {
        Ok(Some(plant)) => json_response(&plant),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No plant found with id: {id_str}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Merges partial fields into the plant with `id`.
///
/// Only the keys present in `json_ptr` are changed, for example
/// `{"notes": "Moved to the balcony"}`. Accepted keys: `customName`, `notes`,
/// `lastWatered`, `lastFertilized`, `imageUri`, `healthStatus`, `healthScore`.
/// `id` and `dateAdded` cannot be changed.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `id` - Null-terminated C string containing the plant id
/// * `json_ptr` - Null-terminated C string containing the partial JSON
///
/// # Returns
///
/// `Ok` with the updated record, `NotFound` if no plant has that id,
/// `SerializationError` for unparseable JSON, or `PersistenceError`.
///
/// # Safety
///
/// All parameters must be valid pointers to valid UTF-8 strings, except
/// `state`, which must point to a [`LocalPlantStore`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{create_store, update_plant};
///
/// let name = CString::new("my_plants").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let id = CString::new("0190a5c4-7b1e-7c3a-9f10-2d4e5f6a7b8c").unwrap();
/// let patch = CString::new(r#"{"customName":"Monty","healthScore":88}"#).unwrap();
/// let result = update_plant(store, id.as_ptr(), patch.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_plant(
    state: *mut LocalPlantStore,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_ref(state, "update_plant") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let patch: PlantUpdate = match serde_json::from_str(&json_str) {
        Ok(patch) => patch,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid update JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match store.update(&id_str, patch) {
        Ok(Some(plant)) => json_response(&plant),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No plant found with id: {id_str}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes the plant with `id`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `id` - Null-terminated C string containing the plant id
///
/// # Returns
///
/// `Ok` with a confirmation message, also when no plant has that id, or
/// `PersistenceError` if the collection cannot be read or written.
///
/// # Safety
///
/// Both parameters must be valid pointers. The id string must be valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use plant_care_core::{create_store, delete_plant};
///
/// let name = CString::new("my_plants").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let id = CString::new("0190a5c4-7b1e-7c3a-9f10-2d4e5f6a7b8c").unwrap();
/// let result = delete_plant(store, id.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_plant(state: *mut LocalPlantStore, id: *const c_char) -> *const c_char {
    let store = match store_ref(state, "delete_plant") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match store.delete(&id_str) {
        Ok(true) => response_to_c_string(&AppResponse::success("Plant deleted successfully")),
        Ok(false) => response_to_c_string(&AppResponse::success(format!(
            "No plant with id {id_str}, nothing to delete"
        ))),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Sets `lastWatered` of the plant with `id` to the current time.
///
/// # Returns
///
/// `Ok` with the updated record, or `NotFound` if no plant has that id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mark_plant_watered(state: *mut LocalPlantStore, id: *const c_char) -> *const c_char {
    let store = match store_ref(state, "mark_plant_watered") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match store.mark_watered(&id_str, Utc::now()) {
        Ok(Some(plant)) => json_response(&plant),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No plant found with id: {id_str}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Aggregate statistics over the current collection.
///
/// # Returns
///
/// `Ok` with `{totalPlants, healthyPlants, plantsNeedingCare,
/// plantsNeedingWater, averageHealthScore}`, or `PersistenceError`.
///
/// # Safety
///
/// The state parameter must be a valid pointer to a [`LocalPlantStore`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_plant_stats(state: *mut LocalPlantStore) -> *const c_char {
    let store = match store_ref(state, "get_plant_stats") {
        Ok(store) => store,
        Err(err) => return err,
    };

    match store.stats() {
        Ok(stats) => json_response(&stats),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Clears all plants from the store. The database remains operational.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_all_plants(state: *mut LocalPlantStore) -> *const c_char {
    let store = match store_ref(state, "clear_all_plants") {
        Ok(store) => store,
        Err(err) => return err,
    };

    match store.clear_all() {
        Ok(cleared) => response_to_c_string(&AppResponse::success(format!(
            "{cleared} plants cleared successfully"
        ))),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Resets the database to a clean state with a new name.
///
/// This operation:
/// 1. Closes the current database connection
/// 2. Removes the existing database directory
/// 3. Creates a new, empty database with the specified name
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_store(state: *mut LocalPlantStore, name_ptr: *const c_char) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to reset_store".to_string());
        return response_to_c_string(&error);
    }

    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(err) => return err,
    };

    let store = unsafe { &mut *state };

    match store.medium_mut().reset_database(&name) {
        Ok(_) => {
            info!("Plant store reset at: {}", store.medium().config().db_path().display());
            response_to_c_string(&AppResponse::success(format!(
                "Database '{name}' was reset successfully"
            )))
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Explicitly closes the database connection.
///
/// Useful before a Flutter hot restart, so the LMDB environment is flushed and
/// released before the next [`create_store`] on the same name. The handle must
/// still be released with [`destroy_store`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut LocalPlantStore) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let store = unsafe { &mut *state };

    match store.medium_mut().close_database() {
        Ok(_) => response_to_c_string(&AppResponse::success("Database connection closed successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Releases a store handle returned by [`create_store`]. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn destroy_store(state: *mut LocalPlantStore) {
    if state.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(state) });
}

/// Releases a string returned by any function of this library. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

fn store_ref<'a>(state: *mut LocalPlantStore, caller: &str) -> Result<&'a LocalPlantStore, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Serializes `value` into an `Ok` response.
fn json_response<T: Serialize>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Converts an [`AppResponse`] to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String, reporting null pointers and
/// invalid UTF-8 as a ready-made `BadRequest` response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
