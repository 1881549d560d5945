use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::PlantError;

/// Envelope returned across the FFI boundary, serialized as
/// `{"<Variant>": "<message or JSON payload>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub enum AppResponse {
    PersistenceError(String),
    MalformedResponse(String),
    SerializationError(String),
    NotFound(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            AppResponse::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<PlantError> for AppResponse {
    fn from(err: PlantError) -> Self {
        match err {
            PlantError::MalformedResponse(msg) => AppResponse::MalformedResponse(msg),
            PlantError::Persistence(msg) => AppResponse::PersistenceError(msg),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }
}
