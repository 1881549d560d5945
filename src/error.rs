//! Error taxonomy for the plant care core.
//!
//! Only structural failures are errors. Malformed *content* inside an AI payload is
//! defaulted by the normalizer, and a missing record is a normal `None`.

/// Hard failures surfaced to callers unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    /// The AI response did not contain a parseable JSON object.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The storage medium could not be opened, read or written, or the stored
    /// collection could not be (de)serialized.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<lmdb::Error> for PlantError {
    fn from(err: lmdb::Error) -> Self {
        PlantError::Persistence(format!("LMDB error: {err}"))
    }
}

impl From<std::io::Error> for PlantError {
    fn from(err: std::io::Error) -> Self {
        PlantError::Persistence(format!("IO error: {err}"))
    }
}
