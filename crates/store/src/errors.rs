//! Store-level error type. Converted into `ApiError` at the API boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),
    #[error("schema bootstrap failed: {0}")]
    Schema(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("stored record failed to decode: {0}")]
    Decode(String),
    #[error("record not found")]
    NotFound,
}

impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}
