use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("invalid client credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("grace period must be between 0 and 168 hours")]
    InvalidGracePeriod,
    #[error("malformed client id: {0}")]
    MalformedClientId(String),
    #[error(transparent)]
    Store(#[from] model_meter_store::StoreError),
}
