//! The error taxonomy (spec.md §7). Surface labels, not Rust type names.

use serde::Serialize;
use thiserror::Error;

/// The wire-stable error label. `Display` renders the exact taxonomy string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidRequest,
    InvalidConfig,
    Conflict,
    QuotaExceeded,
    RateLimited,
    InternalError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::InvalidRequest | ErrorCode::InvalidConfig | ErrorCode::Conflict => 400,
            ErrorCode::QuotaExceeded | ErrorCode::RateLimited => 429,
            ErrorCode::InternalError => 500,
            ErrorCode::ServiceUnavailable => 503,
        }
    }
}

/// The single error type crossing the API boundary. Internal crates keep
/// their own narrow error enums and are converted into this one at the
/// edge (spec.md §7 "Propagation policy").
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Taxonomy {
        code: ErrorCode,
        message: String,
        details: serde_json::Value,
    },
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Taxonomy {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Taxonomy {
            code,
            message: message.into(),
            details,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Taxonomy { code, .. } => *code,
        }
    }

    pub fn details(&self) -> &serde_json::Value {
        match self {
            ApiError::Taxonomy { details, .. } => details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}
