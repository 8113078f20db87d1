//! Maps every internal crate's narrow error type to the wire-level error
//! taxonomy (spec.md §7), behind one `{error, message, details, timestamp}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use model_meter_domain::{ApiError as DomainError, ErrorCode};
use serde::Serialize;
use serde_json::Value;

/// Wraps the domain error taxonomy so this crate can implement
/// `IntoResponse` for it (the orphan rule forbids implementing a foreign
/// trait for a foreign type).
pub struct ApiError(DomainError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    details: Value,
    timestamp: chrono::DateTime<Utc>,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        self.0.code()
    }

    pub fn message(&self) -> String {
        self.0.to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: error_label(self.0.code()),
            message: self.0.to_string(),
            details: self.0.details().clone(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

fn error_label(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Unauthorized => "unauthorized",
        ErrorCode::Forbidden => "forbidden",
        ErrorCode::NotFound => "not-found",
        ErrorCode::InvalidRequest => "invalid-request",
        ErrorCode::InvalidConfig => "invalid-config",
        ErrorCode::Conflict => "conflict",
        ErrorCode::QuotaExceeded => "quota-exceeded",
        ErrorCode::RateLimited => "rate-limited",
        ErrorCode::InternalError => "internal-error",
        ErrorCode::ServiceUnavailable => "service-unavailable",
    }
}

impl From<model_meter_security::SecurityError> for ApiError {
    fn from(err: model_meter_security::SecurityError) -> Self {
        use model_meter_security::SecurityError as E;
        let domain = match err {
            E::InvalidCredentials => DomainError::unauthorized("invalid client credentials"),
            E::Unauthorized(msg) => DomainError::unauthorized(msg),
            E::Forbidden(msg) => DomainError::forbidden(msg),
            E::InvalidGracePeriod => DomainError::invalid_request("grace_hours must be between 0 and 168"),
            E::MalformedClientId(id) => DomainError::unauthorized(format!("malformed client id: {id}")),
            E::Store(store_err) => DomainError::internal(store_err.to_string()),
        };
        ApiError(domain)
    }
}

impl From<model_meter_pricing::PricingError> for ApiError {
    fn from(err: model_meter_pricing::PricingError) -> Self {
        use model_meter_pricing::PricingError as E;
        let domain = match err {
            E::PricingMissing { model_id, date } => {
                DomainError::invalid_config(format!("no price available for {model_id} on {date}"))
            }
            E::UnknownLabel(label) => DomainError::invalid_request(format!("unknown label: {label}")),
            E::MissingCallingRegion => DomainError::invalid_request("calling_region is required for this label"),
            E::UnsupportedRegion(region) => DomainError::invalid_request(format!("unsupported region: {region}")),
            E::MalformedArn(arn) => DomainError::invalid_config(format!("malformed inference profile ARN: {arn}")),
            E::EmptyRegionMap => DomainError::invalid_config("inference profile region map must be non-empty"),
            E::Store(store_err) => DomainError::internal(store_err.to_string()),
        };
        ApiError(domain)
    }
}

impl From<model_meter_metering::MeteringError> for ApiError {
    fn from(err: model_meter_metering::MeteringError) -> Self {
        use model_meter_metering::MeteringError as E;
        let domain = match err {
            E::TimestampOutOfRange { submitted, now } => DomainError::invalid_request(format!(
                "timestamp {submitted} is outside the accepted window around {now}"
            )),
            E::Clock(clock_err) => DomainError::invalid_config(clock_err.to_string()),
            E::Pricing(pricing_err) => return ApiError::from(pricing_err),
            E::Store(store_err) => DomainError::internal(store_err.to_string()),
        };
        ApiError(domain)
    }
}

impl From<model_meter_selection::SelectionError> for ApiError {
    fn from(err: model_meter_selection::SelectionError) -> Self {
        use model_meter_selection::SelectionError as E;
        let domain = match err {
            E::QuotaExceeded { detail } => {
                let details = serde_json::json!({
                    "labels": detail.iter().map(|d| serde_json::json!({
                        "label": d.label,
                        "cost_micros": d.cost_micros,
                        "quota_micros": d.quota_micros,
                        "quota_pct": d.quota_pct,
                    })).collect::<Vec<_>>(),
                });
                DomainError::with_details(ErrorCode::QuotaExceeded, "no label is under quota", details)
            }
            E::NotFound => DomainError::not_found("no data for the requested date"),
            E::InvalidDate => DomainError::invalid_request("date is in the future or before the retention window"),
            E::Store(store_err) => DomainError::internal(store_err.to_string()),
            E::Clock(clock_err) => DomainError::invalid_config(clock_err.to_string()),
        };
        ApiError(domain)
    }
}

impl From<model_meter_store::StoreError> for ApiError {
    fn from(err: model_meter_store::StoreError) -> Self {
        ApiError(DomainError::internal(err.to_string()))
    }
}
