//! Request authorizer (spec.md §4.J): binds an access token's subject to
//! the resource path, and the separate provisioning-API-key guard for the
//! write endpoints spec.md §6.1 carves out of bearer auth.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use model_meter_domain::{ApiError as DomainError, Subject};
use model_meter_security::{decode_token, TokenType};
use subtle::ConstantTimeEq;

/// Extracts and verifies the bearer access token, checks revocation, and
/// inserts the resolved [`Subject`] into the request extensions for
/// handlers to read and bind against the path.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token_from_headers(req.headers()).ok_or_else(|| DomainError::unauthorized("missing bearer token"))?;

    let claims = decode_token(&token, &state.signing_key, TokenType::Access)
        .map_err(|_| DomainError::unauthorized("invalid or expired access token"))?;

    if state
        .store
        .is_token_revoked(&claims.jti)
        .await
        .map_err(|e| DomainError::internal(e.to_string()))?
    {
        return Err(DomainError::unauthorized("token has been revoked").into());
    }

    req.extensions_mut().insert(claims.subject());
    Ok(next.run(req).await)
}

pub fn bearer_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(str::to_string)
}

/// Binding rule: the token's `org_id` must equal the path `org_id`; if the
/// token carries an `app_id`, it must equal the path `app_id`.
pub fn authorize_path(subject: &Subject, org_id: uuid::Uuid, app_id: Option<&str>) -> Result<(), ApiError> {
    if subject.org_id != org_id {
        return Err(DomainError::forbidden("token subject does not match the resource path").into());
    }
    if let (Some(token_app), Some(path_app)) = (&subject.app_id, app_id) {
        if token_app != path_app {
            return Err(DomainError::forbidden("token subject does not match the resource path").into());
        }
    }
    Ok(())
}

pub async fn require_provisioning_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get("x-provisioning-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::unauthorized("missing provisioning API key"))?;

    let expected = state.provisioning_api_key.as_bytes();
    let matches = header.len() == expected.len() && bool::from(header.as_bytes().ct_eq(expected));
    if !matches {
        return Err(DomainError::unauthorized("invalid provisioning API key").into());
    }

    Ok(next.run(req).await)
}
