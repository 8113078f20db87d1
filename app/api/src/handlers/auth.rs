//! `/auth/*` handlers (spec.md §6.1).

use crate::error::ApiError;
use crate::middleware::bearer_token_from_headers;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use model_meter_domain::ApiError as DomainError;
use model_meter_security::{decode_token, revoke_token, TokenType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    RefreshToken,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub refresh_expires_in: Option<i64>,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let now = Utc::now();
    match body.grant_type {
        GrantType::ClientCredentials => {
            let client_id = body.client_id.ok_or_else(|| DomainError::invalid_request("client_id is required"))?;
            let client_secret =
                body.client_secret.ok_or_else(|| DomainError::invalid_request("client_secret is required"))?;
            let pair = model_meter_security::issue_token_pair(&state.store, &state.signing_key, &client_id, &client_secret)
                .await?;
            Ok(Json(TokenResponse {
                access_token: pair.access_token,
                token_type: "Bearer",
                expires_in: (pair.access_expires_at - now).num_seconds(),
                refresh_token: Some(pair.refresh_token),
                refresh_expires_in: Some((pair.refresh_expires_at - now).num_seconds()),
            }))
        }
        GrantType::RefreshToken => {
            let refresh_token =
                body.refresh_token.ok_or_else(|| DomainError::invalid_request("refresh_token is required"))?;
            let issued = model_meter_security::refresh_access_token(&state.store, &state.signing_key, &refresh_token).await?;
            Ok(Json(TokenResponse {
                access_token: issued.token,
                token_type: "Bearer",
                expires_in: (issued.expires_at - now).num_seconds(),
                refresh_token: None,
                refresh_expires_in: None,
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
    pub token_type: RevokeTokenType,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RevokeTokenType {
    Access,
    Refresh,
}

pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RevokeRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    let caller_token = bearer_token_from_headers(&headers).ok_or_else(|| DomainError::unauthorized("missing bearer token"))?;
    let caller_claims = decode_token(&caller_token, &state.signing_key, TokenType::Access)
        .map_err(|_| DomainError::unauthorized("invalid or expired access token"))?;

    let token_type = match body.token_type {
        RevokeTokenType::Access => TokenType::Access,
        RevokeTokenType::Refresh => TokenType::Refresh,
    };

    revoke_token(&state.store, &state.signing_key, &caller_claims.subject(), &body.token, token_type).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
