//! JWT issuance, verification and revocation (spec.md §4.C).
//!
//! The teacher's `client-vault-rs` crate base64-decodes a JWT payload
//! without ever checking the signature. The spec requires signed,
//! verifiable tokens, so this module uses `jsonwebtoken` with HMAC-SHA256
//! end to end instead — a correctness fix over the teacher's pattern, not
//! an imitation of it (recorded in DESIGN.md).

use crate::errors::SecurityError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model_meter_domain::Subject;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TTL_SECS: i64 = 60 * 60;
const REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 30;
const ISSUER: &str = "model-meter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub org_id: Uuid,
    pub app_id: Option<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub token_type: String,
}

pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: chrono::DateTime<Utc>,
}

fn issue(subject: &Subject, signing_key: &[u8], token_type: TokenType) -> Result<IssuedToken, SecurityError> {
    let now = Utc::now();
    let ttl = match token_type {
        TokenType::Access => ACCESS_TTL_SECS,
        TokenType::Refresh => REFRESH_TTL_SECS,
    };
    let expires_at = now + Duration::seconds(ttl);
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: subject.client_id.clone(),
        org_id: subject.org_id,
        app_id: subject.app_id.clone(),
        jti: jti.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        iss: ISSUER.to_string(),
        token_type: token_type.as_str().to_string(),
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(signing_key))
        .map_err(|e| SecurityError::Unauthorized(e.to_string()))?;

    Ok(IssuedToken { token, jti, expires_at })
}

pub fn issue_access_token(subject: &Subject, signing_key: &[u8]) -> Result<IssuedToken, SecurityError> {
    issue(subject, signing_key, TokenType::Access)
}

pub fn issue_refresh_token(subject: &Subject, signing_key: &[u8]) -> Result<IssuedToken, SecurityError> {
    issue(subject, signing_key, TokenType::Refresh)
}

/// Verifies a token's signature, expiry and issuer, and that it is the
/// expected `token_type`. Revocation is checked by the caller against the
/// store, since that requires I/O this pure function can't do.
pub fn decode_token(token: &str, signing_key: &[u8], expected: TokenType) -> Result<Claims, SecurityError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map_err(|e| SecurityError::Unauthorized(e.to_string()))?;

    if data.claims.token_type != expected.as_str() {
        return Err(SecurityError::Unauthorized("unexpected token type".to_string()));
    }

    Ok(data.claims)
}

impl Claims {
    pub fn subject(&self) -> Subject {
        Subject { org_id: self.org_id, app_id: self.app_id.clone(), client_id: self.sub.clone() }
    }

    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject { org_id: Uuid::new_v4(), app_id: Some("checkout".into()), client_id: "org-x-app-checkout".into() }
    }

    #[test]
    fn issues_and_verifies_access_token() {
        let key = b"test-signing-key";
        let subject = subject();
        let issued = issue_access_token(&subject, key).unwrap();
        let claims = decode_token(&issued.token, key, TokenType::Access).unwrap();
        assert_eq!(claims.sub, subject.client_id);
        assert_eq!(claims.subject(), subject);
    }

    #[test]
    fn rejects_wrong_token_type() {
        let key = b"test-signing-key";
        let issued = issue_refresh_token(&subject(), key).unwrap();
        let result = decode_token(&issued.token, key, TokenType::Access);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_tampered_signature() {
        let issued = issue_access_token(&subject(), b"correct-key").unwrap();
        let result = decode_token(&issued.token, b"wrong-key", TokenType::Access);
        assert!(result.is_err());
    }
}
