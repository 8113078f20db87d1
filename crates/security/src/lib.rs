//! Credential verification/rotation and JWT issuance/verification/revocation.
//!
//! This crate is the only place secrets and signing keys are handled; the
//! API layer calls into it and never touches `argon2`/`jsonwebtoken` directly.

mod credentials;
mod errors;
mod secrets;
mod tokens;

pub use credentials::{rotate_application, rotate_organization, verify as verify_credentials};
pub use errors::SecurityError;
pub use secrets::{generate_secret, hash_secret, verify_secret};
pub use tokens::{decode_token, issue_access_token, issue_refresh_token, Claims, IssuedToken, TokenType};

use chrono::Utc;
use model_meter_domain::Subject;
use model_meter_store::Store;

/// A verified access/refresh token pair, as returned to a caller from the
/// token endpoint and the refresh endpoint.
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: chrono::DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: chrono::DateTime<Utc>,
}

/// Authenticates `client_id`/`client_secret` and issues a fresh access +
/// refresh token pair (spec.md §6.1 `POST /auth/token`).
pub async fn issue_token_pair(
    store: &Store,
    signing_key: &[u8],
    client_id: &str,
    client_secret: &str,
) -> Result<TokenPair, SecurityError> {
    let subject = verify_credentials(store, client_id, client_secret).await?;
    let access = issue_access_token(&subject, signing_key)?;
    let refresh = issue_refresh_token(&subject, signing_key)?;

    Ok(TokenPair {
        access_token: access.token,
        access_expires_at: access.expires_at,
        refresh_token: refresh.token,
        refresh_expires_at: refresh.expires_at,
    })
}

/// Exchanges a still-valid, unrevoked refresh token for a new access
/// token. Per the spec's resolved Open Question, the refresh token itself
/// is not rotated on use.
pub async fn refresh_access_token(
    store: &Store,
    signing_key: &[u8],
    refresh_token: &str,
) -> Result<IssuedToken, SecurityError> {
    let claims = decode_token(refresh_token, signing_key, TokenType::Refresh)?;

    if store.is_token_revoked(&claims.jti).await? {
        return Err(SecurityError::Unauthorized("refresh token revoked".to_string()));
    }

    issue_access_token(&claims.subject(), signing_key)
}

/// Revokes a token on behalf of `requesting_subject`. A caller may only
/// revoke tokens whose `sub` matches its own authenticated identity.
pub async fn revoke_token(
    store: &Store,
    signing_key: &[u8],
    requesting_subject: &Subject,
    token: &str,
    token_type: TokenType,
) -> Result<(), SecurityError> {
    let claims = decode_token(token, signing_key, token_type)?;

    if claims.sub != requesting_subject.client_id {
        return Err(SecurityError::Forbidden("cannot revoke another subject's token".to_string()));
    }

    store
        .revoke_token(
            &claims.jti,
            match token_type {
                TokenType::Access => "access",
                TokenType::Refresh => "refresh",
            },
            &claims.sub,
            claims.expires_at(),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_meter_domain::{CredentialRecord, Organization, QuotaScope};
    use std::collections::HashMap;
    use uuid::Uuid;

    async fn seeded_store() -> (Store, Uuid, String) {
        let store = Store::connect(":memory:", None).await.unwrap();
        let org_id = Uuid::new_v4();
        let now = Utc::now();
        let secret = "super-secret-value";
        let hash = hash_secret(secret).unwrap();
        let org = Organization {
            org_id,
            display_name: "Acme".into(),
            timezone: "UTC".into(),
            quota_scope: QuotaScope::Org,
            model_ordering: vec!["premium".into()],
            quotas: HashMap::from([("premium".into(), 1_000)]),
            shard_count: 4,
            credentials: CredentialRecord::new(Organization::client_id(org_id), hash, now),
            created_at: now,
            updated_at: now,
        };
        store.upsert_organization(&org).await.unwrap();
        (store, org_id, secret.to_string())
    }

    #[tokio::test]
    async fn issues_refreshes_and_revokes_a_token_pair() {
        let (store, org_id, secret) = seeded_store().await;
        let client_id = Organization::client_id(org_id);
        let key = b"signing-key-for-tests";

        let pair = issue_token_pair(&store, key, &client_id, &secret).await.unwrap();
        let refreshed = refresh_access_token(&store, key, &pair.refresh_token).await.unwrap();
        assert!(!refreshed.token.is_empty());

        let subject = Subject { org_id, app_id: None, client_id: client_id.clone() };
        revoke_token(&store, key, &subject, &pair.refresh_token, TokenType::Refresh)
            .await
            .unwrap();

        let result = refresh_access_token(&store, key, &pair.refresh_token).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_login_with_wrong_secret() {
        let (store, org_id, _secret) = seeded_store().await;
        let client_id = Organization::client_id(org_id);
        let result = issue_token_pair(&store, b"key", &client_id, "not-the-secret").await;
        assert!(result.is_err());
    }
}
