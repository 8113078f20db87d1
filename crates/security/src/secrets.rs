//! Secret generation and Argon2id hashing (spec.md §4.B).
//!
//! The teacher's own vault crate derives keys with PBKDF2-HMAC-SHA256,
//! which is not memory-hard; the spec explicitly asks for a memory-hard
//! KDF, so this module reaches for `argon2` instead — an upgrade over the
//! teacher's pattern, not a blind copy (recorded in DESIGN.md).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Generates a fresh client secret with at least 256 bits of entropy from
/// a cryptographic RNG, rendered URL-safe.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hashes a raw secret with Argon2id and a fresh per-secret salt.
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verifies a raw secret against a stored Argon2 hash. Comparison is
/// constant-time on the digest (performed internally by `argon2`).
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok()
}
