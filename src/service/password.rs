//! One-way salted password hashing (Argon2id, PHC string format).
//!
//! The default Argon2 parameters cost tens of milliseconds per verification
//! in release builds. Callers on the async runtime should go through
//! [`hash_password_blocking`] / [`verify_password_blocking`] so the work runs
//! off the request threads.

use crate::error::app_error::AppError;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

/// A real Argon2 hash generated once, used as a timing decoy so that login
/// attempts for unknown identifiers cost the same as for known ones.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("dummy-never-matches").ok());

/// Hashes `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::password_hash("Failed to hash password", e))?;

    Ok(digest.to_string())
}

/// True only when `plaintext` matches `digest`. A malformed digest is
/// reported as a mismatch.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be parsed");
            false
        }
    }
}

/// Burns one verification against the decoy hash.
pub fn dummy_verify(plaintext: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plaintext, hash);
    }
}

pub async fn hash_password_blocking(plaintext: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| AppError::PasswordHash {
            message: format!("Password hashing task failed: {e}"),
        })?
}

/// Verifies against `digest`, or against the decoy when there is no account.
pub async fn verify_password_blocking(plaintext: String, digest: Option<String>) -> bool {
    let outcome = tokio::task::spawn_blocking(move || match digest {
        Some(digest) => verify_password(&plaintext, &digest),
        None => {
            dummy_verify(&plaintext);
            false
        }
    })
    .await;

    outcome.unwrap_or(false)
}
