//! Stateless session tokens.
//!
//! A token is an HS256-signed JWT carrying the username, the issue time and
//! an expiry one TTL later. Nothing is stored server-side, so a token stays
//! valid until it expires even after the client logs out; there is no
//! revocation list. Callers depend on [`SessionTokens`] so one can be added
//! behind it later.

use crate::error::app_error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Every verification failure: bad signature, malformed token, expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid session token")]
pub struct InvalidToken;

pub trait SessionTokens: Send + Sync {
    fn issue(&self, username: &str) -> Result<String, AppError>;
    fn verify(&self, token: &str) -> Result<SessionClaims, InvalidToken>;
}

pub type SharedSessionTokens = Arc<dyn SessionTokens>;

pub struct JwtSessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtSessionTokens {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = SessionClaims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| AppError::token(format!("Failed to sign session token: {e}")))
    }

    /// Checks signature and expiry against `now`. A token is valid while
    /// `now < exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| InvalidToken)?
            .claims;

        if now.timestamp() >= claims.exp || claims.username.is_empty() {
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, username: &str) -> Result<String, AppError> {
        self.issue_at(username, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }
}
