use crate::middleware::{request_id_of, username_of};
use crate::models::crypto::INVALID_CRYPTO_ID;
use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("User not found.")]
    UserNotFound,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid username/email or password.")]
    InvalidCredentials,
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("Internal server error")]
    Token { message: String },
    #[error("Internal server error")]
    Email { message: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

/// JSON body shared by every failure response and catcher.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    /// Maps a failed insert: a uniqueness violation becomes `Conflict` with the
    /// given message, a reference to a crypto that does not exist becomes
    /// `BadRequest`, anything else a store failure.
    pub fn from_insert(source: sqlx::error::Error, conflict_message: &str, context: &str) -> Self {
        if is_unique_violation(&source) {
            Self::Conflict(conflict_message.to_string())
        } else {
            Self::from_crypto_reference(source, context)
        }
    }

    /// Maps a failed write that references `crypto_mapping`.
    pub fn from_crypto_reference(source: sqlx::error::Error, context: &str) -> Self {
        if is_foreign_key_violation(&source) {
            Self::BadRequest(INVALID_CRYPTO_ID.to_string())
        } else {
            Self::db(context, source)
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    pub fn token(message: impl Into<String>) -> Self {
        Self::Token { message: message.into() }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::Email { message: message.into() }
    }
}

fn is_foreign_key_violation(err: &sqlx::error::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

fn is_unique_violation(err: &sqlx::error::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || {
                let message = db_err.message().to_ascii_lowercase();
                message.contains("unique") || message.contains("duplicate key")
            }
        }
        _ => false,
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::UserNotFound => Status::NotFound,
            AppError::InvalidCredentials => Status::BadRequest,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::Token { .. } => Status::InternalServerError,
            AppError::Email { .. } => Status::InternalServerError,
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::Forbidden => Status::Forbidden,
            AppError::Conflict(_) => Status::BadRequest,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ValidationError(_) => Status::BadRequest,
        }
    }
}

pub(crate) fn json_error_response<'r>(status: Status, message: String) -> rocket::response::Result<'r> {
    let body = serde_json::to_string(&ErrorBody { error: message }).map_err(|_| Status::InternalServerError)?;

    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = request_id_of(req);
        let username = username_of(req);

        error!(
            error = ?self,
            request_id = %request_id,
            username = %username,
            method = %method,
            uri = %uri,
            "request failed"
        );

        let status = Status::from(&self);
        json_error_response(status, self.to_string())
    }
}
