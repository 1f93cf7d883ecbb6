use crate::database::Repository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::user::{LoginRequest, SignupRequest, User, present, required};
use crate::service::password::{hash_password_blocking, verify_password_blocking};
use validator::Validate;

pub const SIGNUP_FIELDS_REQUIRED: &str = "Username, password, and email are required.";
pub const LOGIN_FIELDS_REQUIRED: &str = "Identifier and password are required.";

/// Credential issuance and verification.
pub struct AuthService<'a> {
    repository: &'a dyn Repository,
}

impl<'a> AuthService<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        AuthService { repository }
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<User, AppError> {
        let (Some(username), Some(password), Some(email)) = (required(&request.username), present(&request.password), required(&request.email)) else {
            return Err(AppError::BadRequest(SIGNUP_FIELDS_REQUIRED.to_string()));
        };
        request.validate()?;

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = self.repository.create_user(username, email, &password_hash).await?;

        tracing::info!(user_id = user.user_id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Resolves `identifier` (username or email) and checks the password.
    /// Unknown identifiers and wrong passwords fail identically.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        let (Some(identifier), Some(password)) = (required(&request.identifier), present(&request.password)) else {
            return Err(AppError::BadRequest(LOGIN_FIELDS_REQUIRED.to_string()));
        };

        let user = self.repository.find_user_by_identifier(identifier).await?;
        let digest = user.as_ref().map(|u| u.password_hash.clone());

        if !verify_password_blocking(password.to_string(), digest).await {
            return Err(AppError::InvalidCredentials);
        }

        user.ok_or(AppError::InvalidCredentials)
    }
}
