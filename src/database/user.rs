use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::User;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; a taken username or email is a `Conflict`.
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError>;
    /// Looks a user up by username or email.
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError>;
    async fn get_user_id_by_username(&self, username: &str) -> Result<Option<i32>, AppError>;
}

pub(crate) const USER_CONFLICT_MESSAGE: &str = "Username or email already exists.";

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut conn = self.connection().await?;

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, username, email, password_hash
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, USER_CONFLICT_MESSAGE, "Failed to register user"))
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.connection().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, password_hash
            FROM users
            WHERE username = $1 OR email = $1
            ORDER BY user_id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to look up user", e))?;

        Ok(user)
    }

    async fn get_user_id_by_username(&self, username: &str) -> Result<Option<i32>, AppError> {
        let mut conn = self.connection().await?;

        let user_id = sqlx::query_scalar::<_, i32>("SELECT user_id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::db("Failed to resolve user id", e))?;

        Ok(user_id)
    }
}
