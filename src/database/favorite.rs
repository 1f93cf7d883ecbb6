use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::crypto::CryptoId;
use crate::models::favorite::FavoriteCrypto;

#[async_trait::async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Inserts a favorite; an existing `(username, crypto_id)` pair is a `Conflict`.
    async fn insert_favorite(&self, user_id: i32, username: &str, crypto_id: CryptoId) -> Result<(), AppError>;
    /// Deletes by `(username, crypto_id)`. Succeeds when nothing matched.
    async fn delete_favorite(&self, username: &str, crypto_id: CryptoId) -> Result<(), AppError>;
    async fn list_favorites(&self, username: &str) -> Result<Vec<FavoriteCrypto>, AppError>;
}

pub(crate) const FAVORITE_CONFLICT_MESSAGE: &str = "Crypto already in favorites.";

#[async_trait::async_trait]
impl FavoriteRepository for PostgresRepository {
    async fn insert_favorite(&self, user_id: i32, username: &str, crypto_id: CryptoId) -> Result<(), AppError> {
        let mut conn = self.connection().await?;

        sqlx::query("INSERT INTO favorites (user_id, username, crypto_id) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(username)
            .bind(crypto_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::from_insert(e, FAVORITE_CONFLICT_MESSAGE, "Failed to add favorite"))?;

        Ok(())
    }

    async fn delete_favorite(&self, username: &str, crypto_id: CryptoId) -> Result<(), AppError> {
        let mut conn = self.connection().await?;

        sqlx::query("DELETE FROM favorites WHERE username = $1 AND crypto_id = $2")
            .bind(username)
            .bind(crypto_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::db("Failed to remove favorite", e))?;

        Ok(())
    }

    async fn list_favorites(&self, username: &str) -> Result<Vec<FavoriteCrypto>, AppError> {
        let mut conn = self.connection().await?;

        // Latest sample per crypto: highest collection_time, ties broken by the
        // most recently inserted row.
        let favorites = sqlx::query_as::<_, FavoriteCrypto>(
            r#"
            SELECT
                f.crypto_id,
                m.name,
                m.symbol,
                latest.price_usd AS latest_price_usd,
                latest.volume_usd AS latest_volume_usd
            FROM favorites f
            JOIN crypto_mapping m ON m.crypto_id = f.crypto_id
            JOIN LATERAL (
                SELECT d.price_usd, d.volume_usd
                FROM crypto_data d
                WHERE d.crypto_id = f.crypto_id
                ORDER BY d.collection_time DESC, d.id DESC
                LIMIT 1
            ) latest ON TRUE
            WHERE f.username = $1
            "#,
        )
        .bind(username)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to list favorites", e))?;

        Ok(favorites)
    }
}
