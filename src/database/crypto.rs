use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::crypto::{CryptoId, CryptoPrice};

/// Price samples. "Latest" always means the highest `collection_time`, and
/// among samples sharing it the highest `id`; favorites and the alert scan
/// follow the same rule.
#[async_trait::async_trait]
pub trait CryptoRepository: Send + Sync {
    /// Latest price sample of every tracked crypto.
    async fn list_latest_prices(&self) -> Result<Vec<CryptoPrice>, AppError>;
    /// All samples of one crypto, newest first.
    async fn get_price_history(&self, crypto_id: CryptoId) -> Result<Vec<CryptoPrice>, AppError>;
}

#[async_trait::async_trait]
impl CryptoRepository for PostgresRepository {
    async fn list_latest_prices(&self) -> Result<Vec<CryptoPrice>, AppError> {
        let mut conn = self.connection().await?;

        let prices = sqlx::query_as::<_, CryptoPrice>(
            r#"
            SELECT DISTINCT ON (crypto_id)
                id, crypto_id, name, symbol, price_usd, volume_usd, collection_time
            FROM crypto_data
            ORDER BY crypto_id, collection_time DESC, id DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to list latest prices", e))?;

        Ok(prices)
    }

    async fn get_price_history(&self, crypto_id: CryptoId) -> Result<Vec<CryptoPrice>, AppError> {
        let mut conn = self.connection().await?;

        let prices = sqlx::query_as::<_, CryptoPrice>(
            r#"
            SELECT id, crypto_id, name, symbol, price_usd, volume_usd, collection_time
            FROM crypto_data
            WHERE crypto_id = $1
            ORDER BY collection_time DESC, id DESC
            "#,
        )
        .bind(crypto_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to load price history", e))?;

        Ok(prices)
    }
}
