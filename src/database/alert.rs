use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::alert::{AlertWithCrypto, PriceAlert, TriggerableAlert};
use crate::models::crypto::CryptoId;
use sqlx::{Postgres, Transaction};

/// Advisory lock key shared by every process scanning this database.
const ALERT_SCAN_LOCK_KEY: i64 = 0x0A1E_475C_A400;

/// Proof that the caller owns the store-wide scan lock. Dropping it without
/// calling [`ScanLease::release`] still frees the lock.
#[async_trait::async_trait]
pub trait ScanLease: Send {
    async fn release(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait::async_trait]
pub trait AlertRepository: Send + Sync {
    /// Takes the scan lock without waiting. `None` means another scanner
    /// holds it, in this process or any other sharing the store.
    async fn try_lock_scan(&self) -> Result<Option<Box<dyn ScanLease>>, AppError>;
    async fn insert_alert(&self, user_id: i32, crypto_id: CryptoId, target_price: f64) -> Result<PriceAlert, AppError>;
    /// Alerts owned by `user_id`, newest first.
    async fn list_alerts_for_user(&self, user_id: i32) -> Result<Vec<AlertWithCrypto>, AppError>;
    /// Active alerts whose crypto's latest price is at or above the target.
    async fn list_triggerable_alerts(&self) -> Result<Vec<TriggerableAlert>, AppError>;
    /// Flips `is_triggered` to true. Returns false when the alert was already
    /// triggered or does not exist.
    async fn mark_alert_triggered(&self, alert_id: i32) -> Result<bool, AppError>;
}

/// Transaction-scoped advisory lock. Postgres drops the lock when the
/// transaction ends, including when the connection is lost mid-cycle.
struct PgScanLease {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl ScanLease for PgScanLease {
    async fn release(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(|e| AppError::db("Failed to release alert scan lock", e))
    }
}

#[async_trait::async_trait]
impl AlertRepository for PostgresRepository {
    async fn try_lock_scan(&self) -> Result<Option<Box<dyn ScanLease>>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::db("Failed to begin alert scan", e))?;

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(ALERT_SCAN_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::db("Failed to take alert scan lock", e))?;

        if !acquired {
            tx.rollback().await.map_err(|e| AppError::db("Failed to end alert scan", e))?;
            return Ok(None);
        }

        Ok(Some(Box::new(PgScanLease { tx })))
    }

    async fn insert_alert(&self, user_id: i32, crypto_id: CryptoId, target_price: f64) -> Result<PriceAlert, AppError> {
        let mut conn = self.connection().await?;

        let alert = sqlx::query_as::<_, PriceAlert>(
            r#"
            INSERT INTO price_alerts (user_id, crypto_id, target_price, is_triggered)
            VALUES ($1, $2, $3, FALSE)
            RETURNING alert_id, user_id, crypto_id, target_price, is_triggered, created_at
            "#,
        )
        .bind(user_id)
        .bind(crypto_id)
        .bind(target_price)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_crypto_reference(e, "Failed to create alert"))?;

        Ok(alert)
    }

    async fn list_alerts_for_user(&self, user_id: i32) -> Result<Vec<AlertWithCrypto>, AppError> {
        let mut conn = self.connection().await?;

        let alerts = sqlx::query_as::<_, AlertWithCrypto>(
            r#"
            SELECT
                a.alert_id,
                a.crypto_id,
                m.name AS crypto_name,
                a.target_price,
                a.is_triggered,
                a.created_at
            FROM price_alerts a
            JOIN crypto_mapping m ON m.crypto_id = a.crypto_id
            WHERE a.user_id = $1
            ORDER BY a.created_at DESC, a.alert_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to list alerts", e))?;

        Ok(alerts)
    }

    async fn list_triggerable_alerts(&self) -> Result<Vec<TriggerableAlert>, AppError> {
        let mut conn = self.connection().await?;

        // The lateral subquery picks a single price row per alert; the same
        // row feeds both the comparison and the reported current price.
        let alerts = sqlx::query_as::<_, TriggerableAlert>(
            r#"
            SELECT
                a.alert_id,
                u.username,
                u.email,
                a.crypto_id,
                m.name AS crypto_name,
                a.target_price,
                latest.price_usd AS current_price
            FROM price_alerts a
            JOIN users u ON u.user_id = a.user_id
            JOIN crypto_mapping m ON m.crypto_id = a.crypto_id
            JOIN LATERAL (
                SELECT d.price_usd
                FROM crypto_data d
                WHERE d.crypto_id = a.crypto_id
                ORDER BY d.collection_time DESC, d.id DESC
                LIMIT 1
            ) latest ON TRUE
            WHERE a.is_triggered = FALSE
              AND latest.price_usd >= a.target_price
            ORDER BY a.alert_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::db("Failed to scan price alerts", e))?;

        Ok(alerts)
    }

    async fn mark_alert_triggered(&self, alert_id: i32) -> Result<bool, AppError> {
        let mut conn = self.connection().await?;

        let result = sqlx::query("UPDATE price_alerts SET is_triggered = TRUE WHERE alert_id = $1 AND is_triggered = FALSE")
            .bind(alert_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::db("Failed to mark alert as triggered", e))?;

        Ok(result.rows_affected() == 1)
    }
}
