use crate::error::app_error::AppError;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::pool::PoolConnection;

#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Checks out one pooled connection for a single unit of work. The
    /// connection goes back to the pool when the guard drops, on success and
    /// on every error path alike.
    pub(crate) async fn connection(&self) -> Result<PoolConnection<Postgres>, AppError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| AppError::db("Failed to acquire database connection", e))
    }
}
