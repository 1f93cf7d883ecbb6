use crate::Config;
use crate::database::SharedRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;
use crate::models::alert::ScanReport;
use crate::service::alert_scanner::AlertScanner;
use crate::service::email::{SharedMailer, SmtpMailer};
use std::sync::Arc;

/// Runs a single alert scan cycle against the configured store and mail
/// transport, then closes the pool.
pub async fn scan_alerts_once(config: &Config) -> Result<ScanReport, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repository: SharedRepository = Arc::new(PostgresRepository::new(pool.clone()));
    let mailer: SharedMailer = Arc::new(SmtpMailer::new(config.email.clone()));
    let result = AlertScanner::new(repository, mailer)
        .run_cycle()
        .await
        .map_err(|err| format!("Failed to scan price alerts: {err:?}"));

    pool.close().await;

    result
}
