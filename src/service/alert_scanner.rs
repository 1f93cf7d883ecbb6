//! Periodic price alert scanner.
//!
//! Each cycle loads the active alerts whose crypto has reached its target,
//! sends one email per alert and marks it triggered. Cycles never overlap:
//! each one holds the store's scan lock, so a cycle that starts while
//! another is still running is skipped, whether the other runs in this
//! process or in a separate `cron` invocation.
//!
//! Delivery is at most once. An alert is marked triggered after the send
//! attempt whether or not the mail went out, so a flaky relay never causes
//! the same alert to be mailed on every tick.

use crate::database::SharedRepository;
use crate::database::alert::AlertRepository;
use crate::error::app_error::AppError;
use crate::models::alert::{ScanReport, TriggerableAlert};
use crate::service::email::{SharedMailer, alert_notification};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct AlertScanner {
    repository: SharedRepository,
    mailer: SharedMailer,
}

impl AlertScanner {
    pub fn new(repository: SharedRepository, mailer: SharedMailer) -> Self {
        Self { repository, mailer }
    }

    /// Runs one scan. Returns [`ScanReport::skipped`] without touching the
    /// alerts when another cycle holds the scan lock.
    pub async fn run_cycle(&self) -> Result<ScanReport, AppError> {
        let Some(lease) = self.repository.try_lock_scan().await? else {
            tracing::warn!("Alert scan still in progress, skipping this cycle");
            return Ok(ScanReport::skipped());
        };

        let report = self.scan().await;

        if let Err(e) = lease.release().await {
            tracing::error!(error = ?e, "Failed to release alert scan lock");
        }

        report
    }

    async fn scan(&self) -> Result<ScanReport, AppError> {
        let alerts = self.repository.list_triggerable_alerts().await?;
        let mut report = ScanReport {
            matched: alerts.len(),
            ..ScanReport::default()
        };

        for alert in &alerts {
            self.notify(alert, &mut report).await;
        }

        if report.matched > 0 {
            tracing::info!(
                matched = report.matched,
                notified = report.notified,
                send_failures = report.send_failures,
                mark_failures = report.mark_failures,
                "Alert scan completed"
            );
        } else {
            tracing::debug!("Alert scan completed, no alerts matched");
        }

        Ok(report)
    }

    async fn notify(&self, alert: &TriggerableAlert, report: &mut ScanReport) {
        let (subject, body) = alert_notification(alert);

        match self.mailer.send_mail(&alert.email, &subject, &body).await {
            Ok(()) => report.notified += 1,
            Err(e) => {
                report.send_failures += 1;
                tracing::error!(alert_id = alert.alert_id, error = ?e, "Failed to send price alert email");
            }
        }

        match self.repository.mark_alert_triggered(alert.alert_id).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(alert_id = alert.alert_id, "Alert was already triggered"),
            Err(e) => {
                report.mark_failures += 1;
                tracing::error!(alert_id = alert.alert_id, error = ?e, "Failed to mark alert as triggered");
            }
        }
    }

    /// Starts the periodic loop on the current runtime. The first cycle runs
    /// immediately; ticks missed while a cycle runs long are dropped.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cycle().await {
                    tracing::error!(error = ?e, "Alert scan failed");
                }
            }
        })
    }
}
