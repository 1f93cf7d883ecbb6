use crate::config::Config;
use crate::error::app_error::AppError;
use crate::middleware::RequestId;
use crate::models::alert::ScanReport;
use crate::service::alert_scanner::AlertScanner;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket::serde::json::Json;
use rocket::{State, post, routes};
use std::sync::Arc;

pub(crate) struct CronAuth;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CronAuth {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };

        if config.cron.auth_token.is_empty() {
            return Outcome::Error((Status::BadRequest, AppError::BadRequest("Cron auth token is not configured".to_string())));
        }

        let incoming = req.headers().get_one("x-cron-token");
        match incoming {
            Some(token) if token == config.cron.auth_token => Outcome::Success(CronAuth),
            _ => Outcome::Error((Status::Forbidden, AppError::Forbidden)),
        }
    }
}

/// Runs one alert scan on demand. Shares the periodic task's lock, so a
/// request that lands mid-cycle reports `skipped`.
#[post("/scan-alerts")]
pub async fn scan_alerts(scanner: &State<Arc<AlertScanner>>, request_id: RequestId, _cron_auth: CronAuth) -> Result<Json<ScanReport>, AppError> {
    tracing::info!(request_id = %request_id.0, "On-demand alert scan requested");
    let report = scanner.run_cycle().await?;
    Ok(Json(report))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![scan_alerts]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{InMemoryRepository, RecordingMailer, test_client};
    use rocket::http::{Header, Status};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn seeded() -> Arc<InMemoryRepository> {
        let repo = Arc::new(InMemoryRepository::default());
        let user_id = repo.seed_user("john", "j@x.com");
        repo.seed_crypto(1, "BTC", "Bitcoin");
        repo.seed_price(1, 100.0, 1);
        repo.seed_alert(user_id, 1, 100.0);
        repo
    }

    #[rocket::async_test]
    async fn scan_requires_the_cron_token() {
        let client = test_client(seeded(), Arc::new(RecordingMailer::default())).await;

        let response = client.post("/cron/scan-alerts").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client.post("/cron/scan-alerts").header(Header::new("x-cron-token", "wrong")).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Forbidden");
    }

    #[rocket::async_test]
    async fn scan_notifies_once_and_reports() {
        let repo = seeded();
        let mailer = Arc::new(RecordingMailer::default());
        let client = test_client(repo.clone(), mailer.clone()).await;

        let response = client.post("/cron/scan-alerts").header(Header::new("x-cron-token", "cron-test-token")).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body, json!({"skipped": false, "matched": 1, "notified": 1, "sendFailures": 0, "markFailures": 0}));

        let response = client.post("/cron/scan-alerts").header(Header::new("x-cron-token", "cron-test-token")).dispatch().await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["matched"], 0);

        assert_eq!(mailer.sent().len(), 1);
        assert!(repo.alerts()[0].is_triggered);
    }
}
