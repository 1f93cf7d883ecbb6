mod auth;
mod config;
mod cron_tasks;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use cron_tasks::scan_alerts_once;
pub use database::{Repository, SharedRepository};
pub use models::alert::ScanReport;
pub use service::email::{Mailer, SharedMailer};

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::alert_scanner::AlertScanner;
use crate::service::email::SmtpMailer;
use crate::service::session_token::{JwtSessionTokens, SharedSessionTokens};
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=info,crypto_tracker::service=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // try_init: tests build several instances in one process.
    if json_format {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn ensure_session_secret(session: &config::SessionConfig) {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    if profile != "debug" && (session.jwt_secret.is_empty() || session.jwt_secret == config::DEV_JWT_SECRET) {
        panic!(
            "session.jwt_secret must be set for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept", "X-Cron-Token"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

/// Builds the scanner from the managed repository and mailer.
fn stage_alert_scanner() -> AdHoc {
    AdHoc::try_on_ignite("Alert Scanner", |rocket| async move {
        let (Some(repository), Some(mailer)) = (rocket.state::<SharedRepository>().cloned(), rocket.state::<SharedMailer>().cloned()) else {
            tracing::error!("Alert scanner requires a repository and a mailer");
            return Err(rocket);
        };

        let scanner = Arc::new(AlertScanner::new(repository, mailer));
        Ok(rocket.manage(scanner))
    })
}

/// Starts the periodic scan once the server is up, when `alerts.enabled`.
fn start_alert_timer(alerts: config::AlertScanConfig) -> AdHoc {
    AdHoc::on_liftoff("Alert Scanner Timer", move |rocket| {
        Box::pin(async move {
            if !alerts.enabled {
                tracing::info!("Periodic alert scanning is disabled");
                return;
            }

            if let Some(scanner) = rocket.state::<Arc<AlertScanner>>() {
                let period = Duration::from_secs(alerts.scan_interval_seconds.max(1));
                tracing::info!(interval_seconds = period.as_secs(), "Starting periodic alert scanner");
                scanner.clone().spawn(period);
            }
        })
    })
}

fn assemble(config: Config, rocket: Rocket<Build>) -> Rocket<Build> {
    ensure_session_secret(&config.session);

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");
    let tokens: SharedSessionTokens = Arc::new(JwtSessionTokens::new(&config.session.jwt_secret, config.session.token_ttl_seconds));

    rocket
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_alert_scanner())
        .attach(start_alert_timer(config.alerts.clone()))
        .manage(tokens)
        .manage(config)
        .mount("/", app_routes::health::routes())
        .mount("/", app_routes::user::routes())
        .mount("/", app_routes::favorite::routes())
        .mount("/", app_routes::alert::routes())
        .mount("/", app_routes::crypto::routes())
        .mount("/cron", app_routes::cron::routes())
        .register("/", app_routes::error::catchers())
}

fn base_rocket(config: &Config) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", config.server.address.clone()));
    rocket::custom(figment)
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let mailer: SharedMailer = Arc::new(SmtpMailer::new(config.email.clone()));
    let rocket = base_rocket(&config).attach(stage_db(config.database.clone())).manage(mailer);

    assemble(config, rocket)
}

/// Same instance as [`build_rocket`] around caller-supplied collaborators.
pub fn build_rocket_with_repository(config: Config, repository: SharedRepository, mailer: SharedMailer) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let rocket = base_rocket(&config).manage(repository).manage(mailer);
    assemble(config, rocket)
}
