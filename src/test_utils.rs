use crate::Config;
use crate::database::alert::{AlertRepository, ScanLease};
use crate::database::crypto::CryptoRepository;
use crate::database::favorite::{FAVORITE_CONFLICT_MESSAGE, FavoriteRepository};
use crate::database::user::{USER_CONFLICT_MESSAGE, UserRepository};
use crate::error::app_error::AppError;
use crate::models::alert::{AlertWithCrypto, PriceAlert, TriggerableAlert};
use crate::models::crypto::{CryptoId, CryptoPrice, INVALID_CRYPTO_ID};
use crate::models::favorite::FavoriteCrypto;
use crate::models::user::User;
use crate::service::email::Mailer;
use chrono::{Duration, Utc};
use rocket::local::asynchronous::Client;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct CryptoMapping {
    crypto_id: CryptoId,
    symbol: String,
    name: String,
}

struct Favorite {
    username: String,
    crypto_id: CryptoId,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    cryptos: Vec<CryptoMapping>,
    prices: Vec<CryptoPrice>,
    favorites: Vec<Favorite>,
    alerts: Vec<PriceAlert>,
}

impl State {
    fn latest_price(&self, crypto_id: CryptoId) -> Option<&CryptoPrice> {
        self.prices
            .iter()
            .filter(|p| p.crypto_id == crypto_id)
            .max_by_key(|p| (p.collection_time, p.id))
    }

    fn crypto(&self, crypto_id: CryptoId) -> Option<&CryptoMapping> {
        self.cryptos.iter().find(|c| c.crypto_id == crypto_id)
    }
}

/// Repository backed by plain vectors, mirroring the Postgres queries'
/// uniqueness rules and latest-price ordering.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    queries: AtomicUsize,
    fail_all: AtomicBool,
    fail_mark: AtomicBool,
    scan_locked: Arc<AtomicBool>,
}

/// Frees the in-memory scan lock on release or drop.
struct MemoryScanLease {
    locked: Arc<AtomicBool>,
}

impl Drop for MemoryScanLease {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ScanLease for MemoryScanLease {
    async fn release(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

impl InMemoryRepository {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn query(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::db("In-memory store unavailable", sqlx::Error::PoolTimedOut));
        }
        Ok(self.state())
    }

    pub fn seed_user(&self, username: &str, email: &str) -> i32 {
        let mut state = self.state();
        let user_id = state.users.len() as i32 + 1;
        state.users.push(User {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "not-a-hash".to_string(),
        });
        user_id
    }

    pub fn seed_crypto(&self, crypto_id: CryptoId, symbol: &str, name: &str) {
        self.state().cryptos.push(CryptoMapping {
            crypto_id,
            symbol: symbol.to_string(),
            name: name.to_string(),
        });
    }

    pub fn seed_price(&self, crypto_id: CryptoId, price_usd: f64, minutes_ago: i64) {
        let mut state = self.state();
        let (name, symbol) = state
            .crypto(crypto_id)
            .map(|c| (c.name.clone(), c.symbol.clone()))
            .unwrap_or_else(|| ("Unknown".to_string(), "UNK".to_string()));
        let id = state.prices.len() as i64 + 1;
        state.prices.push(CryptoPrice {
            id,
            crypto_id,
            name,
            symbol,
            price_usd,
            volume_usd: price_usd * 1_000.0,
            collection_time: Utc::now() - Duration::minutes(minutes_ago),
        });
    }

    pub fn seed_alert(&self, user_id: i32, crypto_id: CryptoId, target_price: f64) -> i32 {
        let mut state = self.state();
        let alert_id = state.alerts.len() as i32 + 1;
        state.alerts.push(PriceAlert {
            alert_id,
            user_id,
            crypto_id,
            target_price,
            is_triggered: false,
            created_at: Utc::now(),
        });
        alert_id
    }

    pub fn alerts(&self) -> Vec<PriceAlert> {
        self.state().alerts.clone()
    }

    pub fn favorite_count(&self, username: &str, crypto_id: CryptoId) -> usize {
        self.state()
            .favorites
            .iter()
            .filter(|f| f.username == username && f.crypto_id == crypto_id)
            .count()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn fail_all_queries(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_triggered(&self, fail: bool) {
        self.fail_mark.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.query()?;
        if state.users.iter().any(|u| u.username == username || u.email == email) {
            return Err(AppError::Conflict(USER_CONFLICT_MESSAGE.to_string()));
        }

        let user = User {
            user_id: state.users.len() as i32 + 1,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let state = self.query()?;
        Ok(state.users.iter().find(|u| u.username == identifier || u.email == identifier).cloned())
    }

    async fn get_user_id_by_username(&self, username: &str) -> Result<Option<i32>, AppError> {
        let state = self.query()?;
        Ok(state.users.iter().find(|u| u.username == username).map(|u| u.user_id))
    }
}

#[async_trait::async_trait]
impl FavoriteRepository for InMemoryRepository {
    async fn insert_favorite(&self, _user_id: i32, username: &str, crypto_id: CryptoId) -> Result<(), AppError> {
        let mut state = self.query()?;
        if state.crypto(crypto_id).is_none() {
            return Err(AppError::BadRequest(INVALID_CRYPTO_ID.to_string()));
        }
        if state.favorites.iter().any(|f| f.username == username && f.crypto_id == crypto_id) {
            return Err(AppError::Conflict(FAVORITE_CONFLICT_MESSAGE.to_string()));
        }
        state.favorites.push(Favorite {
            username: username.to_string(),
            crypto_id,
        });
        Ok(())
    }

    async fn delete_favorite(&self, username: &str, crypto_id: CryptoId) -> Result<(), AppError> {
        let mut state = self.query()?;
        state.favorites.retain(|f| !(f.username == username && f.crypto_id == crypto_id));
        Ok(())
    }

    async fn list_favorites(&self, username: &str) -> Result<Vec<FavoriteCrypto>, AppError> {
        let state = self.query()?;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.username == username)
            .filter_map(|f| {
                let crypto = state.crypto(f.crypto_id)?;
                let latest = state.latest_price(f.crypto_id)?;
                Some(FavoriteCrypto {
                    crypto_id: f.crypto_id,
                    name: crypto.name.clone(),
                    symbol: crypto.symbol.clone(),
                    latest_price_usd: latest.price_usd,
                    latest_volume_usd: latest.volume_usd,
                })
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl AlertRepository for InMemoryRepository {
    async fn try_lock_scan(&self) -> Result<Option<Box<dyn ScanLease>>, AppError> {
        drop(self.query()?);
        if self.scan_locked.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryScanLease {
            locked: self.scan_locked.clone(),
        })))
    }

    async fn insert_alert(&self, user_id: i32, crypto_id: CryptoId, target_price: f64) -> Result<PriceAlert, AppError> {
        let mut state = self.query()?;
        if state.crypto(crypto_id).is_none() {
            return Err(AppError::BadRequest(INVALID_CRYPTO_ID.to_string()));
        }
        let alert = PriceAlert {
            alert_id: state.alerts.len() as i32 + 1,
            user_id,
            crypto_id,
            target_price,
            is_triggered: false,
            created_at: Utc::now(),
        };
        state.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn list_alerts_for_user(&self, user_id: i32) -> Result<Vec<AlertWithCrypto>, AppError> {
        let state = self.query()?;
        let mut alerts: Vec<AlertWithCrypto> = state
            .alerts
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                let crypto = state.crypto(a.crypto_id)?;
                Some(AlertWithCrypto {
                    alert_id: a.alert_id,
                    crypto_id: a.crypto_id,
                    crypto_name: crypto.name.clone(),
                    target_price: a.target_price,
                    is_triggered: a.is_triggered,
                    created_at: a.created_at,
                })
            })
            .collect();
        alerts.sort_by(|a, b| (b.created_at, b.alert_id).cmp(&(a.created_at, a.alert_id)));
        Ok(alerts)
    }

    async fn list_triggerable_alerts(&self) -> Result<Vec<TriggerableAlert>, AppError> {
        let state = self.query()?;
        Ok(state
            .alerts
            .iter()
            .filter(|a| !a.is_triggered)
            .filter_map(|a| {
                let user = state.users.iter().find(|u| u.user_id == a.user_id)?;
                let crypto = state.crypto(a.crypto_id)?;
                let latest = state.latest_price(a.crypto_id)?;
                (latest.price_usd >= a.target_price).then(|| TriggerableAlert {
                    alert_id: a.alert_id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    crypto_id: a.crypto_id,
                    crypto_name: crypto.name.clone(),
                    target_price: a.target_price,
                    current_price: latest.price_usd,
                })
            })
            .collect())
    }

    async fn mark_alert_triggered(&self, alert_id: i32) -> Result<bool, AppError> {
        let mut state = self.query()?;
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(AppError::db("Failed to mark alert as triggered", sqlx::Error::PoolTimedOut));
        }
        match state.alerts.iter_mut().find(|a| a.alert_id == alert_id && !a.is_triggered) {
            Some(alert) => {
                alert.is_triggered = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl CryptoRepository for InMemoryRepository {
    async fn list_latest_prices(&self) -> Result<Vec<CryptoPrice>, AppError> {
        let state = self.query()?;
        let mut ids: Vec<CryptoId> = state.prices.iter().map(|p| p.crypto_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.into_iter().filter_map(|id| state.latest_price(id).cloned()).collect())
    }

    async fn get_price_history(&self, crypto_id: CryptoId) -> Result<Vec<CryptoPrice>, AppError> {
        let state = self.query()?;
        let mut history: Vec<CryptoPrice> = state.prices.iter().filter(|p| p.crypto_id == crypto_id).cloned().collect();
        history.sort_by(|a, b| (b.collection_time, b.id).cmp(&(a.collection_time, a.id)));
        Ok(history)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send_mail(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Err(AppError::email("SMTP relay unavailable"))
    }
}

/// Sleeps before each delivery so concurrent scan cycles overlap.
pub struct SlowMailer {
    delay: std::time::Duration,
    sent: AtomicUsize,
}

impl SlowMailer {
    pub fn new(delay: std::time::Duration) -> Self {
        Self {
            delay,
            sent: AtomicUsize::new(0),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Mailer for SlowMailer {
    async fn send_mail(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        tokio::time::sleep(self.delay).await;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub const TEST_JWT_SECRET: &str = "test-secret-for-session-tokens";

/// Configuration for route tests: the background scanner stays off and
/// cron requests authenticate with `cron-test-token`.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.jwt_secret = TEST_JWT_SECRET.to_string();
    config.alerts.enabled = false;
    config.cron.auth_token = "cron-test-token".to_string();
    config.email.enabled = false;
    config
}

pub async fn test_client(repository: Arc<InMemoryRepository>, mailer: Arc<dyn Mailer>) -> Client {
    let rocket = crate::build_rocket_with_repository(test_config(), repository, mailer);
    Client::tracked(rocket).await.expect("valid rocket instance")
}

/// Registers `username` with password `pw` and logs in; a tracked client
/// keeps the session cookie for later requests.
pub async fn sign_in(client: &Client, username: &str) {
    use rocket::http::{ContentType, Status};

    let signup = serde_json::json!({"username": username, "password": "pw", "email": format!("{username}@x.com")});
    let response = client.post("/signup").header(ContentType::JSON).body(signup.to_string()).dispatch().await;
    assert_eq!(response.status(), Status::Created);

    let login = serde_json::json!({"identifier": username, "password": "pw"});
    let response = client.post("/login").header(ContentType::JSON).body(login.to_string()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}
