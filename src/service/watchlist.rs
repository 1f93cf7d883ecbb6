use crate::database::Repository;
use crate::database::alert::AlertRepository;
use crate::database::favorite::FavoriteRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::alert::{AlertWithCrypto, PriceAlert, is_valid_target_price};
use crate::models::crypto::CryptoId;
use crate::models::favorite::FavoriteCrypto;

pub const MISSING_CRYPTO_ID: &str = "Crypto ID is required.";
pub const INVALID_ALERT: &str = "Crypto ID and a positive target price are required.";

/// Favorites and price alerts, scoped to an authenticated username.
///
/// Input is validated before any store access. Store failures are returned
/// as-is and never retried here.
pub struct WatchlistService<'a> {
    repository: &'a dyn Repository,
}

impl<'a> WatchlistService<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        WatchlistService { repository }
    }

    async fn resolve_user_id(&self, username: &str) -> Result<i32, AppError> {
        self.repository.get_user_id_by_username(username).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn add_favorite(&self, username: &str, crypto_id: Option<CryptoId>) -> Result<(), AppError> {
        let crypto_id = crypto_id.filter(|id| *id != 0).ok_or_else(|| AppError::BadRequest(MISSING_CRYPTO_ID.to_string()))?;

        let user_id = self.resolve_user_id(username).await?;
        self.repository.insert_favorite(user_id, username, crypto_id).await
    }

    pub async fn remove_favorite(&self, username: &str, crypto_id: CryptoId) -> Result<(), AppError> {
        self.repository.delete_favorite(username, crypto_id).await
    }

    pub async fn list_favorites(&self, username: &str) -> Result<Vec<FavoriteCrypto>, AppError> {
        self.repository.list_favorites(username).await
    }

    pub async fn create_alert(&self, username: &str, crypto_id: Option<CryptoId>, target_price: Option<f64>) -> Result<PriceAlert, AppError> {
        let (crypto_id, target_price) = match (crypto_id, target_price) {
            (Some(id), Some(price)) if id != 0 && is_valid_target_price(price) => (id, price),
            _ => return Err(AppError::BadRequest(INVALID_ALERT.to_string())),
        };

        let user_id = self.resolve_user_id(username).await?;
        self.repository.insert_alert(user_id, crypto_id, target_price).await
    }

    pub async fn list_alerts(&self, username: &str) -> Result<Vec<AlertWithCrypto>, AppError> {
        let user_id = self.resolve_user_id(username).await?;
        self.repository.list_alerts_for_user(user_id).await
    }
}
