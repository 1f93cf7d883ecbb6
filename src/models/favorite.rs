use crate::models::crypto::{CryptoId, deserialize_crypto_id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default, rename = "cryptoId", deserialize_with = "deserialize_crypto_id")]
    pub crypto_id: Option<CryptoId>,
}

/// A favorited crypto joined with its latest price sample.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FavoriteCrypto {
    #[serde(rename = "CryptoID")]
    pub crypto_id: CryptoId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "LatestPriceUSD")]
    pub latest_price_usd: f64,
    #[serde(rename = "LatestVolumeUSD")]
    pub latest_volume_usd: f64,
}
