use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CryptoId = i32;

pub const INVALID_CRYPTO_ID: &str = "Invalid crypto ID";

/// One collected price sample.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CryptoPrice {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CryptoID")]
    pub crypto_id: CryptoId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "PriceUSD")]
    pub price_usd: f64,
    #[serde(rename = "VolumeUSD")]
    pub volume_usd: f64,
    #[serde(rename = "CollectionTime")]
    pub collection_time: DateTime<Utc>,
}

/// Daily candle derived from price samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcCandle {
    #[serde(rename = "CryptoID")]
    pub crypto_id: CryptoId,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
}

/// Parses a crypto id from a path segment.
pub fn parse_crypto_id(raw: &str) -> Option<CryptoId> {
    raw.trim().parse::<CryptoId>().ok().filter(|id| *id > 0)
}

/// Accepts a crypto id sent either as a JSON number or a numeric string
/// (HTML selects submit strings). `null` and `""` read as absent.
pub fn deserialize_crypto_id<'de, D>(deserializer: D) -> Result<Option<CryptoId>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CryptoIdVisitor;

    impl<'de> Visitor<'de> for CryptoIdVisitor {
        type Value = Option<CryptoId>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a crypto id as an integer or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(CryptoIdVisitor)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            CryptoId::try_from(v).map(Some).map_err(|_| E::custom("crypto id out of range"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            CryptoId::try_from(v).map(Some).map_err(|_| E::custom("crypto id out of range"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<CryptoId>().map(Some).map_err(|_| E::custom("crypto id is not numeric"))
        }
    }

    deserializer.deserialize_option(CryptoIdVisitor)
}
