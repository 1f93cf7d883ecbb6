use crate::models::crypto::{CryptoId, deserialize_crypto_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct AlertRequest {
    #[serde(default, rename = "cryptoId", deserialize_with = "deserialize_crypto_id")]
    pub crypto_id: Option<CryptoId>,
    #[serde(default, rename = "targetPrice")]
    pub target_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PriceAlert {
    pub alert_id: i32,
    pub user_id: i32,
    pub crypto_id: CryptoId,
    pub target_price: f64,
    pub is_triggered: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a price alert. The only transition is `Active -> Triggered`,
/// performed by the alert scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Active,
    Triggered,
}

impl PriceAlert {
    pub fn state(&self) -> AlertState {
        if self.is_triggered { AlertState::Triggered } else { AlertState::Active }
    }
}

/// Alert row as listed to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AlertWithCrypto {
    #[serde(rename = "AlertID")]
    pub alert_id: i32,
    #[serde(rename = "CryptoID")]
    pub crypto_id: CryptoId,
    #[serde(rename = "CryptoName")]
    pub crypto_name: String,
    #[serde(rename = "TargetPrice")]
    pub target_price: f64,
    #[serde(rename = "IsTriggered")]
    pub is_triggered: bool,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
}

/// An active alert whose crypto's latest price has reached its target.
/// `current_price` comes from the same price row used for the comparison.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TriggerableAlert {
    pub alert_id: i32,
    pub username: String,
    pub email: String,
    pub crypto_id: CryptoId,
    pub crypto_name: String,
    pub target_price: f64,
    pub current_price: f64,
}

/// Summary of one scanner cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub skipped: bool,
    pub matched: usize,
    pub notified: usize,
    pub send_failures: usize,
    pub mark_failures: usize,
}

impl ScanReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// `targetPrice` must be a finite number strictly above zero.
pub fn is_valid_target_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_price_must_be_positive_and_finite() {
        assert!(is_valid_target_price(0.01));
        assert!(is_valid_target_price(100.0));
        assert!(!is_valid_target_price(0.0));
        assert!(!is_valid_target_price(-5.0));
        assert!(!is_valid_target_price(f64::NAN));
        assert!(!is_valid_target_price(f64::INFINITY));
    }

    #[test]
    fn alert_request_reads_camel_case_fields() {
        let request: AlertRequest = serde_json::from_str(r#"{"cryptoId": "3", "targetPrice": 250.5}"#).unwrap();
        assert_eq!(request.crypto_id, Some(3));
        assert_eq!(request.target_price, Some(250.5));

        let request: AlertRequest = serde_json::from_str(r#"{"cryptoId": 1}"#).unwrap();
        assert_eq!(request.target_price, None);
    }

    #[test]
    fn alert_state_follows_triggered_flag() {
        let mut alert = PriceAlert {
            alert_id: 1,
            user_id: 1,
            crypto_id: 1,
            target_price: 10.0,
            is_triggered: false,
            created_at: Utc::now(),
        };
        assert_eq!(alert.state(), AlertState::Active);
        alert.is_triggered = true;
        assert_eq!(alert.state(), AlertState::Triggered);
    }
}
