use crate::database::Repository;
use crate::database::crypto::CryptoRepository;
use crate::error::app_error::AppError;
use crate::models::crypto::{CryptoId, CryptoPrice, OhlcCandle};
use std::collections::BTreeMap;

pub const CRYPTO_NOT_FOUND: &str = "Crypto not found";

/// Read-only market data views.
pub struct MarketService<'a> {
    repository: &'a dyn Repository,
}

impl<'a> MarketService<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        MarketService { repository }
    }

    pub async fn latest_prices(&self) -> Result<Vec<CryptoPrice>, AppError> {
        self.repository.list_latest_prices().await
    }

    pub async fn price_history(&self, crypto_id: CryptoId) -> Result<Vec<CryptoPrice>, AppError> {
        let history = self.repository.get_price_history(crypto_id).await?;
        if history.is_empty() {
            return Err(AppError::NotFound(CRYPTO_NOT_FOUND.to_string()));
        }
        Ok(history)
    }

    pub async fn daily_candles(&self, crypto_id: CryptoId) -> Result<Vec<OhlcCandle>, AppError> {
        let history = self.price_history(crypto_id).await?;
        Ok(build_ohlc(&history))
    }
}

/// Groups samples into UTC calendar days, oldest day first. Open and close
/// are the earliest and latest samples of the day; samples sharing a
/// timestamp are ordered by row id.
pub fn build_ohlc(samples: &[CryptoPrice]) -> Vec<OhlcCandle> {
    let mut sorted: Vec<&CryptoPrice> = samples.iter().collect();
    sorted.sort_by_key(|s| (s.collection_time, s.id));

    let mut days: BTreeMap<_, OhlcCandle> = BTreeMap::new();
    for sample in sorted {
        let date = sample.collection_time.date_naive();
        days.entry(date)
            .and_modify(|candle| {
                candle.high = candle.high.max(sample.price_usd);
                candle.low = candle.low.min(sample.price_usd);
                candle.close = sample.price_usd;
            })
            .or_insert_with(|| OhlcCandle {
                crypto_id: sample.crypto_id,
                symbol: sample.symbol.clone(),
                date,
                open: sample.price_usd,
                high: sample.price_usd,
                low: sample.price_usd,
                close: sample.price_usd,
            });
    }

    days.into_values().collect()
}
