use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::models::crypto::{CryptoId, CryptoPrice, INVALID_CRYPTO_ID, OhlcCandle, parse_crypto_id};
use crate::service::market::MarketService;
use rocket::serde::json::Json;
use rocket::{State, routes};

fn crypto_id_param(raw: &str) -> Result<CryptoId, AppError> {
    parse_crypto_id(raw).ok_or_else(|| AppError::BadRequest(INVALID_CRYPTO_ID.to_string()))
}

#[rocket::get("/cryptos")]
pub async fn list_cryptos(repository: &State<SharedRepository>) -> Result<Json<Vec<CryptoPrice>>, AppError> {
    let prices = MarketService::new(repository.inner().as_ref()).latest_prices().await?;
    Ok(Json(prices))
}

#[rocket::get("/crypto/<crypto_id>")]
pub async fn get_crypto(repository: &State<SharedRepository>, crypto_id: &str) -> Result<Json<Vec<CryptoPrice>>, AppError> {
    let crypto_id = crypto_id_param(crypto_id)?;
    let history = MarketService::new(repository.inner().as_ref()).price_history(crypto_id).await?;
    Ok(Json(history))
}

#[rocket::get("/crypto/<crypto_id>/ohlc")]
pub async fn get_crypto_ohlc(repository: &State<SharedRepository>, crypto_id: &str) -> Result<Json<Vec<OhlcCandle>>, AppError> {
    let crypto_id = crypto_id_param(crypto_id)?;
    let candles = MarketService::new(repository.inner().as_ref()).daily_candles(crypto_id).await?;
    Ok(Json(candles))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_cryptos, get_crypto, get_crypto_ohlc]
}
