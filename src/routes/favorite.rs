use crate::auth::CurrentUser;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::crypto::{INVALID_CRYPTO_ID, parse_crypto_id};
use crate::models::favorite::{FavoriteCrypto, FavoriteRequest};
use crate::models::user::MessageResponse;
use crate::service::watchlist::WatchlistService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};

#[rocket::post("/favorites", data = "<payload>")]
pub async fn add_favorite(
    repository: &State<SharedRepository>,
    current_user: CurrentUser,
    payload: JsonBody<FavoriteRequest>,
) -> Result<(Status, Json<MessageResponse>), AppError> {
    WatchlistService::new(repository.inner().as_ref())
        .add_favorite(&current_user.username, payload.crypto_id)
        .await?;
    Ok((Status::Created, Json(MessageResponse::new("Added to favorites."))))
}

#[rocket::get("/favorites")]
pub async fn list_favorites(repository: &State<SharedRepository>, current_user: CurrentUser) -> Result<Json<Vec<FavoriteCrypto>>, AppError> {
    let favorites = WatchlistService::new(repository.inner().as_ref()).list_favorites(&current_user.username).await?;
    Ok(Json(favorites))
}

#[rocket::delete("/favorites/<crypto_id>")]
pub async fn remove_favorite(repository: &State<SharedRepository>, current_user: CurrentUser, crypto_id: &str) -> Result<Json<MessageResponse>, AppError> {
    let crypto_id = parse_crypto_id(crypto_id).ok_or_else(|| AppError::BadRequest(INVALID_CRYPTO_ID.to_string()))?;
    WatchlistService::new(repository.inner().as_ref())
        .remove_favorite(&current_user.username, crypto_id)
        .await?;
    Ok(Json(MessageResponse::new("Removed from favorites.")))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![add_favorite, list_favorites, remove_favorite]
}
