use crate::auth::CurrentUser;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::alert::{AlertRequest, AlertWithCrypto};
use crate::models::user::MessageResponse;
use crate::service::watchlist::WatchlistService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};

#[rocket::post("/alerts", data = "<payload>")]
pub async fn create_alert(
    repository: &State<SharedRepository>,
    current_user: CurrentUser,
    payload: JsonBody<AlertRequest>,
) -> Result<(Status, Json<MessageResponse>), AppError> {
    let alert = WatchlistService::new(repository.inner().as_ref())
        .create_alert(&current_user.username, payload.crypto_id, payload.target_price)
        .await?;

    tracing::info!(alert_id = alert.alert_id, crypto_id = alert.crypto_id, "price alert created");
    Ok((Status::Created, Json(MessageResponse::new("Alert created successfully."))))
}

#[rocket::get("/alerts")]
pub async fn list_alerts(repository: &State<SharedRepository>, current_user: CurrentUser) -> Result<Json<Vec<AlertWithCrypto>>, AppError> {
    let alerts = WatchlistService::new(repository.inner().as_ref()).list_alerts(&current_user.username).await?;
    Ok(Json(alerts))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![create_alert, list_alerts]
}
