use crate::models::health::HealthResponse;
use rocket::routes;
use rocket::serde::json::Json;

#[rocket::get("/")]
pub async fn index() -> &'static str {
    "Welcome to the Crypto Tracker API"
}

#[rocket::get("/health")]
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index, healthcheck]
}
