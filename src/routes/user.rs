use crate::auth::{CurrentUser, clear_session_cookie, session_cookie};
use crate::config::Config;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::user::{CheckResponse, LoginRequest, LoginResponse, MessageResponse, SignupRequest};
use crate::service::auth::AuthService;
use crate::service::session_token::SharedSessionTokens;
use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{State, routes};

#[rocket::post("/signup", data = "<payload>")]
pub async fn signup(repository: &State<SharedRepository>, payload: JsonBody<SignupRequest>) -> Result<(Status, Json<MessageResponse>), AppError> {
    AuthService::new(repository.inner().as_ref()).signup(&payload).await?;
    Ok((Status::Created, Json(MessageResponse::new("User registered successfully."))))
}

#[rocket::post("/login", data = "<payload>")]
pub async fn login(
    repository: &State<SharedRepository>,
    tokens: &State<SharedSessionTokens>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = AuthService::new(repository.inner().as_ref()).login(&payload).await?;
    let token = tokens.issue(&user.username)?;
    cookies.add(session_cookie(token, &config.session));

    tracing::info!(user_id = user.user_id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful.".to_string(),
        user_id: user.user_id,
    }))
}

#[rocket::get("/check")]
pub async fn check(current_user: CurrentUser) -> Json<CheckResponse> {
    Json(CheckResponse {
        is_authenticated: true,
        username: current_user.username,
    })
}

/// Clears the cookie only; the token itself stays valid until it expires.
#[rocket::post("/logout")]
pub async fn logout(cookies: &CookieJar<'_>) -> Json<MessageResponse> {
    clear_session_cookie(cookies);
    Json(MessageResponse::new("Logged out successfully"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![signup, login, check, logout]
}
