use crate::config::SessionConfig;
use crate::error::app_error::AppError;
use crate::service::session_token::SharedSessionTokens;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use serde::Serialize;

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub username: String,
}

/// Builds the httpOnly session cookie carrying a freshly issued token.
/// Its lifetime matches the token's.
pub(crate) fn session_cookie(token: String, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .path("/")
        .max_age(rocket::time::Duration::seconds(config.token_ttl_seconds))
        .build()
}

pub(crate) fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/"));
}

fn unauthorized() -> RequestOutcome<CurrentUser, AppError> {
    Outcome::Error((Status::Unauthorized, AppError::Unauthorized))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(cookie) = req.cookies().get(SESSION_COOKIE) else {
            return unauthorized();
        };

        let tokens = match req.rocket().state::<SharedSessionTokens>() {
            Some(tokens) => tokens,
            None => return Outcome::Error((Status::InternalServerError, AppError::token("Session tokens not configured"))),
        };

        match tokens.verify(cookie.value()) {
            Ok(claims) => {
                let current_user = CurrentUser { username: claims.username };
                req.local_cache(|| Some(current_user.clone()));
                Outcome::Success(current_user)
            }
            Err(_) => {
                tracing::debug!(uri = %req.uri(), "Rejected session token");
                unauthorized()
            }
        }
    }
}
