use crate::auth::CurrentUser;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{Data, Response};
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Set on every response, including catcher output.
const SECURITY_HEADERS: [(&str, &str); 3] = [("X-Content-Type-Options", "nosniff"), ("X-Frame-Options", "DENY"), ("Cache-Control", "no-store")];

/// Correlation id attached to every request and echoed as `X-Request-Id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn generate() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

/// Id assigned by [`RequestLogger`], or `"unknown"` outside the fairing.
pub(crate) fn request_id_of(request: &Request<'_>) -> String {
    request
        .local_cache(|| None::<RequestId>)
        .as_ref()
        .map_or_else(|| "unknown".to_string(), |id| id.0.clone())
}

/// Username cached by the session guard, or `"anonymous"`.
pub(crate) fn username_of(request: &Request<'_>) -> String {
    request
        .local_cache(|| None::<CurrentUser>)
        .as_ref()
        .map_or_else(|| "anonymous".to_string(), |user| user.username.clone())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestId {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cached = request.local_cache(|| None::<RequestId>).clone();
        Outcome::Success(cached.unwrap_or_else(RequestId::generate))
    }
}

/// Assigns the request id, logs each request with its outcome and the
/// caller's username, and stamps the response headers.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::generate();
        info!(request_id = %request_id.0, method = %request.method(), uri = %request.uri(), "incoming request");
        request.local_cache(|| Some(request_id));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request_id_of(request);
        let username = username_of(request);
        let status = response.status();

        response.set_header(Header::new(REQUEST_ID_HEADER, request_id.clone()));
        for (name, value) in SECURITY_HEADERS {
            response.set_header(Header::new(name, value));
        }

        if status.code >= 400 {
            warn!(
                request_id = %request_id,
                username = %username,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                "request failed"
            );
        } else {
            info!(
                request_id = %request_id,
                username = %username,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                "request served"
            );
        }
    }
}
