use crate::error::app_error::ErrorBody;
use rocket::serde::json::Json;
use rocket::{Request, catch, catchers};

fn body(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody { error: message.to_string() })
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorBody> {
    body("Bad request")
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorBody> {
    body("Unauthorized")
}

#[catch(403)]
pub fn forbidden(_: &Request) -> Json<ErrorBody> {
    body("Forbidden")
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorBody> {
    body("Not found")
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<ErrorBody> {
    body("Conflict")
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> Json<ErrorBody> {
    body("Payload too large")
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorBody> {
    body("Unprocessable entity")
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorBody> {
    body("Internal server error")
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![bad_request, unauthorized, forbidden, not_found, conflict, payload_too_large, unprocessable_entity, internal_error]
}
