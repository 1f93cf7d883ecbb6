use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 50))]
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(rename = "userID")]
    pub user_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub is_authenticated: bool,
    pub username: String,
}

/// Returns the trimmed value when present and non-empty.
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the value untouched when present and non-empty. Passwords go
/// through this one so whitespace stays part of the secret.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(required(&None), None);
        assert_eq!(required(&Some("   ".to_string())), None);
        assert_eq!(required(&Some(" john ".to_string())), Some("john"));
    }

    #[test]
    fn present_keeps_surrounding_whitespace() {
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some(String::new())), None);
        assert_eq!(present(&Some(" pw ".to_string())), Some(" pw "));
    }

    #[test]
    fn signup_validation_rejects_malformed_email() {
        let request = SignupRequest {
            username: Some("john".to_string()),
            password: Some("pw".to_string()),
            email: Some("not-an-email".to_string()),
        };
        assert!(request.validate().is_err());

        let request = SignupRequest {
            email: Some("j@x.com".to_string()),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn login_response_uses_wire_field_names() {
        let body = serde_json::to_value(LoginResponse {
            message: "Login successful.".to_string(),
            user_id: 7,
        })
        .unwrap();
        assert_eq!(body["userID"], 7);

        let body = serde_json::to_value(CheckResponse {
            is_authenticated: true,
            username: "john".to_string(),
        })
        .unwrap();
        assert_eq!(body["isAuthenticated"], true);
    }
}
