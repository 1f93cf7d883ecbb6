pub mod alert_scanner;
pub mod auth;
pub mod email;
pub mod market;
pub mod password;
pub mod session_token;
pub mod watchlist;
