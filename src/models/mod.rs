pub mod alert;
pub mod crypto;
pub mod favorite;
pub mod health;
pub mod user;
