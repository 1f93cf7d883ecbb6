pub mod alert;
pub mod cron;
pub mod crypto;
pub mod error;
pub mod favorite;
pub mod health;
pub mod user;
