pub mod alert;
pub mod crypto;
pub mod favorite;
pub mod postgres_repository;
pub mod user;

use std::sync::Arc;

/// Everything the handlers and the alert scanner need from the store.
pub trait Repository: user::UserRepository + favorite::FavoriteRepository + alert::AlertRepository + crypto::CryptoRepository {}

impl<T> Repository for T where T: user::UserRepository + favorite::FavoriteRepository + alert::AlertRepository + crypto::CryptoRepository {}

pub type SharedRepository = Arc<dyn Repository>;
