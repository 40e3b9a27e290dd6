pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod password;
pub mod route;
pub mod schema;
pub mod session;
pub mod store;
pub mod token;
pub mod view;

use sqlx::SqlitePool;

use crate::{config::Config, token::TokenKeys};

// Struct representing the application state
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenKeys,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl),
            cookie_secure: config.cookie_secure,
        }
    }
}
