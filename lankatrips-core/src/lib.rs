pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pdf;
pub mod query;
pub mod repo;
pub mod response;

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;

/// Application state containing shared resources.
///
/// This struct holds the database connection pool and the immutable
/// configuration, and is cloned into every route handler.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db: PgPool,

    /// Configuration loaded once at startup
    pub config: Arc<Config>,
}
