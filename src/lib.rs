//! A small joke site: categories, anonymous likes and a moderation queue.
//!
//! The storage-facing parts (`store`, `ledger`, `listing`, `moderation`) take
//! an explicit [`SqlitePool`] and know nothing about http. The `browse`,
//! `submit` and `admin` modules are the axum front end on top of them.

pub mod admin;
pub mod appresult;
pub mod browse;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod listing;
pub mod moderation;
pub mod res;
pub mod session;
pub mod store;
pub mod submit;

use std::sync::Arc;

use axum::{Router, extract::FromRef, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use error::{Error, Result};

use ledger::LikeLedger;
use listing::FrontPageCache;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub ledger: Arc<LikeLedger>,
    pub front_page: Arc<FrontPageCache>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            ledger: Arc::new(LikeLedger::new(db_pool.clone(), config.retention())),
            front_page: Arc::new(FrontPageCache::new(config.front_page_cache)),
            config: Arc::new(config),
            db_pool,
        }
    }
}

pub fn app(app_state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(app_state.config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(1)));

    Router::new()
        .merge(browse::router())
        .merge(submit::router())
        .merge(admin::router())
        .fallback(not_found)
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, res::not_found())
}

/// Blank form fields count as missing.
pub(crate) fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}
