//! Operator pages. Everything past the login form requires the session flag
//! set by [`login::login`].

mod login;
mod moderate;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{AppResult, AppState, session::IS_ADMIN};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(moderate::dashboard))
        .route("/admin/login", post(login::login))
        .route("/admin/logout", get(login::logout))
        .route("/admin/promote", post(moderate::promote))
        .route("/admin/reject", post(moderate::reject))
}

pub(crate) async fn is_admin(session: &Session) -> AppResult<bool> {
    Ok(session.get::<bool>(IS_ADMIN).await?.unwrap_or(false))
}
