mod form;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/submit", get(form::submit_page).post(form::submit))
}
