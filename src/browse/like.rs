use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    AppResult, AppState, Config, Error,
    identity::Visitor,
    ledger::{LikeLedger, LikeOutcome},
};

#[derive(Serialize)]
struct LikeResponse {
    outcome: &'static str,
    likes: i64,
}

impl From<LikeOutcome> for LikeResponse {
    fn from(outcome: LikeOutcome) -> Self {
        let label = match outcome {
            LikeOutcome::Recorded { .. } => "recorded",
            LikeOutcome::AlreadyLiked { .. } => "already_liked",
        };
        Self { outcome: label, likes: outcome.likes() }
    }
}

/// The body is the bare joke id.
#[debug_handler(state = AppState)]
pub(crate) async fn like(
    State(ledger): State<Arc<LikeLedger>>,
    State(config): State<Arc<Config>>,
    Visitor(visitor): Visitor,
    body: String,
) -> AppResult<Response> {
    let joke_id: i64 = body.trim().parse().map_err(|_| Error::NotFound("joke"))?;
    let outcome = ledger.register_like(visitor.identity, joke_id).await?;

    let mut response = Json(LikeResponse::from(outcome)).into_response();
    if let Some(cookie) = visitor.set_cookie(config.cookie_secure) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}
