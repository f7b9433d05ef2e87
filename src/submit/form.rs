use axum::{Form, debug_handler, extract::State, response::Html};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{AppResult, AppState, include_res, moderation, non_blank, res, store};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitForm {
    #[serde(default)]
    text: String,
    reply: Option<String>,
    category: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn submit_page(State(db_pool): State<SqlitePool>) -> AppResult<Html<String>> {
    let categories = store::all_categories(&db_pool).await?;
    Ok(res::page(
        &format!("Submit a joke | {}", res::SITE_TITLE),
        &categories,
        include_res!(str, "/pages/submit.html"),
    ))
}

#[debug_handler(state = AppState)]
pub(crate) async fn submit(
    State(db_pool): State<SqlitePool>,
    Form(SubmitForm { text, reply, category }): Form<SubmitForm>,
) -> AppResult<Html<String>> {
    let reply = non_blank(reply);
    let category = non_blank(category);
    moderation::submit(&db_pool, &text, reply.as_deref(), category.as_deref()).await?;

    let categories = store::all_categories(&db_pool).await?;
    Ok(res::page(
        &format!("Thanks | {}", res::SITE_TITLE),
        &categories,
        include_res!(str, "/pages/submit_success.html"),
    ))
}
