use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, AppState, Error, include_res,
    db::{Category, ProposedJoke},
    moderation::{self, CategoryTarget, Promotion},
    non_blank, res, store,
};

use super::is_admin;

#[debug_handler(state = AppState)]
pub(crate) async fn dashboard(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let categories = store::all_categories(&db_pool).await?;
    let title = format!("Moderation | {}", res::SITE_TITLE);
    if !is_admin(&session).await? {
        return Ok(res::page(&title, &categories, include_res!(str, "/pages/password.html")));
    }

    let proposed = moderation::list_proposed(&db_pool).await?;
    let category_options: String = categories
        .iter()
        .map(|c| format!(r#"<option value="{}">"#, res::escape(&c.name)))
        .collect();
    let proposed: String = if proposed.is_empty() {
        r#"<p class="empty">The queue is empty.</p>"#.to_owned()
    } else {
        proposed.iter().map(|p| proposed_item(p, &categories)).collect()
    };

    let body = include_res!(str, "/pages/admin.html")
        .replace("{category_options}", &category_options)
        .replace("{proposed}", &proposed);
    Ok(res::page(&title, &categories, &body))
}

fn proposed_item(proposed: &ProposedJoke, categories: &[Category]) -> String {
    let suggested = proposed.proposed_category.as_deref().unwrap_or("");
    let category_select: String = std::iter::once(r#"<option value="">-</option>"#.to_owned())
        .chain(categories.iter().map(|c| {
            // preselect the category the visitor suggested, if it exists
            let selected = if c.name.eq_ignore_ascii_case(suggested.trim()) { " selected" } else { "" };
            format!(r#"<option value="{}"{selected}>{}</option>"#, c.id, res::escape(&c.name))
        }))
        .collect();

    include_res!(str, "/pages/proposed_item.html")
        .replace("{category_select}", &category_select)
        .replace("{proposed_category}", &res::escape(suggested))
        .replace("{id}", &proposed.id.to_string())
        .replace("{reply}", &res::escape(proposed.reply.as_deref().unwrap_or("")))
        .replace("{text}", &res::escape(&proposed.text))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromoteForm {
    proposed: String,
    text: Option<String>,
    reply: Option<String>,
    category_id: Option<String>,
    new_category: Option<String>,
    slug: Option<String>,
}

impl PromoteForm {
    fn target(&self) -> Result<CategoryTarget, Error> {
        if let Some(name) = non_blank(self.new_category.clone()) {
            let slug = self.slug.as_deref().unwrap_or("").trim().to_owned();
            return Ok(CategoryTarget::New { name: name.trim().to_owned(), slug });
        }
        self.category_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
            .map(CategoryTarget::Existing)
            .ok_or_else(|| Error::Invalid("pick a category or name a new one".to_owned()))
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn promote(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<PromoteForm>,
) -> AppResult<Response> {
    if !is_admin(&session).await? {
        return Ok(Redirect::to("/admin").into_response());
    }

    let proposed_id = parse_id(&form.proposed)?;
    let promotion = Promotion {
        category: form.target()?,
        text: non_blank(form.text),
        reply: non_blank(form.reply),
    };
    moderation::promote(&db_pool, proposed_id, promotion).await?;
    Ok(Redirect::to("/admin").into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectForm {
    proposed: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn reject(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RejectForm { proposed }): Form<RejectForm>,
) -> AppResult<Response> {
    if !is_admin(&session).await? {
        return Ok(Redirect::to("/admin").into_response());
    }

    moderation::reject(&db_pool, parse_id(&proposed)?).await?;
    Ok(Redirect::to("/admin").into_response())
}

fn parse_id(id: &str) -> Result<i64, Error> {
    id.trim().parse().map_err(|_| Error::NotFound("proposed joke"))
}
