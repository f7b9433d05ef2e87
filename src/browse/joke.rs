use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, State},
    response::Html,
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState, Error,
    identity::KnownVisitor,
    ledger::LikeLedger,
    listing::{self, ListedJoke},
    res, store,
};

#[debug_handler(state = AppState)]
pub(crate) async fn joke(
    State(db_pool): State<SqlitePool>,
    State(ledger): State<Arc<LikeLedger>>,
    KnownVisitor(identity): KnownVisitor,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id: i64 = id.parse().map_err(|_| Error::NotFound("joke"))?;
    let joke = store::joke_by_id(&db_pool, id)
        .await?
        .ok_or(Error::NotFound("joke"))?;
    let category = store::category_by_id(&db_pool, joke.category_id)
        .await?
        .ok_or(Error::NotFound("category"))?;
    let neighbors = listing::neighbors(&db_pool, &joke).await?;

    let mut items = [ListedJoke { joke, category: Arc::new(category), liked: false }];
    listing::annotate(&ledger, identity, &mut items).await?;
    let [item] = items;

    let categories = store::all_categories(&db_pool).await?;
    let title = format!("Joke: {} | {}", item.joke.headline(), res::SITE_TITLE);
    Ok(res::page(&title, &categories, &res::joke_page(&item, &neighbors)))
}
