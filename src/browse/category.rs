use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::Html,
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState, Error,
    identity::KnownVisitor,
    ledger::LikeLedger,
    listing::{self, Order},
    res, store,
};

use super::OrderQuery;

#[debug_handler(state = AppState)]
pub(crate) async fn category(
    State(db_pool): State<SqlitePool>,
    State(ledger): State<Arc<LikeLedger>>,
    KnownVisitor(identity): KnownVisitor,
    Path(slug): Path<String>,
    Query(OrderQuery { orderby }): Query<OrderQuery>,
) -> AppResult<Html<String>> {
    let category = store::category_by_slug(&db_pool, &slug)
        .await?
        .ok_or(Error::NotFound("category"))?;

    let order = Order::parse(orderby.as_deref(), Order::CATEGORY_DEFAULT);
    let mut jokes = listing::list(&db_pool, Some(category.id), order, None).await?;
    listing::annotate(&ledger, identity, &mut jokes).await?;

    let categories = store::all_categories(&db_pool).await?;
    let title = format!("{} - {}", category.name, res::SITE_TITLE);
    Ok(res::page(&title, &categories, &res::category_page(&category, order, &jokes)))
}
