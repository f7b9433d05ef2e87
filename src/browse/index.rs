use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State},
    response::Html,
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState, Config, include_res,
    identity::KnownVisitor,
    ledger::LikeLedger,
    listing::{self, FrontPageCache, Order},
    res, store,
};

use super::OrderQuery;

/// Front page. Random order is served from the hourly cache.
#[debug_handler(state = AppState)]
pub(crate) async fn index(
    State(db_pool): State<SqlitePool>,
    State(ledger): State<Arc<LikeLedger>>,
    State(front_page): State<Arc<FrontPageCache>>,
    State(config): State<Arc<Config>>,
    KnownVisitor(identity): KnownVisitor,
    Query(OrderQuery { orderby }): Query<OrderQuery>,
) -> AppResult<Html<String>> {
    let order = Order::parse(orderby.as_deref(), config.front_page_order);
    let limit = Some(config.front_page_limit);

    let mut jokes = match order {
        Order::Random => front_page.random(&db_pool, limit).await?.as_ref().clone(),
        _ => listing::list(&db_pool, None, order, limit).await?,
    };
    listing::annotate(&ledger, identity, &mut jokes).await?;

    let categories = store::all_categories(&db_pool).await?;
    let body = include_res!(str, "/pages/index.html").replace("{jokes}", &res::joke_list(&jokes));
    Ok(res::page(res::SITE_TITLE, &categories, &body))
}
