//! Ordered views over published jokes.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    db::{Category, Joke},
    error::{Error, Result},
    identity::Identity,
    ledger::LikeLedger,
    store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Newest,
    Oldest,
    MostLiked,
    Random,
}

impl Order {
    /// Category pages lead with the favourites.
    pub const CATEGORY_DEFAULT: Order = Order::MostLiked;
    /// The front page leads with the latest additions.
    pub const FRONT_DEFAULT: Order = Order::Newest;

    /// Reads an `orderby` value. Absent or unknown values give `default`.
    pub fn parse(value: Option<&str>, default: Order) -> Order {
        match value.map(str::trim) {
            Some("newer" | "newest") => Order::Newest,
            Some("older" | "oldest") => Order::Oldest,
            Some("likes" | "most-liked" | "most_liked") => Order::MostLiked,
            Some("random") => Order::Random,
            _ => default,
        }
    }

    /// The value [`Order::parse`] reads back, as used in page links.
    pub fn as_param(&self) -> &'static str {
        match self {
            Order::Newest => "newer",
            Order::Oldest => "older",
            Order::MostLiked => "likes",
            Order::Random => "random",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Order::Newest => " ORDER BY created_at DESC, id DESC",
            Order::Oldest => " ORDER BY created_at ASC, id ASC",
            Order::MostLiked => " ORDER BY like_count DESC, id DESC",
            Order::Random => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedJoke {
    pub joke: Joke,
    pub category: Arc<Category>,
    /// Filled in by [`annotate`].
    pub liked: bool,
}

/// Lists jokes, optionally within one category. A `limit` of `None` or 0 is unbounded.
pub async fn list(
    db_pool: &SqlitePool,
    category_id: Option<i64>,
    order: Order,
    limit: Option<u32>,
) -> Result<Vec<ListedJoke>> {
    let limit = limit.filter(|&n| n > 0);

    let scoped = match category_id {
        Some(id) => Some(Arc::new(
            store::category_by_id(db_pool, id)
                .await?
                .ok_or(Error::NotFound("category"))?,
        )),
        None => None,
    };

    let mut sql = "SELECT id, text, reply, like_count, created_at, category_id FROM jokes".to_owned();
    if scoped.is_some() {
        sql += " WHERE category_id = ?";
    }
    sql += order.sql();
    // random samples from the whole set before truncating
    if order != Order::Random {
        sql += " LIMIT ?";
    }

    let mut query = sqlx::query_as::<_, Joke>(&sql);
    if let Some(category) = &scoped {
        query = query.bind(category.id);
    }
    if order != Order::Random {
        query = query.bind(limit.map_or(-1, i64::from));
    }
    let mut jokes = query.fetch_all(db_pool).await?;

    if order == Order::Random {
        jokes.shuffle(&mut rand::rng());
        if let Some(limit) = limit {
            jokes.truncate(limit as usize);
        }
    }

    let mut categories: HashMap<i64, Arc<Category>> = HashMap::new();
    if let Some(category) = &scoped {
        categories.insert(category.id, category.clone());
    }

    let mut listed = Vec::with_capacity(jokes.len());
    for joke in jokes {
        let category = match categories.get(&joke.category_id) {
            Some(category) => category.clone(),
            None => {
                let category = Arc::new(
                    store::category_by_id(db_pool, joke.category_id)
                        .await?
                        .ok_or(Error::NotFound("category"))?,
                );
                categories.insert(category.id, category.clone());
                category
            }
        };
        listed.push(ListedJoke { joke, category, liked: false });
    }

    Ok(listed)
}

/// Marks the jokes `identity` has liked. Without an identity nothing is liked.
pub async fn annotate(
    ledger: &LikeLedger,
    identity: Option<Identity>,
    jokes: &mut [ListedJoke],
) -> Result<()> {
    let Some(identity) = identity else {
        return Ok(());
    };
    for item in jokes {
        item.liked = ledger.has_liked(identity, item.joke.id).await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub prev: Option<Joke>,
    pub next: Option<Joke>,
}

pub async fn neighbors(db_pool: &SqlitePool, joke: &Joke) -> Result<Neighbors> {
    Ok(Neighbors {
        prev: store::prev_in_category(db_pool, joke).await?,
        next: store::next_in_category(db_pool, joke).await?,
    })
}

pub const FRONT_PAGE_TTL: Duration = Duration::from_secs(60 * 60);

/// Single slot holding the unscoped random front page.
///
/// Staleness is the only key. Whoever first finds the slot stale refreshes it
/// while holding the lock; requests arriving meanwhile wait and reuse the result.
pub struct FrontPageCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<Vec<ListedJoke>>)>>,
}

impl FrontPageCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: Mutex::new(None) }
    }

    /// The cached page, refreshed with `limit` random jokes when stale.
    pub async fn random(&self, db_pool: &SqlitePool, limit: Option<u32>) -> Result<Arc<Vec<ListedJoke>>> {
        self.get_or_refresh(|| list(db_pool, None, Order::Random, limit)).await
    }

    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<Vec<ListedJoke>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ListedJoke>>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some((refreshed, jokes)) = slot.as_ref() {
            if refreshed.elapsed() < self.ttl {
                return Ok(jokes.clone());
            }
        }

        let jokes = Arc::new(refresh().await?);
        debug!(jokes = jokes.len(), "refreshed front page");
        *slot = Some((Instant::now(), jokes.clone()));
        Ok(jokes)
    }
}

impl Default for FrontPageCache {
    fn default() -> Self {
        Self::new(FRONT_PAGE_TTL)
    }
}
