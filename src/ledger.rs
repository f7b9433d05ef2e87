//! Who liked what.
//!
//! The ledger owns the `liked` table and is the only writer of
//! `jokes.like_count`. A like is recorded at most once per identity and joke:
//! the `(identity, joke_id)` primary key decides which of several racing
//! requests wins, and the counter moves in the same transaction.

use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    identity::Identity,
};

pub const DEFAULT_RETENTION: time::Duration = time::Duration::days(60);
pub const DEFAULT_PURGE_EVERY: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Recorded { likes: i64 },
    AlreadyLiked { likes: i64 },
}

impl LikeOutcome {
    pub fn likes(&self) -> i64 {
        match *self {
            LikeOutcome::Recorded { likes } | LikeOutcome::AlreadyLiked { likes } => likes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Retention {
    /// Records older than this may be purged.
    pub window: time::Duration,
    /// Purge after this many recorded likes; 0 never purges.
    pub purge_every: u64,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            window: DEFAULT_RETENTION,
            purge_every: DEFAULT_PURGE_EVERY,
        }
    }
}

pub struct LikeLedger {
    db_pool: SqlitePool,
    retention: Retention,
    recorded: AtomicU64,
}

impl LikeLedger {
    pub fn new(db_pool: SqlitePool, retention: Retention) -> Self {
        Self {
            db_pool,
            retention,
            recorded: AtomicU64::new(0),
        }
    }

    pub async fn has_liked(&self, identity: Identity, joke_id: i64) -> Result<bool> {
        Ok(
            sqlx::query("SELECT 1 FROM liked WHERE identity = ? AND joke_id = ?")
                .bind(&identity.as_bytes()[..])
                .bind(joke_id)
                .fetch_optional(&self.db_pool)
                .await?
                .is_some(),
        )
    }

    pub async fn register_like(&self, identity: Identity, joke_id: i64) -> Result<LikeOutcome> {
        self.register_like_at(identity, joke_id, OffsetDateTime::now_utc()).await
    }

    /// [`register_like`](Self::register_like) with an explicit like time.
    pub async fn register_like_at(
        &self,
        identity: Identity,
        joke_id: i64,
        at: OffsetDateTime,
    ) -> Result<LikeOutcome> {
        let mut tx = self.db_pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO liked (identity, joke_id, liked_at) \
             SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM jokes WHERE id = ?) \
             ON CONFLICT (identity, joke_id) DO NOTHING",
        )
        .bind(&identity.as_bytes()[..])
        .bind(joke_id)
        .bind(at.unix_timestamp())
        .bind(joke_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let outcome = if inserted == 1 {
            let (likes,): (i64,) = sqlx::query_as(
                "UPDATE jokes SET like_count = like_count + 1 WHERE id = ? RETURNING like_count",
            )
            .bind(joke_id)
            .fetch_one(&mut *tx)
            .await?;
            LikeOutcome::Recorded { likes }
        } else {
            let Some((likes,)): Option<(i64,)> =
                sqlx::query_as("SELECT like_count FROM jokes WHERE id = ?")
                    .bind(joke_id)
                    .fetch_optional(&mut *tx)
                    .await?
            else {
                return Err(Error::NotFound("joke"));
            };
            LikeOutcome::AlreadyLiked { likes }
        };

        tx.commit().await?;
        debug!(%identity, joke_id, ?outcome, "like");

        if let LikeOutcome::Recorded { .. } = outcome {
            self.count_recorded().await;
        }
        Ok(outcome)
    }

    /// Deletes records liked before `now - retention`. Counters keep their value.
    pub async fn purge_expired(
        &self,
        now: OffsetDateTime,
        retention: time::Duration,
    ) -> Result<u64> {
        let cutoff = (now - retention).unix_timestamp();
        Ok(
            sqlx::query("DELETE FROM liked WHERE liked_at < ?")
                .bind(cutoff)
                .execute(&self.db_pool)
                .await?
                .rows_affected(),
        )
    }

    #[cfg(test)]
    pub(crate) async fn records(&self, joke_id: i64) -> Result<Vec<crate::db::LikeRecord>> {
        Ok(
            sqlx::query_as(
                "SELECT identity, joke_id, liked_at FROM liked WHERE joke_id = ? ORDER BY liked_at",
            )
            .bind(joke_id)
            .fetch_all(&self.db_pool)
            .await?,
        )
    }

    /// Exactly one caller sees each multiple of `purge_every`, so concurrent
    /// likes neither skip nor repeat a purge.
    async fn count_recorded(&self) {
        let every = self.retention.purge_every;
        if every == 0 {
            return;
        }

        let count = self.recorded.fetch_add(1, Ordering::AcqRel) + 1;
        if count % every != 0 {
            return;
        }

        match self
            .purge_expired(OffsetDateTime::now_utc(), self.retention.window)
            .await
        {
            Ok(removed) => info!(removed, "purged expired likes"),
            Err(err) => warn!("failed to purge expired likes: {err}"),
        }
    }
}
