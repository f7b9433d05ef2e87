//! Visitor submissions waiting for an operator.

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    db::{Category, Joke, ProposedJoke},
    error::{Error, Result},
    store::{self, NewJoke},
};

/// Queues a joke. Content is taken as is; empty text is fine.
pub async fn submit(
    db_pool: &SqlitePool,
    text: &str,
    reply: Option<&str>,
    proposed_category: Option<&str>,
) -> Result<ProposedJoke> {
    let proposed: ProposedJoke = sqlx::query_as(
        "INSERT INTO proposed_jokes (text, reply, proposed_category) VALUES (?, ?, ?) \
         RETURNING id, text, reply, proposed_category",
    )
    .bind(text)
    .bind(reply)
    .bind(proposed_category)
    .fetch_one(db_pool)
    .await?;

    info!(id = proposed.id, "joke submitted");
    Ok(proposed)
}

pub async fn list_proposed(db_pool: &SqlitePool) -> Result<Vec<ProposedJoke>> {
    Ok(
        sqlx::query_as("SELECT id, text, reply, proposed_category FROM proposed_jokes ORDER BY id")
            .fetch_all(db_pool)
            .await?,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryTarget {
    Existing(i64),
    New { name: String, slug: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub category: CategoryTarget,
    /// Replaces the submitted text when set.
    pub text: Option<String>,
    /// Replaces the submitted reply when set.
    pub reply: Option<String>,
}

impl From<CategoryTarget> for Promotion {
    fn from(category: CategoryTarget) -> Self {
        Self { category, text: None, reply: None }
    }
}

/// Publishes a proposal and removes it from the queue, all or nothing.
///
/// Opens with the delete so the transaction holds the write lock from its
/// first statement.
pub async fn promote(
    db_pool: &SqlitePool,
    proposed_id: i64,
    promotion: impl Into<Promotion>,
) -> Result<Joke> {
    let Promotion { category, text, reply } = promotion.into();
    let mut tx = db_pool.begin().await?;

    let proposed: ProposedJoke = sqlx::query_as(
        "DELETE FROM proposed_jokes WHERE id = ? \
         RETURNING id, text, reply, proposed_category",
    )
    .bind(proposed_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::NotFound("proposed joke"))?;

    let category: Category = match category {
        CategoryTarget::Existing(id) => store::category_by_id(&mut *tx, id)
            .await?
            .ok_or(Error::NotFound("category"))?,
        CategoryTarget::New { name, slug } => store::create_category(&mut *tx, &name, &slug).await?,
    };

    let text = text.unwrap_or(proposed.text);
    let reply = reply.or(proposed.reply);
    let joke = store::insert_joke(
        &mut *tx,
        NewJoke {
            text: &text,
            reply: reply.as_deref(),
            category_id: category.id,
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        },
    )
    .await?;

    tx.commit().await?;
    info!(proposed_id, joke_id = joke.id, category = %category.slug, "joke promoted");
    Ok(joke)
}

pub async fn reject(db_pool: &SqlitePool, proposed_id: i64) -> Result<()> {
    let removed = sqlx::query("DELETE FROM proposed_jokes WHERE id = ?")
        .bind(proposed_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(Error::NotFound("proposed joke"));
    }

    info!(proposed_id, "joke rejected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn accepts_anything() {
        let db_pool = db::open_in_memory().await.unwrap();
        let empty = submit(&db_pool, "", None, None).await.unwrap();
        let full = submit(&db_pool, "Knock knock", Some("Who's there?"), Some("Doors")).await.unwrap();

        assert_eq!(list_proposed(&db_pool).await.unwrap(), [empty, full.clone()]);
        assert_eq!(full.reply.as_deref(), Some("Who's there?"));
        assert_eq!(full.proposed_category.as_deref(), Some("Doors"));
    }

    #[tokio::test]
    async fn promote_into_existing_category() {
        let db_pool = db::open_in_memory().await.unwrap();
        let puns = store::create_category(&db_pool, "Puns", "puns").await.unwrap();
        let proposed = submit(&db_pool, "I'm reading a book on anti-gravity", None, None).await.unwrap();

        let joke = promote(&db_pool, proposed.id, CategoryTarget::Existing(puns.id)).await.unwrap();
        assert_eq!(joke.text, proposed.text);
        assert_eq!(joke.category_id, puns.id);
        assert_eq!(joke.like_count, 0);
        assert!(list_proposed(&db_pool).await.unwrap().is_empty());
        assert_eq!(store::joke_by_id(&db_pool, joke.id).await.unwrap(), Some(joke));
    }

    #[tokio::test]
    async fn promote_with_edits() {
        let db_pool = db::open_in_memory().await.unwrap();
        let puns = store::create_category(&db_pool, "Puns", "puns").await.unwrap();
        let proposed = submit(&db_pool, "typo'd jkoe", Some("reply"), None).await.unwrap();

        let joke = promote(
            &db_pool,
            proposed.id,
            Promotion {
                category: CategoryTarget::Existing(puns.id),
                text: Some("fixed joke".to_owned()),
                reply: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(joke.text, "fixed joke");
        assert_eq!(joke.reply.as_deref(), Some("reply"));
    }

    #[tokio::test]
    async fn failed_promotion_keeps_proposal() {
        let db_pool = db::open_in_memory().await.unwrap();
        store::create_category(&db_pool, "Animals", "animals").await.unwrap();
        let proposed = submit(&db_pool, "a duck walks into a bar", None, None).await.unwrap();

        let taken = CategoryTarget::New { name: "Animals".to_owned(), slug: "animals".to_owned() };
        let err = promote(&db_pool, proposed.id, taken).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{err:?}");

        let err = promote(&db_pool, proposed.id, CategoryTarget::Existing(999)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("category")));

        assert_eq!(list_proposed(&db_pool).await.unwrap(), [proposed]);
    }

    #[tokio::test]
    async fn unknown_proposals() {
        let db_pool = db::open_in_memory().await.unwrap();
        let puns = store::create_category(&db_pool, "Puns", "puns").await.unwrap();

        let err = promote(&db_pool, 7, CategoryTarget::Existing(puns.id)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("proposed joke")));
        assert!(matches!(reject(&db_pool, 7).await, Err(Error::NotFound("proposed joke"))));
    }

    #[tokio::test]
    async fn reject_removes_once() {
        let db_pool = db::open_in_memory().await.unwrap();
        let proposed = submit(&db_pool, "meh", None, None).await.unwrap();

        reject(&db_pool, proposed.id).await.unwrap();
        assert!(list_proposed(&db_pool).await.unwrap().is_empty());
        assert!(matches!(reject(&db_pool, proposed.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn promote_waits_for_a_busy_writer() {
        let path = std::env::temp_dir().join(format!("jokebox-{}.db", uuid::Uuid::new_v4()));
        let db_pool = db::connect(&format!("sqlite://{}?mode=rwc", path.display()), 4)
            .await
            .unwrap();
        let puns = store::create_category(&db_pool, "Puns", "puns").await.unwrap();
        let proposed = submit(&db_pool, "pun under load", None, None).await.unwrap();

        let mut writer = db_pool.acquire().await.unwrap();
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *writer).await.unwrap();
        sqlx::query("INSERT INTO proposed_jokes (text) VALUES ('busy')")
            .execute(&mut *writer)
            .await
            .unwrap();

        let pool = db_pool.clone();
        let promoting = tokio::spawn(async move {
            promote(&pool, proposed.id, CategoryTarget::Existing(puns.id)).await
        });
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        sqlx::query("COMMIT").execute(&mut *writer).await.unwrap();
        drop(writer);

        let joke = promoting.await.unwrap().unwrap();
        assert_eq!(joke.text, "pun under load");
        let queue = list_proposed(&db_pool).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].text, "busy");

        db_pool.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
