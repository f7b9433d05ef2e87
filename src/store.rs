//! Categories and jokes.
//!
//! Single-statement helpers take any sqlite executor so they can run either on
//! the pool or inside a caller's transaction.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    db::{Category, Joke},
    error::{Error, Result},
};

const JOKE_COLUMNS: &str = "id, text, reply, like_count, created_at, category_id";

pub async fn all_categories(db_pool: &SqlitePool) -> Result<Vec<Category>> {
    Ok(
        sqlx::query_as("SELECT id, name, slug FROM categories ORDER BY name, id")
            .fetch_all(db_pool)
            .await?,
    )
}

pub async fn category_by_id<'c, E>(db: E, id: i64) -> Result<Option<Category>>
where
    E: Executor<'c, Database = Sqlite>,
{
    Ok(
        sqlx::query_as("SELECT id, name, slug FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?,
    )
}

pub async fn category_by_slug(db_pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    Ok(
        sqlx::query_as("SELECT id, name, slug FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(db_pool)
            .await?,
    )
}

/// Slugs end up in urls: ascii letters, digits, `-` and `_` only.
pub fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Invalid(format!("slug {slug:?}")))
    }
}

pub async fn create_category<'c, E>(db: E, name: &str, slug: &str) -> Result<Category>
where
    E: Executor<'c, Database = Sqlite>,
{
    validate_slug(slug)?;

    sqlx::query_as("INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id, name, slug")
        .bind(name)
        .bind(slug)
        .fetch_one(db)
        .await
        .map_err(|err| {
            if Error::is_unique_violation(&err) {
                Error::Conflict(format!("slug {slug:?} is taken"))
            } else {
                Error::Storage(err)
            }
        })
}

pub struct NewJoke<'a> {
    pub text: &'a str,
    pub reply: Option<&'a str>,
    pub category_id: i64,
    /// Unix seconds.
    pub created_at: i64,
}

/// Inserts with `like_count = 0`. The category is left to the caller to check.
pub async fn insert_joke<'c, E>(db: E, joke: NewJoke<'_>) -> Result<Joke>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO jokes (text, reply, like_count, created_at, category_id) \
         VALUES (?, ?, 0, ?, ?) RETURNING {JOKE_COLUMNS}"
    );
    Ok(
        sqlx::query_as(&sql)
            .bind(joke.text)
            .bind(joke.reply)
            .bind(joke.created_at)
            .bind(joke.category_id)
            .fetch_one(db)
            .await?,
    )
}

/// Inserts a joke if its category exists, in one statement.
#[cfg(test)]
pub(crate) async fn publish(db_pool: &SqlitePool, joke: NewJoke<'_>) -> Result<Joke> {
    let sql = format!(
        "INSERT INTO jokes (text, reply, like_count, created_at, category_id) \
         SELECT ?, ?, 0, ?, ? WHERE EXISTS (SELECT 1 FROM categories WHERE id = ?) \
         RETURNING {JOKE_COLUMNS}"
    );
    sqlx::query_as(&sql)
        .bind(joke.text)
        .bind(joke.reply)
        .bind(joke.created_at)
        .bind(joke.category_id)
        .bind(joke.category_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(Error::NotFound("category"))
}

pub async fn joke_by_id(db_pool: &SqlitePool, id: i64) -> Result<Option<Joke>> {
    let sql = format!("SELECT {JOKE_COLUMNS} FROM jokes WHERE id = ?");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(db_pool).await?)
}

/// The joke with the next higher id in the same category.
pub async fn next_in_category(db_pool: &SqlitePool, joke: &Joke) -> Result<Option<Joke>> {
    let sql = format!(
        "SELECT {JOKE_COLUMNS} FROM jokes WHERE id > ? AND category_id = ? ORDER BY id ASC LIMIT 1"
    );
    Ok(
        sqlx::query_as(&sql)
            .bind(joke.id)
            .bind(joke.category_id)
            .fetch_optional(db_pool)
            .await?,
    )
}

/// The joke with the next lower id in the same category.
pub async fn prev_in_category(db_pool: &SqlitePool, joke: &Joke) -> Result<Option<Joke>> {
    let sql = format!(
        "SELECT {JOKE_COLUMNS} FROM jokes WHERE id < ? AND category_id = ? ORDER BY id DESC LIMIT 1"
    );
    Ok(
        sqlx::query_as(&sql)
            .bind(joke.id)
            .bind(joke.category_id)
            .fetch_optional(db_pool)
            .await?,
    )
}
