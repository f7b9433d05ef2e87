use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    // unique: slug
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Joke {
    pub id: i64,
    pub text: String,
    pub reply: Option<String>,
    /// Maintained by [`crate::ledger::LikeLedger`] only.
    pub like_count: i64,
    /// Unix seconds.
    pub created_at: i64,
    pub category_id: i64,
}

impl Joke {
    /// First few characters of the joke, for page titles.
    pub fn headline(&self) -> String {
        let mut head: String = self.text.chars().take(15).collect();
        head.push_str("...");
        head
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LikeRecord {
    pub identity: Vec<u8>,
    pub joke_id: i64,
    /// Unix seconds.
    pub liked_at: i64,
    // unique: identity, joke_id
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProposedJoke {
    pub id: i64,
    pub text: String,
    pub reply: Option<String>,
    pub proposed_category: Option<String>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS jokes (
    id          INTEGER PRIMARY KEY,
    text        TEXT NOT NULL,
    reply       TEXT,
    like_count  INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    created_at  INTEGER NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id)
);
CREATE INDEX IF NOT EXISTS jokes_by_category ON jokes(category_id, id);

CREATE TABLE IF NOT EXISTS liked (
    identity BLOB NOT NULL,
    joke_id  INTEGER NOT NULL REFERENCES jokes(id),
    liked_at INTEGER NOT NULL,
    PRIMARY KEY (identity, joke_id)
);
CREATE INDEX IF NOT EXISTS liked_by_age ON liked(liked_at);

CREATE TABLE IF NOT EXISTS proposed_jokes (
    id                INTEGER PRIMARY KEY,
    text              TEXT NOT NULL,
    reply             TEXT,
    proposed_category TEXT
);
"#;

/// Creates any missing tables. Safe to run on every start.
pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(db_pool).await?;
    Ok(())
}

pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

/// A migrated private database that lives as long as the pool.
///
/// Pinned to one connection that is never recycled, since every sqlite
/// memory connection is its own database.
pub async fn open_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}
