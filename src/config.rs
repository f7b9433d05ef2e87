use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    ledger::{DEFAULT_PURGE_EVERY, Retention},
    listing::{FRONT_PAGE_TTL, Order},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Admin pages stay locked when unset.
    pub admin_password: Option<String>,
    pub like_purge_every: u64,
    pub like_retention_days: i64,
    pub front_page_order: Order,
    pub front_page_limit: u32,
    pub front_page_cache: Duration,
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://jokes.db?mode=rwc".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            admin_password: None,
            like_purge_every: DEFAULT_PURGE_EVERY,
            like_retention_days: 60,
            front_page_order: Order::FRONT_DEFAULT,
            front_page_limit: 20,
            front_page_cache: FRONT_PAGE_TTL,
            cookie_secure: false,
        }
    }
}

impl Config {
    /// Reads `.env` and the environment; unset variables keep their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(err) = dotenv::dotenv() {
            info!("no .env file loaded: {err}");
        }

        let defaults = Config::default();
        let admin_password = var("ADMIN_PASSWORD").filter(|p| !p.is_empty());
        if admin_password.is_none() {
            warn!("ADMIN_PASSWORD not set, moderation is locked");
        }

        Ok(Self {
            database_url: load("DATABASE_URL", defaults.database_url)?,
            bind_addr: load("BIND_ADDR", defaults.bind_addr)?,
            admin_password,
            like_purge_every: load("LIKE_PURGE_EVERY", defaults.like_purge_every)?,
            like_retention_days: retention_days(load(
                "LIKE_RETENTION_DAYS",
                defaults.like_retention_days,
            )?)?,
            front_page_order: Order::parse(
                var("FRONT_PAGE_ORDER").as_deref(),
                defaults.front_page_order,
            ),
            front_page_limit: load("FRONT_PAGE_LIMIT", defaults.front_page_limit)?,
            front_page_cache: Duration::from_secs(load(
                "FRONT_PAGE_CACHE_SECS",
                defaults.front_page_cache.as_secs(),
            )?),
            cookie_secure: load("COOKIE_SECURE", defaults.cookie_secure)?,
        })
    }

    pub fn retention(&self) -> Retention {
        Retention {
            window: time::Duration::days(self.like_retention_days),
            purge_every: self.like_purge_every,
        }
    }
}

/// About a century; far below the point where `time::Duration::days` overflows.
const MAX_RETENTION_DAYS: i64 = 36_500;

fn retention_days(days: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (1..=MAX_RETENTION_DAYS).contains(&days),
        "LIKE_RETENTION_DAYS must be between 1 and {MAX_RETENTION_DAYS}, got {days}"
    );
    Ok(days)
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value {value:?}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site() {
        let config = Config::default();
        assert_eq!(config.front_page_order, Order::Newest);
        assert_eq!(config.front_page_limit, 20);
        assert_eq!(config.front_page_cache, Duration::from_secs(3600));

        let retention = config.retention();
        assert_eq!(retention.window, time::Duration::days(60));
        assert_eq!(retention.purge_every, 10_000);
    }

    #[test]
    fn load_parses_or_fails() {
        // unique names keep parallel tests out of each other's way
        unsafe {
            env::set_var("JOKEBOX_TEST_LIMIT", " 5 ");
            env::set_var("JOKEBOX_TEST_BAD", "five");
        }
        assert_eq!(load("JOKEBOX_TEST_LIMIT", 20u32).unwrap(), 5);
        assert!(load("JOKEBOX_TEST_BAD", 20u32).is_err());
        assert_eq!(load("JOKEBOX_TEST_UNSET", 20u32).unwrap(), 20);
    }

    #[test]
    fn retention_must_be_a_sane_positive_window() {
        assert_eq!(retention_days(60).unwrap(), 60);
        assert_eq!(retention_days(1).unwrap(), 1);
        assert_eq!(retention_days(MAX_RETENTION_DAYS).unwrap(), MAX_RETENTION_DAYS);
        for days in [0, -1, MAX_RETENTION_DAYS + 1, i64::MAX] {
            assert!(retention_days(days).is_err(), "{days}");
        }
    }
}
