pub mod error;
pub mod mock;
pub mod movie;
pub mod runtime;

use std::{fmt::Display, future::Future, str::FromStr as _, time::Duration};

pub use error::Error;
use flicks_types::config::DbConfig;
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const MAX_LIMIT: usize = 10_000;

/// Upper bound for any single store operation, including waiting for a pooled connection.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn new_pool(config: &DbConfig) -> Result<Pool> {
    let options = SqliteConnectOptions::from_str(&config.database_url())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.max_idle_conns())
        .idle_timeout(config.max_idle_time)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &Pool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

pub(crate) async fn bounded<T, F>(operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, operation)
        .await
        .unwrap_or_else(|_| {
            debug!("Store operation timed out after {:?}", QUERY_TIMEOUT);
            Err(Error::Timeout(QUERY_TIMEOUT))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc(s) => write!(f, "{}", s),
            Order::Desc(s) => write!(f, "{} DESC", s),
        }
    }
}

impl AsRef<str> for Order {
    fn as_ref(&self) -> &str {
        match self {
            Order::Asc(s) => s.as_str(),
            Order::Desc(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingParams {
    pub offset: i64,
    pub limit: i64,
    pub order: Option<Vec<Order>>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT as i64,
            order: None,
        }
    }
}

impl ListingParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            order: None,
        }
    }

    pub fn with_order(mut self, order: Vec<Order>) -> Self {
        self.order = Some(order);
        self
    }

    /// ORDER BY clause body for the requested ordering; `id` is appended when missing
    /// so that pages are stable.
    pub fn ordering(&self, valid_fields: &[&str]) -> Result<String> {
        let orders = self.order.as_deref().unwrap_or_default();
        let mut ordering = orders
            .iter()
            .map(|o| {
                if valid_fields.contains(&o.as_ref()) {
                    Ok(o.to_string())
                } else {
                    Err(Error::InvalidOrderByField(o.as_ref().to_string()))
                }
            })
            .collect::<Result<Vec<String>>>()?;

        if !orders.iter().any(|o| o.as_ref() == "id") {
            ordering.push("id".to_string());
        }
        Ok(ordering.join(", "))
    }
}

/// One page of a listing together with the total number of matching records.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub offset: i64,
    pub limit: i64,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Batch<T> {
    pub fn empty(params: &ListingParams) -> Self {
        Self {
            offset: params.offset,
            limit: params.limit,
            total: 0,
            rows: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["id", "title", "year"];

    #[test]
    fn test_default_ordering() {
        let params = ListingParams::default();
        assert_eq!("id", params.ordering(FIELDS).unwrap());
    }

    #[test]
    fn test_ordering_id_tiebreak() {
        let params = ListingParams::default().with_order(vec![
            Order::Desc("year".to_string()),
            Order::Asc("title".to_string()),
        ]);
        assert_eq!("year DESC, title, id", params.ordering(FIELDS).unwrap());

        let params = ListingParams::default().with_order(vec![
            Order::Desc("id".to_string()),
            Order::Asc("title".to_string()),
        ]);
        assert_eq!("id DESC, title", params.ordering(FIELDS).unwrap());
    }

    #[test]
    fn test_invalid_order_field() {
        let params =
            ListingParams::default().with_order(vec![Order::Asc("genres; DROP".to_string())]);
        assert!(matches!(
            params.ordering(FIELDS),
            Err(Error::InvalidOrderByField(f)) if f == "genres; DROP"
        ));
    }
}
