// src/db.rs
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use scylla::{frame::response::result::CqlValue, query::Query, Session, SessionBuilder};
use tokio::sync::OnceCell;

use crate::error::StoreError;
use crate::models::WatchlistEntry;
use crate::watchlist::WatchlistStore;

/// Single cached handle with one in-flight init shared across tasks. A
/// failed init leaves the slot empty so the next caller dials again.
struct Lazy<T> {
    cell: OnceCell<T>,
}

impl<T: Clone> Lazy<T> {
    fn new() -> Self {
        Lazy {
            cell: OnceCell::new(),
        }
    }

    async fn get_or_dial<F, Fut>(&self, dial: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let value = self.cell.get_or_try_init(dial).await?;
        Ok(value.clone())
    }
}

/// Lazily established, process-lifetime connection to ScyllaDB. Constructed
/// once in `main` and handed to the store, rather than living in a global.
pub struct Connector {
    uri: String,
    handle: Lazy<Arc<Session>>,
}

impl Connector {
    pub fn new(uri: impl Into<String>) -> Self {
        Connector {
            uri: uri.into(),
            handle: Lazy::new(),
        }
    }

    pub async fn session(&self) -> Result<Arc<Session>, StoreError> {
        self.handle
            .get_or_dial(|| async {
                let session = SessionBuilder::new()
                    .known_node(&self.uri)
                    .build()
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                init_schema(&session).await?;
                info!("Connected to ScyllaDB at {}", self.uri);
                Ok(Arc::new(session))
            })
            .await
    }
}

async fn init_schema(session: &Session) -> Result<(), StoreError> {
    session
        .query(
            "CREATE KEYSPACE IF NOT EXISTS stock_watchlist WITH REPLICATION = {'class': 'SimpleStrategy', 'replication_factor': 1}",
            &[],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
    // The auth service owns the user table; this service only reads it to
    // resolve email -> user_id.
    session
        .query(
            "CREATE TABLE IF NOT EXISTS stock_watchlist.users (email TEXT PRIMARY KEY, user_id TEXT, name TEXT)",
            &[],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
    session
        .query(
            "CREATE TABLE IF NOT EXISTS stock_watchlist.watchlist_entries (user_id TEXT, symbol TEXT, company TEXT, added_at TIMESTAMP, PRIMARY KEY (user_id, symbol))",
            &[],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
    Ok(())
}

pub struct ScyllaStore {
    connector: Connector,
}

impl ScyllaStore {
    pub fn new(connector: Connector) -> Self {
        ScyllaStore { connector }
    }
}

#[async_trait]
impl WatchlistStore for ScyllaStore {
    async fn find_user_id(&self, email: &str) -> Result<Option<String>, StoreError> {
        let session = self.connector.session().await?;
        let query = Query::new("SELECT user_id FROM stock_watchlist.users WHERE email = ?");
        let result = session
            .query(query, (email,))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let user_id = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|row| {
                row.columns[0]
                    .as_ref()
                    .and_then(|v| v.as_text())
                    .map(|s| s.to_string())
            });
        Ok(user_id.filter(|id| !id.is_empty()))
    }

    async fn symbols_for_user(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let session = self.connector.session().await?;
        let query =
            Query::new("SELECT symbol FROM stock_watchlist.watchlist_entries WHERE user_id = ?");
        let result = session
            .query(query, (user_id,))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let symbols = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                row.columns[0]
                    .as_ref()
                    .and_then(|v| v.as_text())
                    .map(|s| s.to_string())
            })
            .collect();
        Ok(symbols)
    }

    async fn entries_for_user(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let session = self.connector.session().await?;
        let query = Query::new(
            "SELECT symbol, company, added_at FROM stock_watchlist.watchlist_entries WHERE user_id = ?",
        );
        let result = session
            .query(query, (user_id,))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let entries = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                let symbol = row.columns[0]
                    .as_ref()
                    .and_then(|v| v.as_text())
                    .map(|s| s.to_string());
                let company = row.columns[1]
                    .as_ref()
                    .and_then(|v| v.as_text())
                    .map(|s| s.to_string());
                let added_at = row.columns[2].as_ref().and_then(|v| match v {
                    CqlValue::Timestamp(ts) => {
                        DateTime::<Utc>::from_timestamp_millis(ts.num_milliseconds())
                    }
                    _ => None,
                });
                match (symbol, company, added_at) {
                    (Some(symbol), Some(company), Some(added_at)) => Some(WatchlistEntry {
                        user_id: user_id.to_string(),
                        symbol,
                        company,
                        added_at,
                    }),
                    _ => {
                        error!("Malformed watchlist row for user {}", user_id);
                        None
                    }
                }
            })
            .collect();
        Ok(entries)
    }

    async fn insert_if_absent(&self, entry: &WatchlistEntry) -> Result<bool, StoreError> {
        let session = self.connector.session().await?;
        // Conditional insert: concurrent duplicate adds collapse to one row
        // regardless of timing.
        let query = Query::new(
            "INSERT INTO stock_watchlist.watchlist_entries (user_id, symbol, company, added_at) VALUES (?, ?, ?, ?) IF NOT EXISTS",
        );
        let result = session
            .query(
                query,
                (
                    entry.user_id.as_str(),
                    entry.symbol.as_str(),
                    entry.company.as_str(),
                    entry.added_at.timestamp_millis(),
                ),
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        // The LWT result carries [applied] in its first column.
        let applied = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|row| {
                row.columns[0].as_ref().and_then(|v| match v {
                    CqlValue::Boolean(b) => Some(*b),
                    _ => None,
                })
            })
            .unwrap_or(true);
        Ok(applied)
    }

    async fn delete_entry(&self, user_id: &str, symbol: &str) -> Result<(), StoreError> {
        let session = self.connector.session().await?;
        let query = Query::new(
            "DELETE FROM stock_watchlist.watchlist_entries WHERE user_id = ? AND symbol = ?",
        );
        session
            .query(query, (user_id, symbol))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }
}
