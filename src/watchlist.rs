// src/watchlist.rs
use async_trait::async_trait;
use chrono::Utc;
use log::error;

use crate::error::{StoreError, WatchlistError};
use crate::models::{ActionResult, SessionUser, WatchlistEntry};

/// Storage seam for watchlist membership. `insert_if_absent` must be atomic
/// for a given (user_id, symbol) pair: concurrent duplicate adds end up as
/// one row.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn find_user_id(&self, email: &str) -> Result<Option<String>, StoreError>;
    async fn symbols_for_user(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
    async fn entries_for_user(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError>;
    async fn insert_if_absent(&self, entry: &WatchlistEntry) -> Result<bool, StoreError>;
    async fn delete_entry(&self, user_id: &str, symbol: &str) -> Result<(), StoreError>;
}

pub struct Watchlist<S> {
    store: S,
}

impl<S: WatchlistStore> Watchlist<S> {
    pub fn new(store: S) -> Self {
        Watchlist { store }
    }

    /// Looks up the externally-owned user record. Unknown or empty email is
    /// `None`, not an error.
    pub async fn resolve_user_id(&self, email: &str) -> Result<Option<String>, StoreError> {
        if email.is_empty() {
            return Ok(None);
        }
        self.store.find_user_id(email).await
    }

    /// Uppercase symbols currently watched. Read failures are logged and
    /// degrade to an empty list; the caller cannot tell them apart from an
    /// empty watchlist.
    pub async fn list_symbols(&self, email: &str) -> Vec<String> {
        match self.try_list_symbols(email).await {
            Ok(symbols) => symbols,
            Err(e) => {
                error!("Failed to list watchlist symbols for {}: {}", email, e);
                Vec::new()
            }
        }
    }

    async fn try_list_symbols(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let user_id = match self.resolve_user_id(email).await? {
            Some(user_id) => user_id,
            None => return Ok(Vec::new()),
        };
        self.store.symbols_for_user(&user_id).await
    }

    /// Full entries including the denormalized company name. Same failure
    /// policy as `list_symbols`.
    pub async fn list_entries(&self, email: &str) -> Vec<WatchlistEntry> {
        match self.try_list_entries(email).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to list watchlist entries for {}: {}", email, e);
                Vec::new()
            }
        }
    }

    async fn try_list_entries(&self, email: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let user_id = match self.resolve_user_id(email).await? {
            Some(user_id) => user_id,
            None => return Ok(Vec::new()),
        };
        self.store.entries_for_user(&user_id).await
    }

    /// Adds a symbol for the session's own user. Re-adding an existing
    /// symbol is a success; the stored row stays untouched.
    pub async fn add(
        &self,
        session: Option<&SessionUser>,
        symbol: &str,
        company: &str,
    ) -> ActionResult {
        match self.try_add(session, symbol, company).await {
            Ok(()) => ActionResult::ok(),
            Err(WatchlistError::Store(e)) => {
                error!("Failed to add {} to watchlist: {}", symbol, e);
                ActionResult::fail("Failed to add to watchlist")
            }
            Err(e) => ActionResult::fail(e.to_string()),
        }
    }

    async fn try_add(
        &self,
        session: Option<&SessionUser>,
        symbol: &str,
        company: &str,
    ) -> Result<(), WatchlistError> {
        if symbol.is_empty() || company.is_empty() {
            return Err(WatchlistError::Validation("Symbol and company are required"));
        }
        let session = session.ok_or(WatchlistError::NotAuthenticated)?;
        let user_id = self
            .resolve_user_id(&session.email)
            .await?
            .ok_or(WatchlistError::UserNotFound)?;

        let entry = WatchlistEntry {
            user_id,
            symbol: symbol.to_uppercase(),
            company: company.to_string(),
            added_at: Utc::now(),
        };
        self.store.insert_if_absent(&entry).await?;
        Ok(())
    }

    /// Removes a symbol for the session's own user. Deleting a symbol that
    /// is not present is a success.
    pub async fn remove(&self, session: Option<&SessionUser>, symbol: &str) -> ActionResult {
        match self.try_remove(session, symbol).await {
            Ok(()) => ActionResult::ok(),
            Err(WatchlistError::Store(e)) => {
                error!("Failed to remove {} from watchlist: {}", symbol, e);
                ActionResult::fail("Failed to remove from watchlist")
            }
            Err(e) => ActionResult::fail(e.to_string()),
        }
    }

    async fn try_remove(
        &self,
        session: Option<&SessionUser>,
        symbol: &str,
    ) -> Result<(), WatchlistError> {
        if symbol.is_empty() {
            return Err(WatchlistError::Validation("Symbol is required"));
        }
        let session = session.ok_or(WatchlistError::NotAuthenticated)?;
        let user_id = self
            .resolve_user_id(&session.email)
            .await?
            .ok_or(WatchlistError::UserNotFound)?;

        self.store
            .delete_entry(&user_id, &symbol.to_uppercase())
            .await?;
        Ok(())
    }
}
