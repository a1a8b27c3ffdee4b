// src/client.rs
//
// Client-resident watchlist state, kept free of any UI framework: a toggle
// per displayed stock row that flips optimistically, confirms against the
// server and compensates on failure.
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{ActionResult, SessionUser, StockWithStatus};
use crate::watchlist::{Watchlist, WatchlistStore};

/// Observable state of one watchlist row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    NotWatched,
    Watched,
    Pending,
}

/// The two server calls a row can issue.
#[async_trait]
pub trait WatchlistActions: Send + Sync {
    async fn add(&self, symbol: &str, company: &str) -> ActionResult;
    async fn remove(&self, symbol: &str) -> ActionResult;
}

/// In-process adapter: the button talks straight to the repository with the
/// caller's session, mirroring how the page wires its actions.
pub struct ServerActions<S> {
    watchlist: Arc<Watchlist<S>>,
    session: Option<SessionUser>,
}

impl<S> ServerActions<S> {
    pub fn new(watchlist: Arc<Watchlist<S>>, session: Option<SessionUser>) -> Self {
        ServerActions { watchlist, session }
    }
}

#[async_trait]
impl<S: WatchlistStore + 'static> WatchlistActions for ServerActions<S> {
    async fn add(&self, symbol: &str, company: &str) -> ActionResult {
        self.watchlist.add(self.session.as_ref(), symbol, company).await
    }

    async fn remove(&self, symbol: &str) -> ActionResult {
        self.watchlist.remove(self.session.as_ref(), symbol).await
    }
}

/// Toast-style notification sink.
pub trait Notifier: Send {
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str, detail: &str);
}

/// One stock row's toggle. `toggle()` flips the displayed state before any
/// network confirmation, then reconciles: success notifies and refreshes
/// the view, failure rolls the flip back.
pub struct WatchlistButton<A, N> {
    symbol: String,
    company: String,
    added: bool,
    pending: bool,
    actions: A,
    notifier: N,
    on_change: Option<Box<dyn FnMut(&str, bool) + Send>>,
    on_refresh: Option<Box<dyn FnMut() + Send>>,
}

impl<A: WatchlistActions, N: Notifier> WatchlistButton<A, N> {
    pub fn new(
        symbol: impl Into<String>,
        company: impl Into<String>,
        is_in_watchlist: bool,
        actions: A,
        notifier: N,
    ) -> Self {
        WatchlistButton {
            symbol: symbol.into(),
            company: company.into(),
            added: is_in_watchlist,
            pending: false,
            actions,
            notifier,
            on_change: None,
            on_refresh: None,
        }
    }

    /// Called on confirmed membership changes so a sibling list can mark
    /// the same symbol without re-fetching.
    pub fn on_change(mut self, callback: impl FnMut(&str, bool) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Called after a confirmed change so server-rendered sibling data
    /// stays consistent.
    pub fn on_refresh(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_refresh = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> RowState {
        if self.pending {
            RowState::Pending
        } else if self.added {
            RowState::Watched
        } else {
            RowState::NotWatched
        }
    }

    pub fn is_added(&self) -> bool {
        self.added
    }

    pub fn label(&self) -> &'static str {
        if self.added {
            "Remove from Watchlist"
        } else {
            "Add to Watchlist"
        }
    }

    pub async fn toggle(&mut self) {
        let next = !self.added;
        // Optimistic flip, before any confirmation.
        self.added = next;
        self.pending = true;

        let result = if next {
            self.actions.add(&self.symbol, &self.company).await
        } else {
            self.actions.remove(&self.symbol).await
        };
        self.pending = false;

        if result.success {
            if let Some(callback) = self.on_change.as_mut() {
                callback(&self.symbol, next);
            }
            let message = if next {
                format!("Added {} to watchlist", self.symbol)
            } else {
                format!("Removed {} from watchlist", self.symbol)
            };
            self.notifier.success(&message);
            if let Some(refresh) = self.on_refresh.as_mut() {
                refresh();
            }
        } else {
            // Compensate: the server disagreed with the optimistic guess.
            self.added = !next;
            let message = if next {
                format!("Failed to add {}", self.symbol)
            } else {
                format!("Failed to remove {}", self.symbol)
            };
            let detail = result
                .error
                .unwrap_or_else(|| "Please try again later".to_string());
            self.notifier.error(&message, &detail);
        }
    }
}

/// Sibling search-list state: rows with membership flags, kept consistent
/// with the toggles without a re-fetch.
pub struct SearchList {
    stocks: Vec<StockWithStatus>,
}

impl SearchList {
    pub fn new(stocks: Vec<StockWithStatus>) -> Self {
        SearchList { stocks }
    }

    pub fn stocks(&self) -> &[StockWithStatus] {
        &self.stocks
    }

    pub fn mark(&mut self, symbol: &str, is_added: bool) {
        for stock in &mut self.stocks {
            if stock.symbol == symbol {
                stock.is_in_watchlist = is_added;
            }
        }
    }
}
