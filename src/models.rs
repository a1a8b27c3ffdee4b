// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (user, symbol) membership fact. `company` is a denormalized display
/// name supplied at add-time; `added_at` is set once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub symbol: String,
    pub company: String,
    pub added_at: DateTime<Utc>,
}

/// The authenticated identity extracted from a session token. User records
/// are owned by the external auth provider; this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

/// A search result decorated with watchlist membership for the requesting
/// user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockWithStatus {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub is_in_watchlist: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRequest {
    pub symbol: String,
    pub company: String,
}

/// Wire result of the write operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        ActionResult {
            success: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ActionResult {
            success: false,
            error: Some(message.into()),
        }
    }
}
