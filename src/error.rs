// src/error.rs
use std::fmt;

/// Storage-side failures. `Configuration` is fatal at startup, `Connection`
/// is transient and retried on the next call, `Query` covers everything the
/// database reports after a connection exists.
#[derive(Debug)]
pub enum StoreError {
    Configuration(String),
    Connection(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            StoreError::Connection(msg) => write!(f, "connection error: {}", msg),
            StoreError::Query(msg) => write!(f, "query error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Operation-level failures of the watchlist repository. These are reduced
/// to `{success, error}` results at the operation boundary; storage details
/// never reach the caller.
#[derive(Debug)]
pub enum WatchlistError {
    NotAuthenticated,
    UserNotFound,
    Validation(&'static str),
    Store(StoreError),
}

impl fmt::Display for WatchlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchlistError::NotAuthenticated => write!(f, "User not authenticated"),
            WatchlistError::UserNotFound => write!(f, "User not found"),
            WatchlistError::Validation(msg) => write!(f, "{}", msg),
            WatchlistError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WatchlistError {}

impl From<StoreError> for WatchlistError {
    fn from(e: StoreError) -> Self {
        WatchlistError::Store(e)
    }
}
