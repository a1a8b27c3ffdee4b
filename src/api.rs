// src/api.rs
use std::sync::Arc;

use log::info;
use serde::Deserialize;
use warp::{Filter, Rejection, Reply};

use crate::auth;
use crate::models::{AddRequest, SessionUser};
use crate::search::{self, SearchClient};
use crate::watchlist::{Watchlist, WatchlistStore};

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

pub fn routes<S>(
    watchlist: Arc<Watchlist<S>>,
    search: Arc<SearchClient>,
    jwt_secret: Arc<String>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone
where
    S: WatchlistStore + 'static,
{
    let symbols = warp::path!("watchlist" / "symbols")
        .and(warp::get())
        .and(with_watchlist(watchlist.clone()))
        .and(auth::with_session(jwt_secret.clone()))
        .and_then(list_symbols_handler);

    let list = warp::path!("watchlist")
        .and(warp::get())
        .and(with_watchlist(watchlist.clone()))
        .and(auth::with_session(jwt_secret.clone()))
        .and_then(list_entries_handler);

    let add = warp::path!("watchlist")
        .and(warp::post())
        .and(with_watchlist(watchlist.clone()))
        .and(auth::with_session(jwt_secret.clone()))
        .and(warp::body::json())
        .and_then(add_handler);

    let remove = warp::path!("watchlist" / String)
        .and(warp::delete())
        .and(with_watchlist(watchlist.clone()))
        .and(auth::with_session(jwt_secret.clone()))
        .and_then(remove_handler);

    let search_route = warp::path!("search")
        .and(warp::get())
        .and(with_watchlist(watchlist))
        .and(with_search(search))
        .and(auth::with_session(jwt_secret))
        .and(warp::query::<SearchParams>())
        .and_then(search_handler);

    symbols.or(list).or(add).or(remove).or(search_route)
}

fn with_watchlist<S>(
    watchlist: Arc<Watchlist<S>>,
) -> impl Filter<Extract = (Arc<Watchlist<S>>,), Error = std::convert::Infallible> + Clone
where
    S: WatchlistStore + 'static,
{
    warp::any().map(move || watchlist.clone())
}

fn with_search(
    search: Arc<SearchClient>,
) -> impl Filter<Extract = (Arc<SearchClient>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || search.clone())
}

// Every route derives identity from the bearer token. Anonymous reads get
// an empty list; anonymous writes get the repository's error result.

async fn list_symbols_handler<S: WatchlistStore>(
    watchlist: Arc<Watchlist<S>>,
    session: Option<SessionUser>,
) -> Result<impl Reply, Rejection> {
    let email = session.map(|user| user.email).unwrap_or_default();
    let symbols = watchlist.list_symbols(&email).await;
    Ok(warp::reply::json(&symbols))
}

async fn list_entries_handler<S: WatchlistStore>(
    watchlist: Arc<Watchlist<S>>,
    session: Option<SessionUser>,
) -> Result<impl Reply, Rejection> {
    let email = session.map(|user| user.email).unwrap_or_default();
    let entries = watchlist.list_entries(&email).await;
    Ok(warp::reply::json(&entries))
}

async fn add_handler<S: WatchlistStore>(
    watchlist: Arc<Watchlist<S>>,
    session: Option<SessionUser>,
    body: AddRequest,
) -> Result<impl Reply, Rejection> {
    let result = watchlist
        .add(session.as_ref(), &body.symbol, &body.company)
        .await;
    if result.success {
        info!("Added {} to watchlist", body.symbol.to_uppercase());
    }
    Ok(warp::reply::json(&result))
}

async fn remove_handler<S: WatchlistStore>(
    symbol: String,
    watchlist: Arc<Watchlist<S>>,
    session: Option<SessionUser>,
) -> Result<impl Reply, Rejection> {
    let result = watchlist.remove(session.as_ref(), &symbol).await;
    if result.success {
        info!("Removed {} from watchlist", symbol.to_uppercase());
    }
    Ok(warp::reply::json(&result))
}

async fn search_handler<S: WatchlistStore>(
    watchlist: Arc<Watchlist<S>>,
    search: Arc<SearchClient>,
    session: Option<SessionUser>,
    params: SearchParams,
) -> Result<impl Reply, Rejection> {
    let stocks = search.search(&params.q).await;
    let watched = match &session {
        Some(user) => watchlist.list_symbols(&user.email).await,
        None => Vec::new(),
    };
    Ok(warp::reply::json(&search::decorate(stocks, &watched)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;
    use crate::models::{ActionResult, StockWithStatus, WatchlistEntry};
    use crate::watchlist::testing::MemoryStore;

    const SECRET: &str = "test-secret";

    fn api(
        store: MemoryStore,
    ) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        routes(
            Arc::new(Watchlist::new(store)),
            Arc::new(SearchClient::new("demo".to_string())),
            Arc::new(SECRET.to_string()),
        )
    }

    fn bearer(email: &str) -> String {
        let user = SessionUser {
            id: "u1".to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
        };
        format!("Bearer {}", create_token(&user, SECRET).unwrap())
    }

    #[tokio::test]
    async fn add_without_token_is_not_authenticated() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));

        let response = warp::test::request()
            .method("POST")
            .path("/watchlist")
            .json(&serde_json::json!({"symbol": "AAPL", "company": "Apple Inc."}))
            .reply(&api)
            .await;

        assert_eq!(response.status(), 200);
        let result: ActionResult = serde_json::from_slice(response.body()).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("User not authenticated"));
    }

    #[tokio::test]
    async fn add_then_list_symbols() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));
        let token = bearer("u1@x.com");

        let response = warp::test::request()
            .method("POST")
            .path("/watchlist")
            .header("authorization", token.as_str())
            .json(&serde_json::json!({"symbol": "aapl", "company": "Apple Inc."}))
            .reply(&api)
            .await;
        let result: ActionResult = serde_json::from_slice(response.body()).unwrap();
        assert!(result.success);

        let response = warp::test::request()
            .method("GET")
            .path("/watchlist/symbols")
            .header("authorization", token.as_str())
            .reply(&api)
            .await;
        let symbols: Vec<String> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn list_entries_carries_company_and_timestamp() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));
        let token = bearer("u1@x.com");

        warp::test::request()
            .method("POST")
            .path("/watchlist")
            .header("authorization", token.as_str())
            .json(&serde_json::json!({"symbol": "NVDA", "company": "NVIDIA Corporation"}))
            .reply(&api)
            .await;

        let response = warp::test::request()
            .method("GET")
            .path("/watchlist")
            .header("authorization", token.as_str())
            .reply(&api)
            .await;
        let entries: Vec<WatchlistEntry> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "NVDA");
        assert_eq!(entries[0].company, "NVIDIA Corporation");
        assert_eq!(entries[0].user_id, "u1");
    }

    #[tokio::test]
    async fn anonymous_reads_are_empty() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));

        let response = warp::test::request()
            .method("GET")
            .path("/watchlist")
            .reply(&api)
            .await;
        let entries: Vec<WatchlistEntry> = serde_json::from_slice(response.body()).unwrap();
        assert!(entries.is_empty());

        let response = warp::test::request()
            .method("GET")
            .path("/watchlist/symbols")
            .reply(&api)
            .await;
        let symbols: Vec<String> = serde_json::from_slice(response.body()).unwrap();
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn delete_canonicalizes_and_is_idempotent() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));
        let token = bearer("u1@x.com");

        warp::test::request()
            .method("POST")
            .path("/watchlist")
            .header("authorization", token.as_str())
            .json(&serde_json::json!({"symbol": "AAPL", "company": "Apple Inc."}))
            .reply(&api)
            .await;

        for _ in 0..2 {
            let response = warp::test::request()
                .method("DELETE")
                .path("/watchlist/aapl")
                .header("authorization", token.as_str())
                .reply(&api)
                .await;
            let result: ActionResult = serde_json::from_slice(response.body()).unwrap();
            assert!(result.success);
        }

        let response = warp::test::request()
            .method("GET")
            .path("/watchlist/symbols")
            .header("authorization", token.as_str())
            .reply(&api)
            .await;
        let symbols: Vec<String> = serde_json::from_slice(response.body()).unwrap();
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn empty_search_is_decorated_trending() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));
        let token = bearer("u1@x.com");

        warp::test::request()
            .method("POST")
            .path("/watchlist")
            .header("authorization", token.as_str())
            .json(&serde_json::json!({"symbol": "AAPL", "company": "Apple Inc."}))
            .reply(&api)
            .await;

        let response = warp::test::request()
            .method("GET")
            .path("/search")
            .header("authorization", token.as_str())
            .reply(&api)
            .await;
        let stocks: Vec<StockWithStatus> = serde_json::from_slice(response.body()).unwrap();
        assert!(!stocks.is_empty());
        for stock in &stocks {
            assert_eq!(stock.is_in_watchlist, stock.symbol == "AAPL", "{}", stock.symbol);
        }
    }

    #[tokio::test]
    async fn forged_token_gets_no_session() {
        let api = api(MemoryStore::with_user("u1@x.com", "u1"));
        let user = SessionUser {
            id: "u1".to_string(),
            name: "Test User".to_string(),
            email: "u1@x.com".to_string(),
        };
        let forged = format!("Bearer {}", create_token(&user, "wrong-secret").unwrap());

        let response = warp::test::request()
            .method("POST")
            .path("/watchlist")
            .header("authorization", forged.as_str())
            .json(&serde_json::json!({"symbol": "AAPL", "company": "Apple Inc."}))
            .reply(&api)
            .await;
        let result: ActionResult = serde_json::from_slice(response.body()).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("User not authenticated"));
    }
}
