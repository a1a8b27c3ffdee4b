// src/main.rs
use std::sync::Arc;

use env_logger::Builder;
use log::{error, info, LevelFilter};

use stock_watchlist::api;
use stock_watchlist::config::Config;
use stock_watchlist::db::{Connector, ScyllaStore};
use stock_watchlist::search::SearchClient;
use stock_watchlist::watchlist::Watchlist;

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Debug)
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    let connector = Connector::new(config.scylla_uri.clone());
    // Warm the connection up front; if the database is down the next
    // request dials again.
    match connector.session().await {
        Ok(_) => info!("Connected to database..."),
        Err(e) => error!("Database not reachable yet, retrying on demand: {}", e),
    }

    info!("Starting the stock watchlist application...");
    let watchlist = Arc::new(Watchlist::new(ScyllaStore::new(connector)));
    let search = Arc::new(SearchClient::new(config.market_api_key.clone()));
    let jwt_secret = Arc::new(config.jwt_secret.clone());

    let api = api::routes(watchlist, search, jwt_secret);

    info!("Server running on http://127.0.0.1:{}", config.port);
    warp::serve(api).run(([127, 0, 0, 1], config.port)).await;
}
