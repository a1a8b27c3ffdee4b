// src/search.rs
use std::collections::HashSet;

use log::error;
use reqwest::Client;
use serde::Deserialize;

use crate::models::{StockMatch, StockWithStatus};

// Served for an empty query, before the user has typed anything.
const TRENDING: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "United States"),
    ("MSFT", "Microsoft Corporation", "United States"),
    ("GOOGL", "Alphabet Inc.", "United States"),
    ("AMZN", "Amazon.com Inc.", "United States"),
    ("NVDA", "NVIDIA Corporation", "United States"),
    ("TSLA", "Tesla Inc.", "United States"),
    ("META", "Meta Platforms Inc.", "United States"),
    ("ABNB", "Airbnb Inc.", "United States"),
    ("ADBE", "Adobe Inc.", "United States"),
    ("NFLX", "Netflix Inc.", "United States"),
];

#[derive(Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "4. region")]
    region: String,
}

// Rate-limit replies carry no "bestMatches" key at all; the default makes
// them parse as zero results.
#[derive(Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SymbolMatch>,
}

pub struct SearchClient {
    client: Client,
    api_key: String,
}

impl SearchClient {
    pub fn new(api_key: String) -> Self {
        SearchClient {
            client: Client::new(),
            api_key,
        }
    }

    /// Proxies the provider's symbol search. Provider failures are logged
    /// and degrade to an empty result list.
    pub async fn search(&self, query: &str) -> Vec<StockMatch> {
        let query = query.trim();
        if query.is_empty() {
            return trending();
        }
        match self.search_provider(query).await {
            Ok(matches) => matches,
            Err(e) => {
                error!("Symbol search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn search_provider(&self, query: &str) -> Result<Vec<StockMatch>, reqwest::Error> {
        let url = format!(
            "https://www.alphavantage.co/query?function=SYMBOL_SEARCH&keywords={}&apikey={}",
            query, self.api_key
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .json::<SymbolSearchResponse>()
            .await?;
        Ok(response
            .best_matches
            .into_iter()
            .map(|m| StockMatch {
                symbol: m.symbol,
                name: m.name,
                exchange: m.region,
            })
            .collect())
    }
}

pub fn trending() -> Vec<StockMatch> {
    TRENDING
        .iter()
        .map(|(symbol, name, exchange)| StockMatch {
            symbol: symbol.to_string(),
            name: name.to_string(),
            exchange: exchange.to_string(),
        })
        .collect()
}

/// Marks each result with watchlist membership by set-membership against
/// the user's watched symbols.
pub fn decorate(stocks: Vec<StockMatch>, watched: &[String]) -> Vec<StockWithStatus> {
    let watched: HashSet<&str> = watched.iter().map(|s| s.as_str()).collect();
    stocks
        .into_iter()
        .map(|stock| {
            let is_in_watchlist = watched.contains(stock.symbol.as_str());
            StockWithStatus {
                symbol: stock.symbol,
                name: stock.name,
                exchange: stock.exchange,
                is_in_watchlist,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_payload_parses_with_renamed_keys() {
        let payload = r#"{
            "bestMatches": [
                {
                    "1. symbol": "AAPL",
                    "2. name": "Apple Inc.",
                    "3. type": "Equity",
                    "4. region": "United States",
                    "8. currency": "USD",
                    "9. matchScore": "1.0000"
                }
            ]
        }"#;
        let response: SymbolSearchResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.best_matches.len(), 1);
        assert_eq!(response.best_matches[0].symbol, "AAPL");
        assert_eq!(response.best_matches[0].region, "United States");
    }

    #[test]
    fn rate_limit_payload_parses_as_empty() {
        let payload = r#"{"Note": "Thank you for using Alpha Vantage!"}"#;
        let response: SymbolSearchResponse = serde_json::from_str(payload).unwrap();
        assert!(response.best_matches.is_empty());
    }

    #[test]
    fn decorate_marks_only_watched_symbols() {
        let watched = vec!["AAPL".to_string(), "NVDA".to_string()];
        let decorated = decorate(trending(), &watched);

        for stock in &decorated {
            let expected = stock.symbol == "AAPL" || stock.symbol == "NVDA";
            assert_eq!(stock.is_in_watchlist, expected, "{}", stock.symbol);
        }
    }

    #[test]
    fn decorate_without_watchlist_marks_nothing() {
        let decorated = decorate(trending(), &[]);
        assert!(decorated.iter().all(|s| !s.is_in_watchlist));
    }
}
