// src/config.rs
use std::env;

use crate::error::StoreError;

pub struct Config {
    pub port: u16,
    pub scylla_uri: String,
    pub jwt_secret: String,
    pub market_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, StoreError> {
        let scylla_uri = env::var("SCYLLA_URI")
            .map_err(|_| StoreError::Configuration("SCYLLA_URI must be set".to_string()))?;
        // Shared with the auth service that mints the session tokens.
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| StoreError::Configuration("JWT_SECRET must be set".to_string()))?;
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3030);
        let market_api_key = env::var("MARKET_API_KEY").unwrap_or_else(|_| "demo".to_string());

        Ok(Config {
            port,
            scylla_uri,
            jwt_secret,
            market_api_key,
        })
    }
}
