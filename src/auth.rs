// src/auth.rs
use std::sync::Arc;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use warp::Filter;

use crate::models::SessionUser;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub exp: usize,
}

// Tokens are normally minted by the auth service sharing JWT_SECRET; this
// counterpart exists for tooling and tests.
pub fn create_token(
    user: &SessionUser,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verifies a bearer token and extracts the session identity. Anything
/// invalid (bad signature, expired, malformed) is simply no session.
pub fn verify_token(token: &str, secret: &str) -> Option<SessionUser> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .ok()
    .map(|data| SessionUser {
        id: data.claims.sub,
        name: data.claims.name,
        email: data.claims.email,
    })
}

/// Extracts `Option<SessionUser>` from the Authorization header. Handlers
/// decide what an anonymous request means for their operation.
pub fn with_session(
    secret: Arc<String>,
) -> impl Filter<Extract = (Option<SessionUser>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        header
            .as_deref()
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(|token| verify_token(token, &secret))
    })
}
