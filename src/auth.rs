//! Catalog authentication
//!
//! The catalog wants two credentials on every request: the developer token
//! (configured, never fetched) and a user token obtained from the catalog's
//! token endpoint. The pair is acquired lazily on the first lookup that
//! needs the network and shared read-only afterwards; a `OnceCell` guards
//! the first-use race when several intents arrive before the initial
//! acquisition completes.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::Config;

const TOKEN_ENDPOINT: &str = "/v1/me/token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("developer token is not configured")]
    MissingDeveloperToken,
    #[error("token request failed: {0}")]
    Network(String),
    #[error("catalog rejected the developer token (status {0})")]
    Rejected(u16),
    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// Process-wide catalog credentials, acquired once and then read-only.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub developer_token: String,
    pub user_token: String,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserTokenResponse {
    user_token: String,
}

/// Lazy one-shot holder for the catalog auth session.
pub struct CatalogAuth {
    session: OnceCell<AuthSession>,
    http: reqwest::Client,
    base_url: String,
    developer_token: Option<String>,
    user_token_path: PathBuf,
}

impl CatalogAuth {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            session: OnceCell::new(),
            http,
            base_url: config.catalog_base_url.clone(),
            developer_token: config.developer_token.clone(),
            user_token_path: config.user_token_path(),
        }
    }

    /// The shared session, acquiring it on first use.
    ///
    /// Concurrent callers coalesce onto a single acquisition; a failed
    /// attempt is not cached, so the next request tries again.
    pub async fn session(&self) -> Result<&AuthSession, AuthError> {
        self.session.get_or_try_init(|| self.acquire()).await
    }

    async fn acquire(&self) -> Result<AuthSession, AuthError> {
        let developer_token = self
            .developer_token
            .clone()
            .ok_or(AuthError::MissingDeveloperToken)?;

        // A user token cached from an earlier run skips the network round trip.
        if let Ok(cached) = fs::read_to_string(&self.user_token_path) {
            let cached = cached.trim();
            if !cached.is_empty() {
                tracing::info!("Using cached catalog user token");
                return Ok(AuthSession {
                    developer_token,
                    user_token: cached.to_string(),
                    acquired_at: Utc::now(),
                });
            }
        }

        tracing::info!("Requesting catalog user token");
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&developer_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(status.as_u16()));
        }

        let body: UserTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        if let Some(dir) = self.user_token_path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        if let Err(e) = fs::write(&self.user_token_path, &body.user_token) {
            tracing::warn!(error = %e, "Could not cache user token");
        } else {
            tracing::debug!("Saved user token to disk");
        }

        tracing::info!("Catalog authentication completed successfully");
        Ok(AuthSession {
            developer_token,
            user_token: body.user_token,
            acquired_at: Utc::now(),
        })
    }
}
