//! Client for the hosted auth + table store used by the frontend for
//! favorites, search history and preferences.
//!
//! The store speaks a Supabase-compatible REST dialect: auth lives under
//! `/auth/v1`, tables under `/rest/v1/<table>` with PostgREST filters. Every
//! request carries the project's anon key; table requests made while signed in
//! carry the user's access token instead so row-level policies apply.
//!
//! Nothing is persisted locally. The weather endpoint never uses this client.

mod auth;
mod error;
mod favorites;
mod history;
mod preferences;

pub use auth::{AuthEvent, AuthSubscription, Session, User};
pub use error::StoreError;
pub use favorites::{FavoriteCities, FavoriteCity};
pub use history::{DEFAULT_HISTORY_LIMIT, SearchHistory, SearchHistoryEntry};
pub use preferences::{Preferences, UserPreferences};

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::StoreConfig;

const AUTH_EVENT_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.session.read().is_some())
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            http: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    pub fn favorites(&self) -> FavoriteCities<'_> {
        FavoriteCities::new(self)
    }

    pub fn history(&self) -> SearchHistory<'_> {
        SearchHistory::new(self)
    }

    pub fn preferences(&self) -> Preferences<'_> {
        Preferences::new(self)
    }

    /// Current session, if signed in.
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn signed_in_user(&self) -> Option<User> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    fn bearer(&self) -> String {
        let token = self
            .session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        format!("Bearer {token}")
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"))
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
        } else {
            Err(api_error(status.as_u16(), &text))
        }
    }

    async fn handle_empty(response: Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await?;
        Err(api_error(status.as_u16(), &text))
    }
}

/// Pick the most useful message out of an auth or PostgREST error body.
fn api_error(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.to_string());

    StoreError::Api { status, message }
}

/// Unwrap the single row PostgREST returns for `Prefer: return=representation`.
fn single_row<T>(rows: Vec<T>) -> Result<T, StoreError> {
    rows.into_iter().next().ok_or_else(|| StoreError::Decode("expected one row, got none".into()))
}
