use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{StoreClient, StoreError, single_row};

const TABLE: &str = "weather_search_history";

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub city_name: String,
    pub country_code: Option<String>,
    pub temperature: Option<f64>,
    pub weather_description: Option<String>,
    pub searched_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NewEntry<'a> {
    user_id: Option<Uuid>,
    city_name: &'a str,
    country_code: Option<&'a str>,
    temperature: f64,
    weather_description: &'a str,
}

/// Recently searched cities. Anonymous searches are recorded without a user id.
#[derive(Debug, Clone, Copy)]
pub struct SearchHistory<'a> {
    client: &'a StoreClient,
}

impl<'a> SearchHistory<'a> {
    pub(super) fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Most recent searches first, at most `limit` rows.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, StoreError> {
        let response = self
            .client
            .table(Method::GET, TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("order", "searched_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        StoreClient::handle_response(response).await
    }

    pub async fn recent(&self) -> Result<Vec<SearchHistoryEntry>, StoreError> {
        self.list(DEFAULT_HISTORY_LIMIT).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn add(
        &self,
        city_name: &str,
        country_code: Option<&str>,
        temperature: f64,
        weather_description: &str,
    ) -> Result<SearchHistoryEntry, StoreError> {
        let row = NewEntry {
            user_id: self.client.signed_in_user().map(|u| u.id),
            city_name,
            country_code,
            temperature,
            weather_description,
        };

        let response = self
            .client
            .table(Method::POST, TABLE)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        single_row(StoreClient::handle_response(response).await?)
    }

    /// Delete every row the current session can see.
    #[instrument(skip(self), level = "info")]
    pub async fn clear(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .table(Method::DELETE, TABLE)
            .query(&[("id", "not.is.null")])
            .send()
            .await?;

        StoreClient::handle_empty(response).await
    }
}
