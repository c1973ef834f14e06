use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{StoreClient, StoreError, single_row};

const TABLE: &str = "favorite_cities";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city_name: String,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NewFavorite<'a> {
    user_id: Uuid,
    city_name: &'a str,
    country_code: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

/// The signed-in user's favorite cities.
#[derive(Debug, Clone, Copy)]
pub struct FavoriteCities<'a> {
    client: &'a StoreClient,
}

impl<'a> FavoriteCities<'a> {
    pub(super) fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// All favorites visible to the current session, newest first.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self) -> Result<Vec<FavoriteCity>, StoreError> {
        let response = self
            .client
            .table(Method::GET, TABLE)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        StoreClient::handle_response(response).await
    }

    #[instrument(skip(self), level = "info")]
    pub async fn add(
        &self,
        city_name: &str,
        country_code: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<FavoriteCity, StoreError> {
        let user = self.client.signed_in_user().ok_or(StoreError::NotAuthenticated)?;

        let row = NewFavorite { user_id: user.id, city_name, country_code, latitude, longitude };

        let response = self
            .client
            .table(Method::POST, TABLE)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        single_row(StoreClient::handle_response(response).await?)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .client
            .table(Method::DELETE, TABLE)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        StoreClient::handle_empty(response).await
    }

    /// Id of the matching favorite, if the city is already saved.
    pub async fn is_favorite(
        &self,
        city_name: &str,
        country_code: Option<&str>,
    ) -> Result<Option<Uuid>, StoreError> {
        let country_filter = match country_code {
            Some(code) => format!("eq.{code}"),
            None => "is.null".to_string(),
        };

        let response = self
            .client
            .table(Method::GET, TABLE)
            .query(&[
                ("select", "id".to_string()),
                ("city_name", format!("eq.{city_name}")),
                ("country_code", country_filter),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let rows: Vec<IdRow> = StoreClient::handle_response(response).await?;
        Ok(rows.into_iter().next().map(|r| r.id))
    }
}
