use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{StoreClient, StoreError, single_row};

const TABLE: &str = "user_preferences";

/// One user's preference row. Columns other than `user_id` are free-form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserPreferences {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preferences<'a> {
    client: &'a StoreClient,
}

impl<'a> Preferences<'a> {
    pub(super) fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// The preference row visible to the current session, if any.
    pub async fn get(&self) -> Result<Option<UserPreferences>, StoreError> {
        let response = self
            .client
            .table(Method::GET, TABLE)
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;

        let rows: Vec<UserPreferences> = StoreClient::handle_response(response).await?;
        Ok(rows.into_iter().next())
    }

    /// Patch the signed-in user's row with `changes`.
    pub async fn update(&self, changes: &Map<String, Value>) -> Result<UserPreferences, StoreError> {
        let user = self.client.signed_in_user().ok_or(StoreError::NotAuthenticated)?;

        let response = self
            .client
            .table(Method::PATCH, TABLE)
            .query(&[("user_id", format!("eq.{}", user.id))])
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;

        single_row(StoreClient::handle_response(response).await?)
    }
}
