use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::instrument;
use uuid::Uuid;

use super::{StoreClient, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl User {
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(|v| v.as_str())
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Change in the client's authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

/// Stream of [`AuthEvent`]s. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Next event, or `None` once the client is gone. Events missed because
    /// the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    full_name: &'a str,
}

/// Sign-up returns a session when email confirmation is off, a bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(User),
}

impl StoreClient {
    /// Register a new account. Signs in immediately when the store hands back a session.
    #[instrument(skip(self, password), level = "info")]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, StoreError> {
        let response = self
            .request(Method::POST, "/auth/v1/signup")
            .json(&SignUpBody { email, password, data: SignUpData { full_name } })
            .send()
            .await?;

        let body: SignUpResponse = Self::handle_response(response).await?;
        match body {
            SignUpResponse::Session(session) => {
                let user = session.user.clone();
                self.set_session(session);
                Ok(user)
            }
            SignUpResponse::User(user) => Ok(user),
        }
    }

    #[instrument(skip(self, password), level = "info")]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        let response = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password })
            .send()
            .await?;

        let session: Session = Self::handle_response(response).await?;
        self.set_session(session.clone());
        Ok(session)
    }

    /// Revoke the remote session. The local session is cleared even when the
    /// remote call fails.
    #[instrument(skip(self), level = "info")]
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        if self.session.read().is_none() {
            return Ok(());
        }

        let result = match self.request(Method::POST, "/auth/v1/logout").send().await {
            Ok(response) => Self::handle_empty(response).await,
            Err(e) => Err(e.into()),
        };

        *self.session.write() = None;
        let _ = self.events.send(AuthEvent::SignedOut);

        result
    }

    /// Fetch the signed-in user from the store. `None` when signed out.
    pub async fn current_user(&self) -> Result<Option<User>, StoreError> {
        if self.session.read().is_none() {
            return Ok(None);
        }

        let response = self.request(Method::GET, "/auth/v1/user").send().await?;
        let user: User = Self::handle_response(response).await?;
        Ok(Some(user))
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription { rx: self.events.subscribe() }
    }

    pub(super) fn set_session(&self, session: Session) {
        let user = session.user.clone();
        *self.session.write() = Some(session);
        let _ = self.events.send(AuthEvent::SignedIn(user));
    }
}
