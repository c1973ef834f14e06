//! Store client error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl StoreError {
    /// Whether signing in again could resolve the error.
    pub fn needs_sign_in(&self) -> bool {
        match self {
            Self::NotAuthenticated => true,
            Self::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
