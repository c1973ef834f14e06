//! Weather lookup error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("City parameter is missing or blank")]
    MissingCity,

    #[error("Upstream reported unknown city")]
    CityNotFound,

    #[error("Upstream rejected the API key")]
    InvalidApiKey,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl WeatherError {
    /// Message sent to clients. Never includes upstream details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCity => "City parameter is required",
            Self::CityNotFound => "City not found",
            Self::InvalidApiKey => "Invalid API key",
            Self::Upstream(_) => "Failed to fetch weather data",
        }
    }

    /// Whether the error was caused by the caller rather than the upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingCity | Self::CityNotFound)
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Upstream(format!("request timed out: {err}"))
        } else {
            Self::Upstream(err.to_string())
        }
    }
}
