use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::WeatherError;

/// A validated lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub city: String,
}

impl WeatherRequest {
    /// Validate a raw `city` parameter. Absent and empty values are rejected;
    /// anything else is kept verbatim, whitespace included.
    pub fn from_param(city: Option<&str>) -> Result<Self, WeatherError> {
        match city {
            Some(c) if !c.is_empty() => Ok(Self { city: c.to_owned() }),
            _ => Err(WeatherError::MissingCity),
        }
    }
}

/// Current conditions for one city, as returned to clients.
///
/// Humidity and pressure keep the upstream JSON number as-is, so integers stay
/// integers and fractional readings are not truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: Number,
    pub pressure: Number,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
}
