use crate::{UpstreamConfig, WeatherError, WeatherRequest, WeatherSnapshot};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the upstream provider from config. Fails when no API key is set.
pub fn provider_from_config(config: &UpstreamConfig) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::new(api_key.to_owned())
        .with_base_url(&config.base_url)
        .with_timeout(config.timeout());

    Ok(Arc::new(provider))
}
