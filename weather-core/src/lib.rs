//! Core library for the weather lookup proxy.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather snapshot model and request validation
//! - Abstraction over the upstream weather provider
//! - A client for the hosted auth + table store used by the frontend
//!
//! It is used by `weather-proxy`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use config::{Config, ServerConfig, StoreConfig, UpstreamConfig};
pub use error::WeatherError;
pub use model::{WeatherRequest, WeatherSnapshot};
pub use provider::{OpenWeatherProvider, WeatherProvider, provider_from_config};
pub use store::{StoreClient, StoreError};
