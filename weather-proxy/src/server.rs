//! HTTP surface of the weather proxy.
//!
//! - `GET /api/weather?city=<name>`: current conditions as a snapshot, or a
//!   JSON `{"error": ...}` body with 400/401/404/500.
//! - `OPTIONS /api/weather`: CORS preflight, 200 with an empty body.
//! - `GET /health`: liveness check, never touches the upstream.
//!
//! Every routed response carries allow-all CORS headers.

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use weather_core::{WeatherError, WeatherProvider, WeatherRequest, WeatherSnapshot};

const ALLOW_METHODS: &str = "GET,OPTIONS";
const ALLOW_HEADERS: &str = "X-Requested-With, Content-Type, Accept";

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Maps a lookup failure to its fixed status code and client message.
#[derive(Debug)]
pub struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            WeatherError::MissingCity => StatusCode::BAD_REQUEST,
            WeatherError::CityNotFound => StatusCode::NOT_FOUND,
            WeatherError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            WeatherError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            tracing::warn!(%status, "weather lookup rejected: {}", self.0);
        } else {
            tracing::error!(%status, "weather lookup failed: {}", self.0);
        }

        let body = ErrorBody { error: self.0.user_message().to_string() };
        (status, Json(body)).into_response()
    }
}

pub fn router(provider: Arc<dyn WeatherProvider>) -> Router {
    Router::new()
        .route("/api/weather", get(weather).options(preflight))
        .route("/health", get(health))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { provider })
}

/// Look up current conditions for the `city` query parameter.
pub async fn weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    // A query string we can't parse is the same as no city at all.
    let city = query.ok().and_then(|Query(q)| q.city);
    let request = WeatherRequest::from_param(city.as_deref())?;

    let snapshot = state.provider.current(&request).await?;
    tracing::info!(city = %snapshot.city, "weather lookup succeeded");

    Ok(Json(snapshot))
}

/// Answer the CORS preflight for the weather endpoint.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, provider: Arc<dyn WeatherProvider>) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    tracing::info!("weather proxy listening on http://{addr}");

    axum::serve(listener, router(provider))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("got SIGINT, shutting down");
}
