use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::{
    error::WeatherError,
    model::{WeatherRequest, WeatherSnapshot},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self), err(Display))]
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        tracing::info!("Fetching weather for city: {city}");

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(WeatherError::CityNotFound),
            StatusCode::UNAUTHORIZED => return Err(WeatherError::InvalidApiKey),
            s => {
                return Err(WeatherError::Upstream(format!(
                    "OpenWeather request failed with status {}: {}",
                    s,
                    truncate_body(&body),
                )));
            }
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::Upstream(format!("Failed to parse OpenWeather current JSON: {e}"))
        })?;

        parsed.into_snapshot()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: serde_json::Number,
    pressure: serde_json::Number,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| {
            WeatherError::Upstream("OpenWeather response contained no weather conditions".into())
        })?;

        Ok(WeatherSnapshot {
            city: self.name,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            description: condition.description,
            icon: condition.icon,
            wind_speed: self.wind.speed,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current(&request.city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london() -> serde_json::Value {
        serde_json::json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 11.43, "feels_like": 10.77, "temp_min": 10.2, "temp_max": 12.1,
                     "pressure": 1012, "humidity": 87},
            "wind": {"speed": 4.63, "deg": 230},
            "sys": {"country": "GB"},
            "name": "London",
            "cod": 200
        })
    }

    fn request(city: &str) -> WeatherRequest {
        WeatherRequest::from_param(Some(city)).expect("valid city")
    }

    #[tokio::test]
    async fn current_maps_upstream_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "london"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("test_key".into()).with_base_url(&mock_server.uri());
        let snapshot = provider.current(&request("london")).await.unwrap();

        assert_eq!(
            snapshot,
            WeatherSnapshot {
                city: "London".into(),
                temperature: 11.43,
                feels_like: 10.77,
                humidity: 87.into(),
                pressure: 1012.into(),
                description: "light rain".into(),
                icon: "10d".into(),
                wind_speed: 4.63,
            }
        );
    }

    #[tokio::test]
    async fn fractional_humidity_and_pressure_pass_through() {
        let mock_server = MockServer::start().await;

        let mut body = london();
        body["main"]["humidity"] = serde_json::json!(87.5);
        body["main"]["pressure"] = serde_json::json!(1013.25);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("test_key".into()).with_base_url(&mock_server.uri());
        let snapshot = provider.current(&request("london")).await.unwrap();

        assert_eq!(snapshot.humidity.as_f64(), Some(87.5));
        assert_eq!(snapshot.pressure.as_f64(), Some(1013.25));
    }

    #[tokio::test]
    async fn city_is_sent_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "New York, US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&mock_server.uri());
        assert!(provider.current(&request("New York, US")).await.is_ok());
    }

    #[tokio::test]
    async fn not_found_maps_to_city_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404", "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&mock_server.uri());
        let err = provider.current(&request("Atlantis")).await.unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_api_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401, "message": "Invalid API key."
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("bad".into()).with_base_url(&mock_server.uri());
        let err = provider.current(&request("London")).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidApiKey));
    }

    #[tokio::test]
    async fn server_error_maps_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&mock_server.uri());
        let err = provider.current(&request("London")).await.unwrap_err();
        match err {
            WeatherError::Upstream(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "London", "main": {"temp": 1.0}
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&mock_server.uri());
        let err = provider.current(&request("London")).await.unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(_)));
    }

    #[tokio::test]
    async fn empty_weather_array_maps_to_upstream() {
        let mock_server = MockServer::start().await;

        let mut body = london();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&mock_server.uri());
        let err = provider.current(&request("London")).await.unwrap_err();
        match err {
            WeatherError::Upstream(msg) => assert!(msg.contains("no weather conditions")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(london())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("k".into())
            .with_base_url(&mock_server.uri())
            .with_timeout(Duration::from_millis(50));
        let err = provider.current(&request("London")).await.unwrap_err();
        match err {
            WeatherError::Upstream(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let provider = OpenWeatherProvider::new("super_secret".into());
        assert!(!format!("{provider:?}").contains("super_secret"));
    }
}
