use async_trait::async_trait;
use opentelemetry::Context;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    converter, error::TransportError, model::Temperatures, telemetry::Telemetry,
};

use super::{WeatherLookup, http_client, trim_base_url};

/// Reading served when no WeatherAPI key is configured: 25°C / 77°F / 298.15K.
pub const MOCK_CELSIUS: f64 = 25.0;

/// Whether WeatherAPI is actually called.
#[derive(Clone, PartialEq, Eq)]
pub enum WeatherMode {
    Live { api_key: String },
    Mock,
}

impl WeatherMode {
    /// A missing or blank key selects [`WeatherMode::Mock`].
    pub fn from_api_key(api_key: Option<&str>) -> Self {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => WeatherMode::Live {
                api_key: key.to_string(),
            },
            None => WeatherMode::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, WeatherMode::Mock)
    }
}

impl std::fmt::Debug for WeatherMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherMode::Live { .. } => f.write_str("Live"),
            WeatherMode::Mock => f.write_str("Mock"),
        }
    }
}

/// Client for `GET {base}/current.json?key=&q=&aqi=no`.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    base_url: String,
    mode: WeatherMode,
    http: Client,
    telemetry: Telemetry,
}

impl WeatherApiClient {
    pub fn new(
        base_url: impl Into<String>,
        mode: WeatherMode,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: trim_base_url(base_url),
            mode,
            http: http_client(timeout)?,
            telemetry,
        })
    }

    pub fn mode(&self) -> &WeatherMode {
        &self.mode
    }

    async fn fetch_current(&self, api_key: &str, city: &str) -> Result<Temperatures, TransportError> {
        let url = format!("{}/current.json", self.base_url);

        // `query` percent-encodes the city name.
        let res = self
            .http
            .get(&url)
            .query(&[("key", api_key), ("q", city), ("aqi", "no")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(TransportError::status(status, &body));
        }

        let parsed: WaResponse = serde_json::from_str(&body)?;

        // Kelvin (and Fahrenheit) are always derived locally from temp_c.
        Ok(converter::from_celsius(parsed.current.temp_c))
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiClient {
    async fn lookup(&self, cx: &Context, city: &str) -> Result<Temperatures, TransportError> {
        let api_key = match &self.mode {
            WeatherMode::Mock => return Ok(converter::from_celsius(MOCK_CELSIUS)),
            WeatherMode::Live { api_key } => api_key,
        };

        let span = self.telemetry.start("weatherapi-request", cx);
        span.set_attribute("city", city.to_string());

        self.fetch_current(api_key, city).await.inspect_err(|e| {
            span.record_error(e);
            tracing::warn!(city, error = %e, "weather lookup failed");
        })
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    fn client(base_url: &str, mode: WeatherMode) -> WeatherApiClient {
        let provider = SdkTracerProvider::builder().build();
        WeatherApiClient::new(
            base_url,
            mode,
            Duration::from_secs(5),
            Telemetry::new(&provider, "test"),
        )
        .unwrap()
    }

    fn live() -> WeatherMode {
        WeatherMode::from_api_key(Some("KEY"))
    }

    #[test]
    fn blank_key_selects_mock() {
        assert!(WeatherMode::from_api_key(None).is_mock());
        assert!(WeatherMode::from_api_key(Some("  ")).is_mock());
        assert!(!live().is_mock());
    }

    #[test]
    fn debug_does_not_print_the_key() {
        let printed = format!("{:?}", WeatherMode::from_api_key(Some("very-secret")));
        assert!(!printed.contains("very-secret"));
    }

    #[tokio::test]
    async fn mock_mode_returns_fixed_reading_without_calling_out() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/current.json");
            then.status(500);
        });

        let t = client(&server.base_url(), WeatherMode::Mock)
            .lookup(&Context::new(), "Anywhere")
            .await
            .unwrap();

        assert_eq!(mock.calls(), 0);
        assert_eq!(t.celsius, 25.0);
        assert_eq!(t.fahrenheit, 77.0);
        assert_eq!(t.kelvin, 298.15);
    }

    #[tokio::test]
    async fn live_mode_encodes_city_and_recomputes_kelvin() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/current.json")
                .query_param("key", "KEY")
                .query_param("q", "São Paulo")
                .query_param("aqi", "no");
            then.status(200).body(
                r#"{"location":{"name":"Sao Paulo"},
                    "current":{"temp_c":18.5,"temp_f":65.3,"temp_k":1.0}}"#,
            );
        });

        let t = client(&server.base_url(), live())
            .lookup(&Context::new(), "São Paulo")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(t.celsius, 18.5);
        assert_eq!(t.kelvin, 18.5 + 273.15);
        assert_eq!(t.fahrenheit, 18.5 * 9.0 / 5.0 + 32.0);
    }

    #[tokio::test]
    async fn non_success_status_is_transport() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/current.json");
            then.status(400)
                .body(r#"{"error":{"code":1006,"message":"No matching location found."}}"#);
        });

        let err = client(&server.base_url(), live())
            .lookup(&Context::new(), "Nowhere")
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn missing_temperature_is_transport() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/current.json");
            then.status(200).body(r#"{"current":{}}"#);
        });

        let err = client(&server.base_url(), live())
            .lookup(&Context::new(), "Recife")
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }
}
