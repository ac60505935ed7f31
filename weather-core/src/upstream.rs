//! Service-A's client for service-B's `POST /weather`.

use async_trait::async_trait;
use opentelemetry::Context;
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, time::Duration};

use crate::{
    error::{ErrorKind, TransportError, UpstreamError},
    model::{ErrorResult, PostalCodeRequest, WeatherResult},
    provider::{http_client, trim_base_url},
    telemetry::Telemetry,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Weather lookup as seen from the gateway.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn fetch(&self, cx: &Context, postal_code: &str) -> Result<WeatherResult, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct UpstreamWeatherClient {
    endpoint: String,
    http: Client,
    telemetry: Telemetry,
}

impl UpstreamWeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: format!("{}/weather", trim_base_url(base_url)),
            http: http_client(timeout)?,
            telemetry,
        })
    }

    async fn post(&self, cx: &Context, postal_code: &str) -> Result<WeatherResult, UpstreamError> {
        let mut headers = http::HeaderMap::new();
        self.telemetry.inject(cx, &mut headers);

        // `json` sets `Content-Type: application/json`.
        let res = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .json(&PostalCodeRequest::new(postal_code))
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = res.status();
        let body = res.text().await.map_err(TransportError::from)?;

        if status != StatusCode::OK {
            return Err(error_from_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| TransportError::from(e).into())
    }
}

#[async_trait]
impl WeatherService for UpstreamWeatherClient {
    async fn fetch(&self, cx: &Context, postal_code: &str) -> Result<WeatherResult, UpstreamError> {
        let span = self.telemetry.start("service-b-weather-request", cx);
        tracing::info!(cep = postal_code, endpoint = %self.endpoint, "forwarding postal code to weather service");

        self.post(span.context(), postal_code).await.inspect_err(|e| {
            span.record_error(e);
        })
    }
}

/// Map a non-200 answer back onto the local taxonomy. Only the two
/// user-facing kinds are recognised; anything else stays a transport error
/// carrying the raw status and body.
fn error_from_response(status: StatusCode, body: &str) -> UpstreamError {
    let kind = serde_json::from_str::<ErrorResult>(body)
        .ok()
        .and_then(|e| ErrorKind::from_wire(&e.error));

    match kind {
        Some(ErrorKind::InvalidPostalCode) => UpstreamError::InvalidPostalCode,
        Some(ErrorKind::PostalCodeNotFound) => UpstreamError::PostalCodeNotFound,
        Some(ErrorKind::Internal) | None => TransportError::status(status, body).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TRACEPARENT;
    use httpmock::prelude::*;
    use opentelemetry::trace::TraceContextExt;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use serde_json::json;

    fn client(server: &MockServer) -> UpstreamWeatherClient {
        let provider = SdkTracerProvider::builder().build();
        UpstreamWeatherClient::new(
            server.base_url(),
            DEFAULT_TIMEOUT,
            Telemetry::new(&provider, "test"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_json_and_decodes_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/weather")
                .header("content-type", "application/json")
                .json_body(json!({"cep": "01310100"}));
            then.status(200).json_body(
                json!({"city":"São Paulo","temp_C":25.0,"temp_F":77.0,"temp_K":298.15}),
            );
        });

        let result = client(&server)
            .fetch(&Context::new(), "01310100")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(result, WeatherResult::from_celsius("São Paulo", 25.0));
    }

    #[tokio::test]
    async fn injects_traceparent_of_its_own_span() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/weather")
                .header_exists(TRACEPARENT);
            then.status(200).json_body(
                json!({"city":"Recife","temp_C":30.0,"temp_F":86.0,"temp_K":303.15}),
            );
        });

        let provider = SdkTracerProvider::builder().build();
        let telemetry = Telemetry::new(&provider, "test");
        let root = telemetry.start("root", &Context::new());
        let client = UpstreamWeatherClient::new(server.base_url(), DEFAULT_TIMEOUT, telemetry).unwrap();

        client.fetch(root.context(), "50030230").await.unwrap();

        mock.assert();
        assert!(root.context().span().span_context().is_valid());
    }

    #[tokio::test]
    async fn maps_peer_422_to_invalid_postal_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/weather");
            then.status(422).json_body(json!({"error": "invalid zipcode"}));
        });

        let err = client(&server).fetch(&Context::new(), "1234567x").await.unwrap_err();

        assert!(matches!(err, UpstreamError::InvalidPostalCode));
    }

    #[tokio::test]
    async fn maps_peer_404_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/weather");
            then.status(404).json_body(json!({"error": "can not find zipcode"}));
        });

        let err = client(&server).fetch(&Context::new(), "00000000").await.unwrap_err();

        assert!(matches!(err, UpstreamError::PostalCodeNotFound));
    }

    #[tokio::test]
    async fn plain_text_500_is_transport_with_raw_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/weather");
            then.status(500).body("Internal server error\n");
        });

        let err = client(&server).fetch(&Context::new(), "01310100").await.unwrap_err();

        match err {
            UpstreamError::Transport(TransportError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Internal server error\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrecognised_error_body_is_transport() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/weather");
            then.status(400).json_body(json!({"error": "something else"}));
        });

        let err = client(&server).fetch(&Context::new(), "01310100").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn malformed_success_body_is_transport() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/weather");
            then.status(200).json_body(json!({"city": "Recife"}));
        });

        let err = client(&server).fetch(&Context::new(), "01310100").await.unwrap_err();

        assert!(matches!(err, UpstreamError::Transport(TransportError::Decode(_))));
    }
}
