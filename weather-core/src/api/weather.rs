//! Service-B: `POST /weather`.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::post,
};
use std::sync::Arc;

use crate::{orchestrator::WeatherResolver, telemetry::Telemetry};

use super::{decode_request, error_response, success_response};

#[derive(Debug, Clone)]
pub struct WeatherState {
    resolver: Arc<dyn WeatherResolver>,
    telemetry: Telemetry,
}

impl WeatherState {
    pub fn new(resolver: Arc<dyn WeatherResolver>, telemetry: Telemetry) -> Self {
        Self {
            resolver,
            telemetry,
        }
    }
}

pub fn router(state: WeatherState) -> Router {
    Router::new()
        .route("/weather", post(handle_weather))
        .with_state(state)
}

async fn handle_weather(State(state): State<WeatherState>, headers: HeaderMap, body: Bytes) -> Response {
    // The caller's context must be the parent so both services share one trace.
    let parent = state.telemetry.extract(&headers);
    let span = state.telemetry.start("weather-request", &parent);

    let request = match decode_request(&span, &body) {
        Ok(r) => r,
        Err(response) => return response,
    };
    tracing::info!(trace_id = %span.trace_id(), cep = %request.code, "weather requested");

    match state.resolver.resolve(span.context(), &request.code).await {
        Ok(result) => success_response(result),
        Err(e) => {
            tracing::warn!(trace_id = %span.trace_id(), cep = %request.code, error = %e, "weather resolution failed");
            error_response(e.kind())
        }
    }
}
