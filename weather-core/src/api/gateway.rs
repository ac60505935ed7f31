//! Service-A: `POST /cep`.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::post,
};
use std::sync::Arc;

use crate::{
    error::ErrorKind,
    telemetry::Telemetry,
    upstream::WeatherService,
    validator::PostalCodeValidator,
};

use super::{decode_request, error_response, success_response};

#[derive(Debug, Clone)]
pub struct GatewayState {
    validator: Arc<dyn PostalCodeValidator>,
    weather: Arc<dyn WeatherService>,
    telemetry: Telemetry,
}

impl GatewayState {
    pub fn new(
        validator: Arc<dyn PostalCodeValidator>,
        weather: Arc<dyn WeatherService>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            validator,
            weather,
            telemetry,
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/cep", post(handle_cep))
        .with_state(state)
}

async fn handle_cep(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    let parent = state.telemetry.extract(&headers);
    let span = state.telemetry.start("cep-validation", &parent);

    let request = match decode_request(&span, &body) {
        Ok(r) => r,
        Err(response) => return response,
    };
    let code = request.code.trim();

    if let Err(e) = state.validator.validate(code) {
        span.record_error(&e);
        tracing::info!(trace_id = %span.trace_id(), cep = %request.code, "rejecting malformed postal code");
        return error_response(ErrorKind::InvalidPostalCode);
    }

    let lookup = state.telemetry.start("request-weather-by-cep", span.context());
    match state.weather.fetch(lookup.context(), code).await {
        Ok(result) => {
            tracing::info!(trace_id = %span.trace_id(), cep = code, city = %result.city, "weather resolved");
            success_response(result)
        }
        Err(e) => {
            tracing::warn!(trace_id = %span.trace_id(), cep = code, error = %e, "weather service call failed");
            error_response(e.kind())
        }
    }
}
