//! HTTP surface of both services.
//!
//! Handlers only decode, delegate and map outcomes to status codes:
//!
//! | outcome              | status | body                       |
//! |----------------------|--------|----------------------------|
//! | success              | 200    | `WeatherResult`            |
//! | invalid postal code  | 422    | `{"error":"invalid zipcode"}` |
//! | postal code unknown  | 404    | `{"error":"can not find zipcode"}` |
//! | anything else        | 500    | `Internal server error` (text) |

use axum::{
    Json,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    error::ErrorKind,
    model::{ErrorResult, PostalCodeRequest, WeatherResult},
    telemetry::ActiveSpan,
};

pub mod gateway;
pub mod weather;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidPostalCode => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::PostalCodeNotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(kind: ErrorKind) -> Response {
    match kind.wire_message() {
        Some(message) => (
            status_for(kind),
            Json(ErrorResult {
                error: message.to_string(),
            }),
        )
            .into_response(),
        None => (status_for(kind), "Internal server error").into_response(),
    }
}

pub(crate) fn success_response(result: WeatherResult) -> Response {
    (StatusCode::OK, Json(result)).into_response()
}

/// Decode the body regardless of `Content-Type`; any failure is a 400.
pub(crate) fn decode_request(span: &ActiveSpan, body: &Bytes) -> Result<PostalCodeRequest, Response> {
    serde_json::from_slice(body).map_err(|e| {
        span.record_error(&e);
        tracing::info!(error = %e, "rejecting undecodable request body");
        (StatusCode::BAD_REQUEST, "Invalid JSON").into_response()
    })
}
