//! Prometheus metrics exposed at `/metrics`.
//!
//! Each service owns its own [`Registry`]; nothing is registered in the
//! process-wide default registry. Collected metrics (prefix is the service
//! name with `-` replaced by `_`):
//! - `<prefix>_http_requests_total{method,path,status}`: counter
//! - `<prefix>_http_request_duration_seconds{method,path}`: histogram

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::{fmt, time::Instant};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new(service: &str) -> prometheus::Result<Self> {
        let prefix = service.replace('-', "_");
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace(prefix.clone()),
            &["method", "path", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
                .namespace(prefix),
            &["method", "path"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
        })
    }

    fn observe(&self, method: &str, path: &str, status: StatusCode, elapsed_secs: f64) {
        self.requests
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.latency
            .with_label_values(&[method, path])
            .observe(elapsed_secs);
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Add `GET /metrics` to `router` and count every request it serves.
pub fn instrument(router: Router, metrics: Metrics) -> Router {
    router
        .route("/metrics", get(render_metrics).with_state(metrics.clone()))
        .layer(middleware::from_fn_with_state(metrics, track))
}

async fn track(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let start = Instant::now();
    let response = next.run(req).await;
    metrics.observe(&method, &path, response.status(), start.elapsed().as_secs_f64());

    response
}

async fn render_metrics(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
