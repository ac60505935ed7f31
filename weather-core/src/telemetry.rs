//! Logging and distributed tracing.
//!
//! [`Telemetry`] is the tracer handle every component receives at
//! construction time. Nothing here installs a global tracer provider or a
//! global propagator: spans are started from an explicit parent
//! [`Context`] and the W3C trace context is moved across HTTP hops with
//! [`Telemetry::inject`] and [`Telemetry::extract`].

use std::fmt;

use anyhow::Context as _;
use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    Context, KeyValue, Value,
    propagation::{Extractor, Injector, TextMapPropagator},
    trace::{Status, TraceContextExt, Tracer as _, TracerProvider as _},
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    trace::{SdkTracer, SdkTracerProvider},
};
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Tracer plus the propagation format agreed between the two services.
#[derive(Clone)]
pub struct Telemetry {
    tracer: SdkTracer,
    propagator: TraceContextPropagator,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

impl Telemetry {
    pub fn new(provider: &SdkTracerProvider, scope: &'static str) -> Self {
        Self {
            tracer: provider.tracer(scope),
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Start a child of `parent`. The span ends when the guard is dropped.
    pub fn start(&self, name: &'static str, parent: &Context) -> ActiveSpan {
        let span = self.tracer.start_with_context(name, parent);
        ActiveSpan {
            cx: parent.with_span(span),
        }
    }

    /// Write the trace context of `cx` into outgoing request headers.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator
            .inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Read the caller's trace context from incoming request headers. Returns
    /// an empty context when none is present.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator
            .extract_with_context(&Context::new(), &HeaderExtractor(headers))
    }
}

/// An open span and the context that carries it to child calls.
pub struct ActiveSpan {
    cx: Context,
}

impl ActiveSpan {
    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Attach `err` to the span and mark it failed.
    pub fn record_error(&self, err: &dyn std::error::Error) {
        let span = self.cx.span();
        span.record_error(err);
        span.set_status(Status::error(err.to_string()));
    }

    pub fn set_attribute(&self, key: &'static str, value: impl Into<Value>) {
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }

    /// Hex trace id, for log correlation.
    pub fn trace_id(&self) -> String {
        self.cx.span().span_context().trace_id().to_string()
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, val);
        }
    }
}

/// Owns the tracer provider for the lifetime of a service process.
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
    scope: &'static str,
}

impl TelemetryGuard {
    pub fn telemetry(&self) -> Telemetry {
        Telemetry::new(&self.provider, self.scope)
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
        }
    }
}

/// Build the tracer provider. With an OTLP endpoint configured, finished
/// spans are batch-exported over gRPC; otherwise they are created and
/// propagated but not exported.
pub fn init_tracing(cfg: &TelemetryConfig, scope: &'static str) -> anyhow::Result<TelemetryGuard> {
    let service_name = cfg.service_name.as_deref().unwrap_or(scope).to_string();
    let resource = Resource::builder()
        .with_service_name(service_name.clone())
        .build();

    let mut builder = SdkTracerProvider::builder().with_resource(resource);

    match cfg.otlp_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(endpoint) => {
            let endpoint = with_scheme(endpoint);
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .context("Failed to build OTLP gRPC span exporter")?;
            builder = builder.with_batch_exporter(exporter);
            tracing::info!(service = %service_name, %endpoint, "exporting spans over OTLP");
        }
        None => {
            tracing::info!(service = %service_name, "no OTLP endpoint configured, spans are not exported");
        }
    }

    Ok(TelemetryGuard {
        provider: builder.build(),
        scope,
    })
}

/// Install the fmt subscriber. Level comes from `RUST_LOG`, default `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn with_scheme(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}
