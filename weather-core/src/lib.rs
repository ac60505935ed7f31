//! Core library for the postal-code weather services.
//!
//! This crate defines:
//! - Postal-code validation and temperature conversion
//! - Clients for the address directory, the weather API and the peer service
//! - The orchestration that turns a postal code into a weather reading
//! - The error taxonomy shared across the service hop
//! - HTTP routers, metrics, configuration and trace-context plumbing
//!
//! It is used by `service-a` (the gateway) and `service-b` (the weather
//! service).

pub mod api;
pub mod config;
pub mod converter;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod server;
pub mod telemetry;
pub mod upstream;
pub mod validator;

pub use config::{GatewayConfig, TelemetryConfig, WeatherServiceConfig};
pub use error::{ErrorKind, GeocodingError, InvalidFormat, ResolveError, TransportError, UpstreamError};
pub use model::{AddressResult, ErrorResult, PostalCodeRequest, Temperatures, WeatherResult};
pub use orchestrator::{WeatherOrchestrator, WeatherResolver};
pub use provider::{AddressLookup, ViaCepClient, WeatherApiClient, WeatherLookup, WeatherMode};
pub use telemetry::Telemetry;
pub use upstream::{UpstreamWeatherClient, WeatherService};
pub use validator::{CepValidator, PostalCodeValidator};
