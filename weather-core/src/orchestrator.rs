//! Service-B composition: postal code -> city -> temperature.

use async_trait::async_trait;
use opentelemetry::Context;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{GeocodingError, ResolveError},
    model::WeatherResult,
    provider::{AddressLookup, MOCK_CELSIUS, WeatherLookup},
    telemetry::Telemetry,
    validator::PostalCodeValidator,
};

/// Anything that can turn a postal code into a weather reading.
#[async_trait]
pub trait WeatherResolver: Send + Sync + Debug {
    async fn resolve(&self, cx: &Context, postal_code: &str) -> Result<WeatherResult, ResolveError>;
}

#[derive(Debug, Clone)]
pub struct WeatherOrchestrator {
    validator: Arc<dyn PostalCodeValidator>,
    addresses: Arc<dyn AddressLookup>,
    weather: Arc<dyn WeatherLookup>,
    use_mock_weather: bool,
    telemetry: Telemetry,
}

impl WeatherOrchestrator {
    pub fn new(
        validator: Arc<dyn PostalCodeValidator>,
        addresses: Arc<dyn AddressLookup>,
        weather: Arc<dyn WeatherLookup>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            validator,
            addresses,
            weather,
            use_mock_weather: false,
            telemetry,
        }
    }

    /// When set, a failing weather lookup is answered with the fixed mock
    /// reading instead of an error.
    pub fn with_mock_weather(mut self, use_mock_weather: bool) -> Self {
        self.use_mock_weather = use_mock_weather;
        self
    }
}

#[async_trait]
impl WeatherResolver for WeatherOrchestrator {
    async fn resolve(&self, cx: &Context, postal_code: &str) -> Result<WeatherResult, ResolveError> {
        let span = self.telemetry.start("weather-orchestration", cx);
        let postal_code = postal_code.trim();

        if let Err(e) = self.validator.validate(postal_code) {
            span.record_error(&e);
            return Err(ResolveError::InvalidPostalCode);
        }

        // Lookup failures were already recorded on the child span.
        let address = match self.addresses.lookup(span.context(), postal_code).await {
            Ok(address) => address,
            Err(GeocodingError::NotFound) => return Err(ResolveError::PostalCodeNotFound),
            Err(GeocodingError::Transport(source)) => {
                return Err(ResolveError::Internal {
                    context: "cannot resolve postal code",
                    source,
                });
            }
        };
        tracing::debug!(cep = postal_code, city = %address.city, "city resolved");

        let celsius = match self.weather.lookup(span.context(), &address.city).await {
            Ok(t) => t.celsius,
            Err(e) if self.use_mock_weather => {
                tracing::warn!(city = %address.city, error = %e, "weather lookup failed, serving mock reading");
                MOCK_CELSIUS
            }
            Err(source) => {
                return Err(ResolveError::Internal {
                    context: "cannot resolve city weather",
                    source,
                });
            }
        };

        Ok(WeatherResult::from_celsius(address.city, celsius))
    }
}
