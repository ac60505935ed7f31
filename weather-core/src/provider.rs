//! Third-party lookups used by the weather service: the postal-code directory
//! (ViaCEP) and the current-conditions API (WeatherAPI).

use async_trait::async_trait;
use opentelemetry::Context;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::{GeocodingError, TransportError},
    model::{AddressResult, Temperatures},
};

pub mod viacep;
pub mod weatherapi;

pub use viacep::ViaCepClient;
pub use weatherapi::{MOCK_CELSIUS, WeatherApiClient, WeatherMode};

/// Resolves a postal code to an address.
#[async_trait]
pub trait AddressLookup: Send + Sync + Debug {
    async fn lookup(&self, cx: &Context, postal_code: &str) -> Result<AddressResult, GeocodingError>;
}

/// Resolves a city name to its current temperature.
#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    async fn lookup(&self, cx: &Context, city: &str) -> Result<Temperatures, TransportError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    let mut base = base_url.into();
    while base.ends_with('/') {
        base.pop();
    }
    base
}
