use async_trait::async_trait;
use opentelemetry::Context;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::{
    error::{GeocodingError, TransportError},
    model::AddressResult,
    telemetry::Telemetry,
};

use super::{AddressLookup, http_client, trim_base_url};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the ViaCEP directory, `GET {base}/{cep}/json`.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    base_url: String,
    http: Client,
    telemetry: Telemetry,
}

impl ViaCepClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: trim_base_url(base_url),
            http: http_client(timeout)?,
            telemetry,
        })
    }

    async fn fetch(&self, postal_code: &str) -> Result<AddressResult, GeocodingError> {
        let url = format!("{}/{}/json", self.base_url, postal_code);

        let res = self
            .http
            .get(&url)
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = res.status();
        let body = res.text().await.map_err(TransportError::from)?;

        if !status.is_success() {
            return Err(TransportError::status(status, &body).into());
        }

        let parsed: ViaCepResponse = serde_json::from_str(&body).map_err(TransportError::from)?;

        // An empty city is indistinguishable from an unknown code.
        if parsed.erro || parsed.localidade.trim().is_empty() {
            return Err(GeocodingError::NotFound);
        }

        Ok(parsed.into_address(postal_code))
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup(&self, cx: &Context, postal_code: &str) -> Result<AddressResult, GeocodingError> {
        let span = self.telemetry.start("viacep-request", cx);
        span.set_attribute("cep", postal_code.to_string());

        match self.fetch(postal_code).await {
            Ok(address) => {
                tracing::debug!(cep = postal_code, city = %address.city, "address resolved");
                Ok(address)
            }
            Err(e) => {
                span.record_error(&e);
                tracing::warn!(cep = postal_code, error = %e, "address lookup failed");
                Err(e)
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepResponse {
    cep: String,
    logradouro: String,
    bairro: String,
    localidade: String,
    uf: String,
    regiao: String,
    #[serde(deserialize_with = "flag")]
    erro: bool,
}

impl ViaCepResponse {
    fn into_address(self, requested: &str) -> AddressResult {
        let postal_code = if self.cep.is_empty() {
            requested.to_string()
        } else {
            self.cep
        };

        AddressResult {
            postal_code,
            city: self.localidade,
            state: self.uf,
            region: self.regiao,
            neighborhood: self.bairro,
            street: self.logradouro,
        }
    }
}

/// ViaCEP has sent `"erro": true` and `"erro": "true"` over time.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}
