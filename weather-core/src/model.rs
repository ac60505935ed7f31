use serde::{Deserialize, Deserializer, Serialize};

use crate::converter;

/// Body accepted by both `POST /cep` and `POST /weather`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalCodeRequest {
    #[serde(rename = "cep", default, deserialize_with = "null_as_empty")]
    pub code: String,
}

/// `"cep": null` reads the same as a missing field.
fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Option::unwrap_or_default)
}

impl PostalCodeRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Success payload returned by both services.
///
/// Build it with [`WeatherResult::from_celsius`] so Fahrenheit and Kelvin are
/// always derived from the Celsius reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl WeatherResult {
    pub fn from_celsius(city: impl Into<String>, celsius: f64) -> Self {
        let t = converter::from_celsius(celsius);
        Self {
            city: city.into(),
            temp_c: t.celsius,
            temp_f: t.fahrenheit,
            temp_k: t.kelvin,
        }
    }
}

/// Failure payload for the two error kinds callers can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

/// Address resolved by the postal-code directory. Only `city` leaves the
/// geocoding step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressResult {
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub region: String,
    pub neighborhood: String,
    pub street: String,
}

/// One temperature reading in the three supported scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperatures {
    pub celsius: f64,
    pub fahrenheit: f64,
    pub kelvin: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_cep_field_and_defaults_to_empty() {
        let req: PostalCodeRequest = serde_json::from_str(r#"{"cep":"01310100"}"#).unwrap();
        assert_eq!(req.code, "01310100");

        let null: PostalCodeRequest = serde_json::from_str(r#"{"cep":null}"#).unwrap();
        assert_eq!(null.code, "");

        let missing: PostalCodeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.code, "");

        assert_eq!(
            serde_json::to_string(&PostalCodeRequest::new("12345678")).unwrap(),
            r#"{"cep":"12345678"}"#
        );
    }

    #[test]
    fn weather_result_field_names_match_the_wire_format() {
        let value = serde_json::to_value(WeatherResult::from_celsius("São Paulo", 25.0)).unwrap();

        assert_eq!(value["city"], "São Paulo");
        assert_eq!(value["temp_C"], 25.0);
        assert_eq!(value["temp_F"], 77.0);
        assert_eq!(value["temp_K"], 298.15);
    }
}
