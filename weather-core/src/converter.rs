//! Celsius to Fahrenheit/Kelvin conversion.

use crate::model::Temperatures;

const KELVIN_OFFSET: f64 = 273.15;

/// Convert a Celsius reading into all three scales. No rounding is applied.
pub fn from_celsius(celsius: f64) -> Temperatures {
    Temperatures {
        celsius,
        fahrenheit: celsius * 9.0 / 5.0 + 32.0,
        kelvin: celsius + KELVIN_OFFSET,
    }
}
