use std::fmt::Debug;

use crate::error::InvalidFormat;

const POSTAL_CODE_LEN: usize = 8;

/// Syntactic check applied to a postal code before any network call.
pub trait PostalCodeValidator: Send + Sync + Debug {
    fn validate(&self, code: &str) -> Result<(), InvalidFormat>;
}

/// Accepts exactly eight ASCII digits once surrounding whitespace is removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CepValidator;

impl PostalCodeValidator for CepValidator {
    fn validate(&self, code: &str) -> Result<(), InvalidFormat> {
        let code = code.trim();

        if code.len() != POSTAL_CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidFormat);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eight_digits() {
        assert_eq!(CepValidator.validate("01310100"), Ok(()));
        assert_eq!(CepValidator.validate("00000000"), Ok(()));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(CepValidator.validate("  01310100\n"), Ok(()));
    }

    #[test]
    fn rejects_wrong_shapes() {
        for code in [
            "",
            "   ",
            "1310100",
            "013101000",
            "01310-100",
            "0131010a",
            "abc",
            "0131 0100",
            "٠١٢٣٤٥٦٧",
        ] {
            assert_eq!(CepValidator.validate(code), Err(InvalidFormat), "{code:?}");
        }
    }
}
