//! Error taxonomy shared by both services.
//!
//! Every component error reduces to one [`ErrorKind`], and the HTTP layer only
//! ever looks at the kind. The two user-facing kinds cross the service hop as
//! plain strings; [`ErrorKind::from_wire`] and [`ErrorKind::wire_message`] are
//! the only places that know those strings.

use thiserror::Error;

/// Body literal for a postal code that fails the 8-digit rule.
pub const INVALID_ZIPCODE: &str = "invalid zipcode";
/// Body literal for a postal code the directory has no record of.
pub const ZIPCODE_NOT_FOUND: &str = "can not find zipcode";

/// Closed set of outcomes a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPostalCode,
    PostalCodeNotFound,
    Internal,
}

enum WireMatch {
    Exact,
    Contains,
}

// Compatibility seam with the peer service: these literals must stay in
// lockstep with what service-B writes into `ErrorResult.error`.
const WIRE_TABLE: &[(&str, WireMatch, ErrorKind)] = &[
    (INVALID_ZIPCODE, WireMatch::Exact, ErrorKind::InvalidPostalCode),
    (ZIPCODE_NOT_FOUND, WireMatch::Contains, ErrorKind::PostalCodeNotFound),
];

impl ErrorKind {
    /// Recover a kind from a peer's `ErrorResult.error` string.
    pub fn from_wire(message: &str) -> Option<Self> {
        WIRE_TABLE.iter().find_map(|(literal, rule, kind)| {
            let hit = match rule {
                WireMatch::Exact => message == *literal,
                WireMatch::Contains => message.contains(literal),
            };
            hit.then_some(*kind)
        })
    }

    /// String written into `ErrorResult.error`. `Internal` has none: it is
    /// answered with a plain-text 500.
    pub fn wire_message(self) -> Option<&'static str> {
        match self {
            ErrorKind::InvalidPostalCode => Some(INVALID_ZIPCODE),
            ErrorKind::PostalCodeNotFound => Some(ZIPCODE_NOT_FOUND),
            ErrorKind::Internal => None,
        }
    }
}

/// Postal code is not exactly eight ASCII digits.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid zipcode")]
pub struct InvalidFormat;

/// Network, status or decoding failure talking to another HTTP service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub(crate) fn status(status: reqwest::StatusCode, body: &str) -> Self {
        TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(body),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("can not find zipcode")]
    NotFound,

    #[error("address lookup failed: {0}")]
    Transport(#[from] TransportError),
}

/// Failure resolving a postal code inside the weather service.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid zipcode")]
    InvalidPostalCode,

    #[error("can not find zipcode")]
    PostalCodeNotFound,

    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: TransportError,
    },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidPostalCode => ErrorKind::InvalidPostalCode,
            ResolveError::PostalCodeNotFound => ErrorKind::PostalCodeNotFound,
            ResolveError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

/// Failure calling the weather service from the gateway.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid zipcode")]
    InvalidPostalCode,

    #[error("can not find zipcode")]
    PostalCodeNotFound,

    #[error("weather service call failed: {0}")]
    Transport(#[from] TransportError),
}

impl UpstreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::InvalidPostalCode => ErrorKind::InvalidPostalCode,
            UpstreamError::PostalCodeNotFound => ErrorKind::PostalCodeNotFound,
            UpstreamError::Transport(_) => ErrorKind::Internal,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_map_back_to_kinds() {
        assert_eq!(
            ErrorKind::from_wire("invalid zipcode"),
            Some(ErrorKind::InvalidPostalCode)
        );
        assert_eq!(
            ErrorKind::from_wire("can not find zipcode"),
            Some(ErrorKind::PostalCodeNotFound)
        );
        assert_eq!(
            ErrorKind::from_wire("service B error: can not find zipcode"),
            Some(ErrorKind::PostalCodeNotFound)
        );
    }

    #[test]
    fn invalid_zipcode_requires_exact_match() {
        assert_eq!(ErrorKind::from_wire("zipcode invalid"), None);
        assert_eq!(ErrorKind::from_wire("error: invalid zipcode"), None);
        assert_eq!(ErrorKind::from_wire(""), None);
    }

    #[test]
    fn every_user_facing_kind_round_trips_through_its_literal() {
        for kind in [ErrorKind::InvalidPostalCode, ErrorKind::PostalCodeNotFound] {
            let literal = kind.wire_message().expect("user-facing kinds have a literal");
            assert_eq!(ErrorKind::from_wire(literal), Some(kind));
        }
        assert_eq!(ErrorKind::Internal.wire_message(), None);
    }

    #[test]
    fn display_of_domain_errors_matches_wire_literals() {
        assert_eq!(InvalidFormat.to_string(), INVALID_ZIPCODE);
        assert_eq!(GeocodingError::NotFound.to_string(), ZIPCODE_NOT_FOUND);
        assert_eq!(ResolveError::PostalCodeNotFound.to_string(), ZIPCODE_NOT_FOUND);
    }

    #[test]
    fn long_bodies_are_truncated_on_a_char_boundary() {
        let body = "é".repeat(150);
        let TransportError::Status { status, body } =
            TransportError::status(reqwest::StatusCode::BAD_GATEWAY, &body)
        else {
            panic!("expected status variant");
        };

        assert_eq!(status, 502);
        assert!(body.ends_with("..."));
        assert!(body.len() <= 203);
    }
}
