//! Error types for the import and replay stages
//!
//! Nothing here is fatal: each pipeline stage hands one of these back to the
//! session, which shows it and carries on.

use thiserror::Error;

use crate::import::Format;

/// Why a pasted capture could not become a [`crate::models::Request`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Unrecognized format: expected a HAR capture, a curl command or a fetch(...) call")]
    Unrecognized,

    #[error("Could not read {format} input ({field}): {reason}")]
    Parse {
        format: Format,
        field: &'static str,
        reason: String,
    },
}

impl ImportError {
    pub fn parse(format: Format, field: &'static str, reason: impl Into<String>) -> Self {
        ImportError::Parse {
            format,
            field,
            reason: reason.into(),
        }
    }

    /// Format that was detected before parsing failed, if any
    pub fn format(&self) -> Option<Format> {
        match self {
            ImportError::Unrecognized => None,
            ImportError::Parse { format, .. } => Some(*format),
        }
    }
}

/// The server was never reached, or the exchange broke off.
///
/// An HTTP error status is not a `TransportError`; it is a valid response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String, time_ms: u64 },

    #[error("Request timed out after {time_ms}ms")]
    Timeout { time_ms: u64 },

    #[error("Connection failed: {message}")]
    Connect { message: String, time_ms: u64 },

    #[error("Error reading body: {message}")]
    Body { message: String, time_ms: u64 },

    #[error("Request failed: {message}")]
    Other { message: String, time_ms: u64 },
}

impl TransportError {
    pub fn time_ms(&self) -> u64 {
        match self {
            TransportError::InvalidRequest { time_ms, .. }
            | TransportError::Timeout { time_ms }
            | TransportError::Connect { time_ms, .. }
            | TransportError::Body { time_ms, .. }
            | TransportError::Other { time_ms, .. } => *time_ms,
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(err: &reqwest::Error, time_ms: u64) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout { time_ms }
        } else if err.is_connect() {
            TransportError::Connect { message, time_ms }
        } else if err.is_builder() {
            TransportError::InvalidRequest { message, time_ms }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body { message, time_ms }
        } else {
            TransportError::Other { message, time_ms }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_names_all_notations() {
        let msg = ImportError::Unrecognized.to_string();
        assert!(msg.contains("HAR"));
        assert!(msg.contains("curl"));
        assert!(msg.contains("fetch"));
        assert_eq!(ImportError::Unrecognized.format(), None);
    }

    #[test]
    fn test_parse_error_names_field() {
        let err = ImportError::parse(Format::Curl, "url", "no URL found");
        assert_eq!(err.format(), Some(Format::Curl));
        assert_eq!(err.to_string(), "Could not read curl input (url): no URL found");
    }
}
