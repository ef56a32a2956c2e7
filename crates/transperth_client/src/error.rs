//! Transperth client error types

use thiserror::Error;

/// Errors that can occur while talking to the Transperth backend
///
/// Non-success HTTP statuses are not errors: they are handed back in
/// [`ApiResponse`](crate::ApiResponse) for the caller to inspect.
#[derive(Debug, Error)]
pub enum TransperthError {
    /// Connection to a backend service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// An authentication call succeeded but its body lacked a required field
    #[error("Malformed authentication response: missing `{field}`")]
    MalformedAuthResponse {
        /// Name of the missing or non-string field
        field: &'static str,
    },

    /// A composite trip identifier did not end in an integer trip ID
    #[error("Invalid trip identifier: {value:?}")]
    InvalidTripId {
        /// The offending identifier as supplied by the caller
        value: String,
    },

    /// Failed to parse a response body
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl TransperthError {
    /// Map a transport-level `reqwest` failure
    pub(crate) fn from_transport(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }

    /// Returns true if the request never produced an HTTP response
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors() {
        assert!(TransperthError::ConnectionFailed("dns".to_string()).is_transport());
        assert!(TransperthError::Timeout { timeout_secs: 30 }.is_transport());
    }

    #[test]
    fn test_non_transport_errors() {
        assert!(!TransperthError::MalformedAuthResponse { field: "hash" }.is_transport());
        assert!(
            !TransperthError::InvalidTripId {
                value: "abc".to_string()
            }
            .is_transport()
        );
        assert!(!TransperthError::ParseError("x".to_string()).is_transport());
        assert!(!TransperthError::ConfigurationError("x".to_string()).is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = TransperthError::MalformedAuthResponse { field: "jjpapikey" };
        assert!(err.to_string().contains("jjpapikey"));

        let err = TransperthError::InvalidTripId {
            value: "PerthRestricted:abc".to_string(),
        };
        assert!(err.to_string().contains("PerthRestricted:abc"));

        let err = TransperthError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10"));
    }
}
