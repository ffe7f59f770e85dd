//! Error types for the Hack Hour client.
//!
//! Domain failures reported by the API (`{"ok": false, "error": ...}`) are not
//! errors; they surface as [`ApiOutcome::Failure`](crate::types::ApiOutcome).
//! This module covers everything else: local validation, configuration,
//! transport failures, exhausted retries, and undecodable responses.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for Hack Hour operations.
pub type HackHourResult<T> = Result<T, HackHourError>;

/// Error type for Hack Hour client operations.
#[derive(Debug, Error)]
pub enum HackHourError {
    /// Configuration error (missing slack id, empty API key, bad base URL).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Local validation error. The request was never sent.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
        /// The parameter that caused the error.
        param: Option<String>,
    },

    /// Network/connection error.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// Request timeout.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// The server kept answering 429/500 until the retry bound was reached.
    #[error("Rate limited (HTTP {status}) after {attempts} attempts")]
    RateLimited {
        /// Status of the last attempt.
        status: u16,
        /// Total attempts made, including the first.
        attempts: u32,
    },

    /// Non-retryable HTTP failure without a Hack Hour response envelope.
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message or raw body excerpt.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// The request queue dropped the task before it produced a response.
    #[error("Request queue closed before the request completed")]
    QueueClosed,
}

impl HackHourError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        HackHourError::Validation {
            message: message.into(),
            param: None,
        }
    }

    /// Creates a validation error with parameter.
    pub fn validation_param(message: impl Into<String>, param: impl Into<String>) -> Self {
        HackHourError::Validation {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        HackHourError::Configuration {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised locally without touching the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            HackHourError::Configuration { .. } | HackHourError::Validation { .. }
        )
    }

    /// Returns true for transport-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HackHourError::Network { .. } | HackHourError::Timeout { .. }
        )
    }

    /// Short, stable label used as a metrics key.
    pub fn kind(&self) -> &'static str {
        match self {
            HackHourError::Configuration { .. } => "configuration",
            HackHourError::Validation { .. } => "validation",
            HackHourError::Network { .. } => "network",
            HackHourError::Timeout { .. } => "timeout",
            HackHourError::RateLimited { .. } => "rate_limited",
            HackHourError::Server { .. } => "server",
            HackHourError::Serialization { .. } => "serialization",
            HackHourError::QueueClosed => "queue_closed",
        }
    }
}

impl From<TransportError> for HackHourError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { .. } => HackHourError::Timeout {
                message: err.to_string(),
            },
            TransportError::Connection { .. }
            | TransportError::Tls { .. }
            | TransportError::InvalidResponse { .. } => HackHourError::Network {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for HackHourError {
    fn from(err: serde_json::Error) -> Self {
        HackHourError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for HackHourError {
    fn from(err: url::ParseError) -> Self {
        HackHourError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_local_errors() {
        assert!(HackHourError::validation("empty").is_local());
        assert!(HackHourError::configuration("missing").is_local());
        assert!(!HackHourError::QueueClosed.is_local());
    }

    #[test]
    fn test_transport_conversion() {
        let err: HackHourError = TransportError::Timeout {
            timeout: Duration::from_secs(5),
        }
        .into();
        assert!(matches!(err, HackHourError::Timeout { .. }));
        assert!(err.is_transport());

        let err: HackHourError = TransportError::Connection {
            message: "refused".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            HackHourError::Network { ref message } if message.contains("refused")
        ));
    }

    #[test]
    fn test_validation_param_helper() {
        let error = HackHourError::validation_param("work must not be empty", "work");

        if let HackHourError::Validation { message, param } = error {
            assert!(message.contains("work"));
            assert_eq!(param.as_deref(), Some("work"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_rate_limited_display() {
        let err = HackHourError::RateLimited {
            status: 429,
            attempts: 3,
        };
        assert_eq!(err.to_string(), "Rate limited (HTTP 429) after 3 attempts");
        assert_eq!(err.kind(), "rate_limited");
    }
}
