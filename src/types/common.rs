//! Response envelope and outcome types shared by every endpoint.

use serde::Deserialize;

use crate::errors::{HackHourError, HackHourResult};

/// Result of an API call the server answered.
///
/// `Failure` carries the server's own error message. It is a value, not an
/// error: the request went through and the server declined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    /// The server reported success.
    Success(T),
    /// The server reported a failure.
    Failure {
        /// Server-provided message.
        error: String,
    },
}

impl<T> ApiOutcome<T> {
    /// Returns true on success.
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    /// Success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            ApiOutcome::Success(value) => Some(value),
            ApiOutcome::Failure { .. } => None,
        }
    }

    /// Failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            ApiOutcome::Success(_) => None,
            ApiOutcome::Failure { error } => Some(error),
        }
    }

    /// Maps the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Success(value) => ApiOutcome::Success(f(value)),
            ApiOutcome::Failure { error } => ApiOutcome::Failure { error },
        }
    }
}

/// Wire envelope: `{"ok": bool, "data": ..., "error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub(crate) fn into_outcome(self) -> HackHourResult<ApiOutcome<T>> {
        if self.ok {
            self.data
                .map(ApiOutcome::Success)
                .ok_or_else(|| HackHourError::Serialization {
                    message: "Successful response carried no data".to_string(),
                })
        } else {
            Ok(ApiOutcome::Failure {
                error: self
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }
}

/// True for the messages the API uses when the user simply has no session
/// running, e.g. `"Invalid user or no active session found"`.
pub(crate) fn is_no_session_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("no active session") || message.contains("no open session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"ok":true,"data":5}"#).unwrap();
        assert_eq!(envelope.into_outcome().unwrap(), ApiOutcome::Success(5));
    }

    #[test]
    fn test_envelope_failure() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"ok":false,"error":"User not found"}"#).unwrap();
        let outcome = envelope.into_outcome().unwrap();

        assert!(!outcome.is_ok());
        assert_eq!(outcome.error(), Some("User not found"));
    }

    #[test]
    fn test_envelope_success_without_data() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(matches!(
            envelope.into_outcome(),
            Err(HackHourError::Serialization { .. })
        ));
    }

    #[test]
    fn test_no_session_messages() {
        assert!(is_no_session_error("Invalid user or no active session found"));
        assert!(is_no_session_error("No active session found"));
        assert!(is_no_session_error("No open session found"));
        assert!(!is_no_session_error("User not found"));
    }

    #[test]
    fn test_outcome_map() {
        let outcome: ApiOutcome<u32> = ApiOutcome::Success(2);
        assert_eq!(outcome.map(|n| n * 10).ok(), Some(20));
    }
}
