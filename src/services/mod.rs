//! Service implementations for the Hack Hour API.
//!
//! Sessions cover the running session of a user, users cover their
//! statistics and history, and status covers service health.

mod sessions;
mod status;
mod users;

pub use sessions::SessionsService;
pub use status::StatusService;
pub use users::UsersService;

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::HackHourConfig;
use crate::errors::{HackHourError, HackHourResult};
use crate::observability::MetricsCollector;
use crate::resilience::ResilienceOrchestrator;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::common::Envelope;
use crate::types::ApiOutcome;

const BODY_EXCERPT_LEN: usize = 200;

/// Everything a service needs to reach the API. Cheap to clone.
#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) resilience: Arc<ResilienceOrchestrator>,
    pub(crate) metrics: Arc<dyn MetricsCollector>,
    pub(crate) config: Arc<HackHourConfig>,
}

impl ServiceContext {
    /// `/api/{endpoint}/{slack id}`.
    pub(crate) fn user_path(&self, endpoint: &str) -> String {
        format!("/api/{}/{}", endpoint, self.config.slack_id())
    }

    pub(crate) fn slack_id(&self) -> &str {
        self.config.slack_id()
    }

    /// Authenticates `request` and runs it through the queues.
    pub(crate) async fn send(&self, mut request: HttpRequest) -> HackHourResult<HttpResponse> {
        self.auth.apply_auth(&mut request.headers);
        self.resilience.execute(&self.transport, request).await
    }

    /// Same context addressing another user.
    pub(crate) fn for_user(&self, slack_id: impl Into<String>) -> Self {
        Self {
            config: Arc::new(self.config.for_user(slack_id)),
            ..self.clone()
        }
    }
}

/// Decodes a `{ok, data, error}` envelope.
///
/// Envelopes are honoured whatever the status, since the API reports
/// domain failures with 4xx codes. Anything else is an error.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    response: &HttpResponse,
) -> HackHourResult<ApiOutcome<T>> {
    match response.json::<Envelope<T>>() {
        Ok(envelope) => envelope.into_outcome(),
        Err(err) if response.is_success() => {
            tracing::warn!(status = response.status, error = %err, "Unexpected response shape");
            Err(err.into())
        }
        Err(_) => Err(server_error(response)),
    }
}

/// Decodes a bare JSON body.
pub(crate) fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> HackHourResult<T> {
    if !response.is_success() {
        return Err(server_error(response));
    }
    response.json().map_err(|err| {
        tracing::warn!(status = response.status, error = %err, "Unexpected response shape");
        HackHourError::from(err)
    })
}

/// Returns the trimmed body of a successful response.
pub(crate) fn parse_text(response: &HttpResponse) -> HackHourResult<String> {
    if !response.is_success() {
        return Err(server_error(response));
    }
    Ok(response.text().trim().to_string())
}

fn server_error(response: &HttpResponse) -> HackHourError {
    let text = response.text();
    let message = match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None if text.trim().is_empty() => "empty response body".to_string(),
        None => text,
    };
    HackHourError::Server {
        status: response.status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_envelope_on_error_status_is_a_value() {
        let outcome: ApiOutcome<u32> =
            parse_envelope(&response(404, r#"{"ok":false,"error":"User not found"}"#)).unwrap();
        assert_eq!(outcome.error(), Some("User not found"));
    }

    #[test]
    fn test_non_envelope_error_status() {
        let result: HackHourResult<ApiOutcome<u32>> =
            parse_envelope(&response(502, "<html>Bad Gateway</html>"));
        assert!(matches!(
            result,
            Err(HackHourError::Server { status: 502, .. })
        ));
    }

    #[test]
    fn test_malformed_success_body() {
        let result: HackHourResult<ApiOutcome<u32>> = parse_envelope(&response(200, "pong"));
        assert!(matches!(result, Err(HackHourError::Serialization { .. })));
    }

    #[test]
    fn test_server_error_excerpt() {
        let long = "x".repeat(500);
        match server_error(&response(503, &long)) {
            HackHourError::Server { message, .. } => {
                assert_eq!(message.len(), BODY_EXCERPT_LEN + 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_text_trims() {
        assert_eq!(parse_text(&response(200, "pong\n")).unwrap(), "pong");
    }
}
