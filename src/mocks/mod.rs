//! Mock implementations for testing.
//!
//! Provides a scripted transport so services and the client can be unit
//! tested without a Hack Hour server.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::resilience::{LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: String,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    /// Body parsed as JSON, if any.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body,
        }
    }

    /// Creates a successful plain-text response.
    pub fn text(body: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        Self {
            status: 200,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    /// `{"ok": true, "data": value}`.
    pub fn ok<T: serde::Serialize>(data: &T) -> Self {
        Self::json(&serde_json::json!({ "ok": true, "data": data }))
    }

    /// `{"ok": false, "error": message}`.
    pub fn failure(message: &str) -> Self {
        Self::json(&serde_json::json!({ "ok": false, "error": message }))
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Adds rate-limit headers with the reset `reset_in_secs` from now.
    pub fn with_rate_limit(self, max: u32, left: u32, reset_in_secs: i64) -> Self {
        let reset = Utc::now().timestamp() + reset_in_secs;
        self.with_header(LIMIT_HEADER, &max.to_string())
            .with_header(REMAINING_HEADER, &left.to_string())
            .with_header(RESET_HEADER, &reset.to_string())
    }
}

enum Scripted {
    Respond(MockResponse),
    Fail(String),
}

/// Mock HTTP transport for testing.
///
/// Scripted responses are served in order; once they run out the default
/// response is used, or a 404 if none is set.
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        self.responses.lock().push_back(Scripted::Respond(response));
    }

    /// Queues a successful envelope around `data`.
    pub fn queue_ok<T: serde::Serialize>(&self, data: &T) {
        self.queue(MockResponse::ok(data));
    }

    /// Queues a failed envelope.
    pub fn queue_failure_envelope(&self, message: &str) {
        self.queue(MockResponse::failure(message));
    }

    /// Queues a connection failure.
    pub fn queue_failure(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// Sets the default response.
    pub fn set_default(&self, response: MockResponse) {
        *self.default_response.lock() = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next(&self) -> Scripted {
        if let Some(scripted) = self.responses.lock().pop_front() {
            return scripted;
        }
        let response = self
            .default_response
            .lock()
            .clone()
            .unwrap_or_else(|| MockResponse::text("no mock response").with_status(404));
        Scripted::Respond(response)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            path: request.path,
            body: request.body,
            headers: request.headers,
        });

        match self.next() {
            Scripted::Respond(response) => Ok(HttpResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
            }),
            Scripted::Fail(message) => Err(TransportError::Connection { message }),
        }
    }
}
