//! HTTP transport layer for the Hack Hour client.
//!
//! Every call goes through [`HttpTransport::send`], which performs exactly one
//! HTTP exchange and hands back the response whatever its status. Status
//! interpretation (retries, envelopes) happens above this layer.

mod http_transport;

pub use http_transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

use std::time::Duration;

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// TLS error.
    #[error("TLS error: {message}")]
    Tls {
        /// Error message.
        message: String,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}
