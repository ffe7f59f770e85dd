//! Hack Hour Client Library
//!
//! An async Rust client for the Hack Club Hack Hour API. Starts, pauses and
//! cancels work sessions, and reads session state, statistics, goals, and
//! history for a Slack user.
//!
//! # Features
//!
//! - **Rate-Limit Aware**: Separate FIFO queues for reads and writes, driven
//!   by the budget the server reports in its `x-ratelimit-*` headers
//! - **Automatic Retries**: Throttled (429) and failing (500) calls are queued
//!   again until they go through or the retry bound is reached
//! - **Typed Results**: Server-side failures are values, not errors
//! - **Observability**: Tracing spans, budget events, request metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hackhour_client::{ApiOutcome, HackHourClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HackHourClient::builder()
//!         .slack_id("U0123456789")
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     match client.start("Writing a parser").await? {
//!         ApiOutcome::Success(session) => println!("Started {}", session.id),
//!         ApiOutcome::Failure { error } => println!("Server said no: {error}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Budget Events
//!
//! ```rust,no_run
//! use hackhour_client::HackHourClient;
//!
//! # async fn watch(client: HackHourClient) {
//! let mut events = client.writes().subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {}/{} left", event.queue, event.snapshot.left, event.snapshot.max);
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resilience;
pub mod services;
pub mod time;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{HackHourClient, HackHourClientBuilder};
pub use config::{HackHourConfig, HackHourConfigBuilder};
pub use errors::{HackHourError, HackHourResult};
pub use resilience::{Budget, QueueKind, RateLimitData, RateLimitEvent, RateLimiter};
pub use time::Time;

// Type re-exports
pub use types::{
    ApiOutcome, CancelResult, Goal, HistoryEntry, PauseToggle, PausedSession, RemainingTime,
    ServiceStatus, Session, SessionLookup, SessionRef, UserStats,
};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
