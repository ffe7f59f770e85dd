//! Type definitions for the Hack Hour API.

pub mod common;
pub mod session;
pub mod status;
pub mod user;

pub use common::ApiOutcome;
pub use session::{
    CancelResult, PauseToggle, PausedSession, RemainingTime, Session, SessionLookup, SessionRef,
};
pub use status::ServiceStatus;
pub use user::{Goal, HistoryEntry, UserStats};
