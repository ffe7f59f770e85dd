//! Session types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::time::Time;

/// A work session as reported by `/api/session/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "SessionPayload")]
pub struct Session {
    /// Session ID.
    pub id: String,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Planned length in minutes.
    pub time: u64,
    /// Minutes worked so far.
    pub elapsed: u64,
    /// Minutes left.
    pub remaining: u64,
    /// Expected end.
    pub end_time: Option<DateTime<Utc>>,
    /// Goal the session counts towards.
    pub goal: Option<String>,
    /// Whether the session is paused.
    pub paused: bool,
    /// Whether the session has finished.
    pub completed: bool,
    /// Slack message timestamp of the session thread.
    pub message_ts: Option<String>,
    /// Still running: not completed and time remaining.
    pub active: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    id: String,
    created_at: DateTime<Utc>,
    time: u64,
    elapsed: u64,
    remaining: u64,
    end_time: Option<DateTime<Utc>>,
    goal: Option<String>,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    completed: bool,
    message_ts: Option<String>,
}

impl From<SessionPayload> for Session {
    fn from(p: SessionPayload) -> Self {
        Self {
            active: !p.completed && p.remaining > 0,
            id: p.id,
            created_at: p.created_at,
            time: p.time,
            elapsed: p.elapsed,
            remaining: p.remaining,
            end_time: p.end_time,
            goal: p.goal.filter(|g| !g.trim().is_empty()),
            paused: p.paused,
            completed: p.completed,
            message_ts: p.message_ts,
        }
    }
}

impl Session {
    /// Planned length.
    pub fn duration(&self) -> Time {
        Time::from_minutes(self.time)
    }

    /// Time worked so far.
    pub fn elapsed_time(&self) -> Time {
        Time::from_minutes(self.elapsed)
    }

    /// Time left.
    pub fn remaining_time(&self) -> Time {
        Time::from_minutes(self.remaining)
    }
}

/// Outcome of looking up the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    /// The user has a session (possibly already completed).
    Found(Session),
    /// The user has no session.
    NotFound,
}

impl SessionLookup {
    /// Returns true if a session was found.
    pub fn found(&self) -> bool {
        matches!(self, SessionLookup::Found(_))
    }

    /// The session, if found.
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionLookup::Found(session) => Some(session),
            SessionLookup::NotFound => None,
        }
    }

    /// Returns true if a running session was found.
    pub fn is_active(&self) -> bool {
        self.session().is_some_and(|s| s.active)
    }
}

/// Minimal session reference returned by start and cancel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
    /// Session ID.
    pub id: String,
    /// Owner's Slack ID.
    pub slack_id: String,
    /// When the session started.
    pub created_at: DateTime<Utc>,
}

/// Session reference returned by the pause toggle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedSession {
    /// Session ID.
    pub id: String,
    /// Owner's Slack ID.
    pub slack_id: String,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Paused state after the toggle.
    pub paused: bool,
}

/// Outcome of cancelling the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelResult {
    /// The session was cancelled.
    Cancelled(SessionRef),
    /// There was no session to cancel.
    NothingToCancel,
}

impl CancelResult {
    /// Returns true if a session was cancelled.
    pub fn cancelled(&self) -> bool {
        matches!(self, CancelResult::Cancelled(_))
    }
}

/// Outcome of toggling pause on the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseToggle {
    /// The pause state flipped.
    Toggled(PausedSession),
    /// There was no session to toggle.
    NothingToToggle,
}

impl PauseToggle {
    /// Returns true if the pause state flipped.
    pub fn toggled(&self) -> bool {
        matches!(self, PauseToggle::Toggled(_))
    }

    /// Paused state after the toggle, if it happened.
    pub fn paused(&self) -> Option<bool> {
        match self {
            PauseToggle::Toggled(session) => Some(session.paused),
            PauseToggle::NothingToToggle => None,
        }
    }
}

/// Remaining time reported by the clock endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    /// No session running.
    Inactive,
    /// A session is running.
    Active {
        /// Time left.
        remaining: Time,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload(remaining: u64, completed: bool) -> serde_json::Value {
        serde_json::json!({
            "id": "rec123",
            "createdAt": "2024-06-01T12:00:00.000Z",
            "time": 60,
            "elapsed": 60 - remaining,
            "remaining": remaining,
            "endTime": "2024-06-01T13:00:00.000Z",
            "goal": "No Goal",
            "paused": false,
            "completed": completed,
            "messageTs": "1717243200.000100"
        })
    }

    #[test]
    fn test_completed_session_is_inactive() {
        let session: Session = serde_json::from_value(payload(0, true)).unwrap();
        assert!(!session.active);
        assert!(session.completed);
    }

    #[test]
    fn test_running_session_is_active() {
        let session: Session = serde_json::from_value(payload(30, false)).unwrap();
        assert!(session.active);
        assert_eq!(session.elapsed, 30);
        assert_eq!(session.remaining_time().millis(), 30 * 60 * 1000);
        assert_eq!(session.goal.as_deref(), Some("No Goal"));
    }

    #[test]
    fn test_blank_goal_and_missing_flags() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "id": "rec1",
            "createdAt": "2024-06-01T12:00:00Z",
            "time": 60,
            "elapsed": 5,
            "remaining": 55,
            "goal": ""
        }))
        .unwrap();

        assert_eq!(session.goal, None);
        assert_eq!(session.end_time, None);
        assert!(!session.paused);
        assert!(session.active);
    }

    #[test]
    fn test_lookup_helpers() {
        let session: Session = serde_json::from_value(payload(30, false)).unwrap();
        let found = SessionLookup::Found(session);

        assert!(found.found());
        assert!(found.is_active());
        assert!(!SessionLookup::NotFound.found());
        assert!(!SessionLookup::NotFound.is_active());
    }

    #[test]
    fn test_pause_toggle_helpers() {
        let paused: PausedSession = serde_json::from_value(serde_json::json!({
            "id": "rec1",
            "slackId": "U1",
            "createdAt": "2024-06-01T12:00:00Z",
            "paused": true
        }))
        .unwrap();

        assert_eq!(PauseToggle::Toggled(paused).paused(), Some(true));
        assert!(!PauseToggle::NothingToToggle.toggled());
        assert!(!CancelResult::NothingToCancel.cancelled());
    }
}
