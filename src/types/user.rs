//! Per-user statistics, goals, and history.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::time::Time;

/// Lifetime statistics of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UserStats {
    /// Number of sessions.
    pub sessions: u64,
    /// Total minutes logged.
    pub total: u64,
}

impl UserStats {
    /// Total time logged.
    pub fn total_time(&self) -> Time {
        Time::from_minutes(self.total)
    }
}

/// A goal and the minutes logged towards it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Goal {
    /// Goal name.
    pub name: String,
    /// Minutes logged.
    pub minutes: u64,
}

impl Goal {
    /// Time logged towards the goal.
    pub fn time(&self) -> Time {
        Time::from_minutes(self.minutes)
    }
}

/// A past session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Planned length in minutes.
    pub time: u64,
    /// Minutes worked.
    pub elapsed: u64,
    /// Goal the session counted towards.
    pub goal: Option<String>,
    /// Whether the session ran to its end.
    #[serde(default)]
    pub ended: bool,
    /// What the user worked on.
    #[serde(default)]
    pub work: String,
}

impl HistoryEntry {
    /// Time worked.
    pub fn elapsed_time(&self) -> Time {
        Time::from_minutes(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_total_time() {
        let stats: UserStats =
            serde_json::from_value(serde_json::json!({ "sessions": 4, "total": 240 })).unwrap();
        assert_eq!(stats.sessions, 4);
        assert!((stats.total_time().hours() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_entry() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(serde_json::json!([
            {
                "createdAt": "2024-06-01T12:00:00.000Z",
                "time": 60,
                "elapsed": 60,
                "goal": "Arcade",
                "ended": true,
                "work": "wrote a parser"
            },
            {
                "createdAt": "2024-06-02T09:30:00.000Z",
                "time": 60,
                "elapsed": 12,
                "goal": null,
                "ended": false,
                "work": "refactor"
            }
        ]))
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].ended);
        assert_eq!(entries[1].goal, None);
        assert_eq!(entries[1].elapsed_time().millis(), 12 * 60 * 1000);
    }
}
