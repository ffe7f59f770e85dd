//! Service status.

use serde::Deserialize;

/// Health of the Hack Hour service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Sessions running right now.
    pub active_sessions: u64,
    /// Whether the backing Airtable base is reachable.
    pub airtable_connected: bool,
    /// Whether the Slack app is connected.
    pub slack_connected: bool,
}
