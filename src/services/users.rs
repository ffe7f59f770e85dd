//! Users service.

use tracing::instrument;

use super::{parse_envelope, ServiceContext};
use crate::errors::HackHourResult;
use crate::observability::RequestTimer;
use crate::transport::HttpRequest;
use crate::types::{ApiOutcome, Goal, HistoryEntry, UserStats};

/// Service for a user's statistics, goals, and history.
pub struct UsersService {
    ctx: ServiceContext,
}

impl UsersService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Gets lifetime statistics.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn stats(&self) -> HackHourResult<ApiOutcome<UserStats>> {
        let timer = RequestTimer::start("stats");
        let result = self.get("stats").await;
        timer.finish(&self.ctx.metrics, result)
    }

    /// Gets goals and the minutes logged towards each.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn goals(&self) -> HackHourResult<ApiOutcome<Vec<Goal>>> {
        let timer = RequestTimer::start("goals");
        let result = self.get("goals").await;
        timer.finish(&self.ctx.metrics, result)
    }

    /// Gets past sessions.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn history(&self) -> HackHourResult<ApiOutcome<Vec<HistoryEntry>>> {
        let timer = RequestTimer::start("history");
        let result = self.get("history").await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> HackHourResult<ApiOutcome<T>> {
        let response = self
            .ctx
            .send(HttpRequest::get(self.ctx.user_path(endpoint)))
            .await?;
        parse_envelope(&response)
    }
}

impl std::fmt::Debug for UsersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersService")
            .field("slack_id", &self.ctx.slack_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::services::test_support::context;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stats() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_ok(&serde_json::json!({ "sessions": 12, "total": 720 }));
        let service = UsersService::new(context(mock.clone()));

        let stats = service.stats().await.unwrap().ok().unwrap();

        assert_eq!(stats, UserStats { sessions: 12, total: 720 });
        assert_eq!(mock.last_request().unwrap().path, "/api/stats/U123");
    }

    #[tokio::test]
    async fn test_goals() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_ok(&serde_json::json!([
            { "name": "No Goal", "minutes": 0 },
            { "name": "Arcade", "minutes": 300 }
        ]));
        let service = UsersService::new(context(mock));

        let goals = service.goals().await.unwrap().ok().unwrap();

        assert_eq!(goals.len(), 2);
        assert_eq!(goals[1].name, "Arcade");
        assert!((goals[1].time().hours() - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_history_unknown_user() {
        let mock = Arc::new(MockTransport::new());
        mock.queue(MockResponse::failure("User not found").with_status(404));
        let service = UsersService::new(context(mock.clone()));

        let outcome = service.history().await.unwrap();

        assert_eq!(outcome.error(), Some("User not found"));
        assert_eq!(mock.last_request().unwrap().path, "/api/history/U123");
    }
}
