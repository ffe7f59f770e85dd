//! Sessions service.

use serde::Serialize;
use tracing::instrument;

use super::{parse_envelope, parse_text, ServiceContext};
use crate::errors::{HackHourError, HackHourResult};
use crate::observability::RequestTimer;
use crate::time::Time;
use crate::transport::HttpRequest;
use crate::types::common::is_no_session_error;
use crate::types::{
    ApiOutcome, CancelResult, PauseToggle, PausedSession, RemainingTime, Session, SessionLookup,
    SessionRef,
};

#[derive(Serialize)]
struct StartSessionBody<'a> {
    work: &'a str,
}

/// Service for the current user's work session.
pub struct SessionsService {
    ctx: ServiceContext,
}

impl SessionsService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Gets the user's latest session.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn session(&self) -> HackHourResult<ApiOutcome<SessionLookup>> {
        let timer = RequestTimer::start("session");
        let result = self.fetch_session().await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn fetch_session(&self) -> HackHourResult<ApiOutcome<SessionLookup>> {
        let response = self
            .ctx
            .send(HttpRequest::get(self.ctx.user_path("session")))
            .await?;

        Ok(match parse_envelope::<Session>(&response)? {
            ApiOutcome::Success(session) => ApiOutcome::Success(SessionLookup::Found(session)),
            ApiOutcome::Failure { error } if is_no_session_error(&error) => {
                ApiOutcome::Success(SessionLookup::NotFound)
            }
            ApiOutcome::Failure { error } => ApiOutcome::Failure { error },
        })
    }

    /// Starts a session working on `work`.
    #[instrument(skip(self, work), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn start(&self, work: &str) -> HackHourResult<ApiOutcome<SessionRef>> {
        let timer = RequestTimer::start("start");
        let result = self.start_session(work).await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn start_session(&self, work: &str) -> HackHourResult<ApiOutcome<SessionRef>> {
        if work.trim().is_empty() {
            return Err(HackHourError::validation_param(
                "Work description cannot be empty",
                "work",
            ));
        }

        let request = HttpRequest::post(self.ctx.user_path("start"))
            .with_json(&StartSessionBody { work })?;
        let response = self.ctx.send(request).await?;

        parse_envelope(&response)
    }

    /// Cancels the running session.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn cancel(&self) -> HackHourResult<ApiOutcome<CancelResult>> {
        let timer = RequestTimer::start("cancel");
        let result = self.cancel_session().await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn cancel_session(&self) -> HackHourResult<ApiOutcome<CancelResult>> {
        let response = self
            .ctx
            .send(HttpRequest::post(self.ctx.user_path("cancel")))
            .await?;

        Ok(match parse_envelope::<SessionRef>(&response)? {
            ApiOutcome::Success(session) => ApiOutcome::Success(CancelResult::Cancelled(session)),
            ApiOutcome::Failure { error } if is_no_session_error(&error) => {
                tracing::debug!("No session to cancel");
                ApiOutcome::Success(CancelResult::NothingToCancel)
            }
            ApiOutcome::Failure { error } => ApiOutcome::Failure { error },
        })
    }

    /// Pauses the running session, or resumes it if paused.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn toggle_paused(&self) -> HackHourResult<ApiOutcome<PauseToggle>> {
        let timer = RequestTimer::start("toggle_paused");
        let result = self.toggle().await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn toggle(&self) -> HackHourResult<ApiOutcome<PauseToggle>> {
        let response = self
            .ctx
            .send(HttpRequest::post(self.ctx.user_path("pause")))
            .await?;

        Ok(match parse_envelope::<PausedSession>(&response)? {
            ApiOutcome::Success(session) => ApiOutcome::Success(PauseToggle::Toggled(session)),
            ApiOutcome::Failure { error } if is_no_session_error(&error) => {
                tracing::debug!("No session to toggle");
                ApiOutcome::Success(PauseToggle::NothingToToggle)
            }
            ApiOutcome::Failure { error } => ApiOutcome::Failure { error },
        })
    }

    /// Remaining time of the running session, from the clock endpoint.
    #[instrument(skip(self), fields(slack_id = %self.ctx.slack_id()))]
    pub async fn remaining_time(&self) -> HackHourResult<RemainingTime> {
        let timer = RequestTimer::start("remaining_session_time");
        let result = self.clock().await;
        timer.finish(&self.ctx.metrics, result)
    }

    async fn clock(&self) -> HackHourResult<RemainingTime> {
        let response = self
            .ctx
            .send(HttpRequest::get(self.ctx.user_path("clock")))
            .await?;
        let body = parse_text(&response)?;

        let ms: i64 = body.parse().map_err(|_| HackHourError::Serialization {
            message: format!("Clock returned a non-numeric body: {body:?}"),
        })?;

        Ok(match u64::try_from(ms) {
            Ok(ms) => RemainingTime::Active {
                remaining: Time::from_millis(ms),
            },
            Err(_) => RemainingTime::Inactive,
        })
    }
}

impl std::fmt::Debug for SessionsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionsService")
            .field("slack_id", &self.ctx.slack_id())
            .finish_non_exhaustive()
    }
}
