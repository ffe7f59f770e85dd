//! Status service.

use tracing::instrument;

use super::{parse_json, parse_text, ServiceContext};
use crate::errors::HackHourResult;
use crate::observability::RequestTimer;
use crate::transport::HttpRequest;
use crate::types::ServiceStatus;

/// Service for health checks. Not tied to a user.
pub struct StatusService {
    ctx: ServiceContext,
}

impl StatusService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Pings the service; a healthy server answers `"pong"`.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> HackHourResult<String> {
        let timer = RequestTimer::start("ping");
        let result = async {
            let response = self.ctx.send(HttpRequest::get("/ping")).await?;
            parse_text(&response)
        }
        .await;
        timer.finish(&self.ctx.metrics, result)
    }

    /// Gets service health.
    #[instrument(skip(self))]
    pub async fn status(&self) -> HackHourResult<ServiceStatus> {
        let timer = RequestTimer::start("status");
        let result = async {
            let response = self.ctx.send(HttpRequest::get("/status")).await?;
            parse_json(&response)
        }
        .await;
        timer.finish(&self.ctx.metrics, result)
    }
}

impl std::fmt::Debug for StatusService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusService").finish_non_exhaustive()
    }
}
