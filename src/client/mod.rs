//! Hack Hour API client.
//!
//! Provides the main client interface for interacting with the Hack Hour API.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{ApiKeyAuth, AuthProvider};
use crate::config::{is_valid_slack_id, HackHourConfig, HackHourConfigBuilder};
use crate::errors::{HackHourError, HackHourResult};
use crate::observability::{DefaultMetricsCollector, MetricsCollector, RequestMetrics};
use crate::resilience::{RateLimiter, ResilienceConfig, ResilienceOrchestrator};
use crate::services::{ServiceContext, SessionsService, StatusService, UsersService};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{
    ApiOutcome, CancelResult, Goal, HistoryEntry, PauseToggle, RemainingTime, ServiceStatus,
    SessionLookup, SessionRef, UserStats,
};

/// The main Hack Hour client.
///
/// Every call goes through one of two rate-limited queues: reads for GET
/// requests and writes for POST requests.
///
/// # Example
///
/// ```rust,no_run
/// use hackhour_client::HackHourClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HackHourClient::builder()
///         .slack_id("U0123456789")
///         .api_key("your-api-key")
///         .build()?;
///
///     if client.session().await?.ok().is_some_and(|s| s.is_active()) {
///         println!("Session running");
///     }
///     Ok(())
/// }
/// ```
pub struct HackHourClient {
    ctx: ServiceContext,
    sessions: SessionsService,
    users: UsersService,
    status: StatusService,
}

impl HackHourClient {
    /// Creates a new client builder.
    pub fn builder() -> HackHourClientBuilder {
        HackHourClientBuilder::new()
    }

    fn from_context(ctx: ServiceContext) -> Self {
        Self {
            sessions: SessionsService::new(ctx.clone()),
            users: UsersService::new(ctx.clone()),
            status: StatusService::new(ctx.clone()),
            ctx,
        }
    }

    /// Client acting for another user.
    ///
    /// The new client shares the transport, both queues, and the metrics
    /// collector with this one.
    pub fn with_user(&self, slack_id: impl Into<String>) -> HackHourResult<Self> {
        let slack_id = slack_id.into();
        if !is_valid_slack_id(&slack_id) {
            return Err(HackHourError::validation_param(
                "Slack ID must be non-empty and contain only letters, digits, '-' and '_'",
                "slack_id",
            ));
        }
        Ok(Self::from_context(self.ctx.for_user(slack_id)))
    }

    /// Pings the service.
    pub async fn ping(&self) -> HackHourResult<String> {
        self.status.ping().await
    }

    /// Gets service health.
    pub async fn status(&self) -> HackHourResult<ServiceStatus> {
        self.status.status().await
    }

    /// Remaining time of the running session.
    #[deprecated(note = "use `session()` and `Session::remaining_time`")]
    pub async fn remaining_session_time(&self) -> HackHourResult<RemainingTime> {
        self.sessions.remaining_time().await
    }

    /// Gets the latest session.
    pub async fn session(&self) -> HackHourResult<ApiOutcome<SessionLookup>> {
        self.sessions.session().await
    }

    /// Gets lifetime statistics.
    pub async fn stats(&self) -> HackHourResult<ApiOutcome<UserStats>> {
        self.users.stats().await
    }

    /// Gets goals.
    pub async fn goals(&self) -> HackHourResult<ApiOutcome<Vec<Goal>>> {
        self.users.goals().await
    }

    /// Gets past sessions.
    pub async fn history(&self) -> HackHourResult<ApiOutcome<Vec<HistoryEntry>>> {
        self.users.history().await
    }

    /// Starts a session working on `work`.
    pub async fn start(&self, work: &str) -> HackHourResult<ApiOutcome<SessionRef>> {
        self.sessions.start(work).await
    }

    /// Cancels the running session.
    pub async fn cancel(&self) -> HackHourResult<ApiOutcome<CancelResult>> {
        self.sessions.cancel().await
    }

    /// Pauses or resumes the running session.
    pub async fn toggle_paused(&self) -> HackHourResult<ApiOutcome<PauseToggle>> {
        self.sessions.toggle_paused().await
    }

    /// Returns the sessions service.
    pub fn sessions(&self) -> &SessionsService {
        &self.sessions
    }

    /// Returns the users service.
    pub fn users(&self) -> &UsersService {
        &self.users
    }

    /// Queue for GET requests.
    pub fn reads(&self) -> &RateLimiter {
        self.ctx.resilience.reads()
    }

    /// Queue for POST requests.
    pub fn writes(&self) -> &RateLimiter {
        self.ctx.resilience.writes()
    }

    /// Snapshot of request metrics.
    pub fn metrics(&self) -> RequestMetrics {
        self.ctx.metrics.get_metrics()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HackHourConfig {
        &self.ctx.config
    }
}

impl std::fmt::Debug for HackHourClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HackHourClient")
            .field("config", &self.ctx.config)
            .field("resilience", &self.ctx.resilience)
            .finish()
    }
}

/// Builder for the Hack Hour client.
pub struct HackHourClientBuilder {
    config_builder: HackHourConfigBuilder,
    config: Option<HackHourConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
    resilience_config: Option<ResilienceConfig>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl HackHourClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: HackHourConfigBuilder::new(),
            config: None,
            transport: None,
            auth: None,
            resilience_config: None,
            metrics: None,
        }
    }

    /// Creates a builder from an existing configuration.
    ///
    /// Configuration setters on the builder are ignored afterwards.
    pub fn from_config(config: HackHourConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Sets the Slack ID of the user.
    pub fn slack_id(mut self, slack_id: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.slack_id(slack_id);
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the maximum retries of a throttled request.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config_builder = self.config_builder.max_retries(retries);
        self
    }

    /// Retries throttled requests until they go through.
    pub fn unlimited_retries(mut self) -> Self {
        self.config_builder = self.config_builder.unlimited_retries();
        self
    }

    /// Sets the pause before a throttled request is queued again.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config_builder = self.config_builder.retry_delay(delay);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the resilience configuration, overriding the one derived from
    /// the client configuration.
    pub fn resilience(mut self, config: ResilienceConfig) -> Self {
        self.resilience_config = Some(config);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the client.
    ///
    /// Must be called within a Tokio runtime: the queue workers are spawned
    /// here.
    pub fn build(self) -> HackHourResult<HackHourClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(HackHourError::configuration(
                "HackHourClient must be built inside a Tokio runtime",
            ));
        }

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                ReqwestTransport::new(&config.base_url, config.timeout).map_err(|e| {
                    HackHourError::Configuration {
                        message: e.to_string(),
                    }
                })?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(ApiKeyAuth::from_string(config.api_key())),
        };
        auth.validate()?;

        let metrics: Arc<dyn MetricsCollector> = self
            .metrics
            .unwrap_or_else(|| Arc::new(DefaultMetricsCollector::new()));

        let resilience_config = self
            .resilience_config
            .unwrap_or_else(|| ResilienceConfig::from_config(&config));
        let resilience = Arc::new(ResilienceOrchestrator::new(
            resilience_config,
            Arc::clone(&metrics),
        ));

        tracing::debug!(
            slack_id = %config.slack_id(),
            base_url = %config.base_url,
            api_key = %config.api_key_hint(),
            "Hack Hour client built"
        );

        Ok(HackHourClient::from_context(ServiceContext {
            transport,
            auth,
            resilience,
            metrics,
            config: Arc::new(config),
        }))
    }
}

impl Default for HackHourClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
