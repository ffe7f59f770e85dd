//! Server-driven request queue.
//!
//! A [`RateLimiter`] owns a FIFO queue of tasks and a token budget. A single
//! worker task admits queued tasks one at a time while budget remains. Each
//! task reports the budget snapshot the server sent back, which replaces the
//! local bookkeeping and schedules the next reset.

use chrono::{DateTime, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::errors::{HackHourError, HackHourResult};
use crate::transport::{HttpMethod, HttpResponse};

/// Header carrying the budget size.
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header carrying the remaining budget.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the reset instant, in seconds since the epoch.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Which of the two request queues a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// GET requests.
    Reads,
    /// POST requests.
    Writes,
}

impl QueueKind {
    /// Queue serving the given HTTP method.
    pub fn for_method(method: HttpMethod) -> Self {
        if method.is_write() {
            QueueKind::Writes
        } else {
            QueueKind::Reads
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::Reads => "reads",
            QueueKind::Writes => "writes",
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget snapshot reported by the server after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitData {
    /// Budget size.
    pub max: u32,
    /// Calls left in the current window.
    pub left: u32,
    /// When the budget refills.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitData {
    /// Parses the snapshot from a response. All three headers must be present
    /// and numeric.
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        let max = response.header(LIMIT_HEADER)?.trim().parse().ok()?;
        let left = response.header(REMAINING_HEADER)?.trim().parse().ok()?;
        let reset_at = parse_reset(response.header(RESET_HEADER)?)?;

        Some(Self {
            max,
            left,
            reset_at,
        })
    }

    /// Time until the reset instant; zero once it has passed.
    pub fn reset_in(&self) -> Duration {
        (self.reset_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Seconds since the epoch, integral or fractional.
fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }

    let secs = value.parse::<f64>().ok().filter(|s| s.is_finite())?;
    #[allow(clippy::cast_possible_truncation)]
    let millis = (secs * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Published whenever a queue applies a new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEvent {
    /// Queue that received the snapshot.
    pub queue: QueueKind,
    /// The snapshot.
    pub snapshot: RateLimitData,
}

/// Point-in-time view of a queue's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Queue described.
    pub queue: QueueKind,
    /// Budget size.
    pub max: u32,
    /// Calls left before the queue stalls.
    pub left: u32,
    /// Scheduled refill, if any.
    pub reset_at: Option<DateTime<Utc>>,
    /// Tasks waiting for admission.
    pub pending: usize,
}

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Budget assumed until the server reports one.
    pub initial_budget: u32,
    /// Reset window used when the budget runs out without a server snapshot.
    pub fallback_reset: Duration,
    /// Buffered telemetry events per subscriber.
    pub event_capacity: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            initial_budget: 1,
            fallback_reset: Duration::from_secs(60),
            event_capacity: 64,
        }
    }
}

impl RateLimiterConfig {
    /// Creates a configuration with the given initial budget.
    pub fn new(initial_budget: u32) -> Self {
        Self {
            initial_budget,
            ..Default::default()
        }
    }

    /// Sets the fallback reset window.
    pub fn fallback_reset(mut self, window: Duration) -> Self {
        self.fallback_reset = window;
        self
    }
}

type Job = Box<dyn FnOnce() -> BoxFuture<'static, Option<RateLimitData>> + Send>;

struct BudgetState {
    max: u32,
    left: u32,
    reset_at: Option<DateTime<Utc>>,
    reset_timer: Option<JoinHandle<()>>,
    // Bumped per scheduled timer so a superseded timer that already woke is ignored.
    generation: u64,
}

struct Shared {
    kind: QueueKind,
    config: RateLimiterConfig,
    state: Mutex<BudgetState>,
    budget_restored: Notify,
    pending: AtomicUsize,
    events: broadcast::Sender<RateLimitEvent>,
}

/// FIFO request queue gated by a server-reported budget.
///
/// Must be created inside a Tokio runtime: construction spawns the worker
/// that admits tasks. The worker stops once the limiter is dropped and the
/// queue has drained.
pub struct RateLimiter {
    shared: Arc<Shared>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl RateLimiter {
    /// Creates a limiter and starts its worker.
    pub fn new(kind: QueueKind, config: RateLimiterConfig) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let budget = config.initial_budget;

        let shared = Arc::new(Shared {
            kind,
            config,
            state: Mutex::new(BudgetState {
                max: budget,
                left: budget,
                reset_at: None,
                reset_timer: None,
                generation: 0,
            }),
            budget_restored: Notify::new(),
            pending: AtomicUsize::new(0),
            events,
        });

        tokio::spawn(worker(Arc::clone(&shared), receiver));

        Self { shared, jobs }
    }

    /// Queue this limiter serves.
    pub fn kind(&self) -> QueueKind {
        self.shared.kind
    }

    /// Appends a task to the tail of the queue.
    ///
    /// The task runs once admitted; its output is the budget snapshot of the
    /// call it made, or `None` when it has none to report.
    pub fn enqueue<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<RateLimitData>> + Send + 'static,
    {
        let job: Job = Box::new(move || task().boxed());
        self.shared.pending.fetch_add(1, Ordering::SeqCst);

        if self.jobs.send(job).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(queue = %self.shared.kind, "Queue worker is gone; task dropped");
        }
    }

    /// Queues a task and waits for its value.
    ///
    /// The task yields its value together with the snapshot to apply. Fails
    /// with [`HackHourError::QueueClosed`] when the task never completes
    /// (worker gone, or the task panicked).
    pub async fn run<F, Fut, T>(&self, task: F) -> HackHourResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = (T, Option<RateLimitData>)> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.enqueue(move || async move {
            let (value, snapshot) = task().await;
            // The caller may have stopped waiting.
            let _ = tx.send(value);
            snapshot
        });

        rx.await.map_err(|_| HackHourError::QueueClosed)
    }

    /// Current budget.
    pub fn budget(&self) -> Budget {
        let state = self.shared.state.lock();
        Budget {
            queue: self.shared.kind,
            max: state.max,
            left: state.left,
            reset_at: state.reset_at,
            pending: self.shared.pending.load(Ordering::SeqCst),
        }
    }

    /// Subscribes to budget updates.
    pub fn subscribe(&self) -> broadcast::Receiver<RateLimitEvent> {
        self.shared.events.subscribe()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("budget", &self.budget())
            .finish()
    }
}

async fn worker(shared: Arc<Shared>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = jobs.recv().await {
        shared.wait_for_budget().await;
        shared.admit();

        match AssertUnwindSafe(async move { job().await })
            .catch_unwind()
            .await
        {
            Ok(Some(snapshot)) => shared.apply(snapshot),
            Ok(None) => shared.ensure_reset_scheduled(),
            Err(_) => {
                warn!(queue = %shared.kind, "Queued task panicked; continuing with the next one");
                shared.ensure_reset_scheduled();
            }
        }
    }

    debug!(queue = %shared.kind, "Request queue closed");
}

impl Shared {
    async fn wait_for_budget(&self) {
        loop {
            let available = self.state.lock().left > 0;
            if available {
                return;
            }
            trace!(queue = %self.kind, "Budget exhausted; waiting for reset");
            self.budget_restored.notified().await;
        }
    }

    fn admit(&self) {
        let mut state = self.state.lock();
        state.left = state.left.saturating_sub(1);
        self.pending.fetch_sub(1, Ordering::SeqCst);
        trace!(queue = %self.kind, left = state.left, "Task admitted");
    }

    fn apply(self: &Arc<Self>, snapshot: RateLimitData) {
        {
            let mut state = self.state.lock();
            // A zero-sized budget would never refill.
            let max = snapshot.max.max(1);
            state.max = max;
            state.left = snapshot.left.min(max);
            state.reset_at = Some(snapshot.reset_at);
            self.schedule_reset(&mut state, snapshot.reset_in());

            debug!(
                queue = %self.kind,
                max = state.max,
                left = state.left,
                reset_at = %snapshot.reset_at,
                "Rate limit updated"
            );
        }

        // No subscribers is fine.
        let _ = self.events.send(RateLimitEvent {
            queue: self.kind,
            snapshot,
        });
    }

    /// Keeps an exhausted queue from stalling forever when calls report no snapshot.
    fn ensure_reset_scheduled(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.left > 0 || state.reset_timer.is_some() {
            return;
        }

        let window = self.config.fallback_reset;
        state.reset_at = chrono::Duration::from_std(window)
            .ok()
            .map(|window| Utc::now() + window);
        self.schedule_reset(&mut state, window);

        debug!(
            queue = %self.kind,
            window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            "Budget exhausted without rate limit headers; using fallback reset"
        );
    }

    fn schedule_reset(self: &Arc<Self>, state: &mut BudgetState, delay: Duration) {
        if let Some(previous) = state.reset_timer.take() {
            previous.abort();
        }

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let shared = Arc::clone(self);

        state.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.restore_budget(generation);
        }));
    }

    fn restore_budget(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.left = state.max;
            state.reset_at = None;
            state.reset_timer = None;
            debug!(queue = %self.kind, left = state.left, "Budget reset");
        }

        self.budget_restored.notify_one();
    }
}
