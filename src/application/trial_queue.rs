//! In-memory trial queue with priority scheduling, worker pool, rate
//! limiting, and retry with exponential backoff.
//!
//! Durability comes from the scenario table, not the queue: a crash loses
//! only in-flight scheduling state, and incomplete scenarios are re-enqueued
//! on startup. Job ids equal scenario ids, so a duplicate enqueue while a
//! job is waiting, active, or awaiting retry is a no-op.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::errors::ExecutionError;
use crate::domain::models::{
    JobOutcome, JobState, PriorityQueue, QueueConfig, QueueDepth, Scenario, TrialJob,
};
use crate::infrastructure::api::TokenBucketRateLimiter;

/// Executes one trial job. Implemented by the trial executor; mocked in
/// queue tests.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &TrialJob) -> Result<(), ExecutionError>;
}

/// Worker poll interval while waiting for work or a resume.
const IDLE_POLL: Duration = Duration::from_millis(50);

struct QueueInner {
    waiting: PriorityQueue<TrialJob>,
    /// Ids of jobs that are waiting, active, or sleeping out a retry delay
    tracked_ids: HashSet<String>,
    active: usize,
    /// Jobs sleeping out a retry backoff
    scheduled_retries: usize,
    /// Recent terminal outcomes, bounded by the retention limits
    completed: VecDeque<JobOutcome>,
    failed: VecDeque<JobOutcome>,
    total_completed: usize,
    total_failed: usize,
    closed: bool,
}

/// Priority trial queue with a fixed worker pool.
pub struct TrialQueue {
    inner: Mutex<QueueInner>,
    paused: AtomicBool,
    handler: Arc<dyn JobHandler>,
    limiter: TokenBucketRateLimiter,
    config: QueueConfig,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TrialQueue {
    pub fn new(config: QueueConfig, handler: Arc<dyn JobHandler>) -> Arc<Self> {
        let limiter = TokenBucketRateLimiter::new(config.jobs_per_second);
        Arc::new(Self {
            inner: Mutex::new(QueueInner {
                waiting: PriorityQueue::new(),
                tracked_ids: HashSet::new(),
                active: 0,
                scheduled_retries: 0,
                completed: VecDeque::new(),
                failed: VecDeque::new(),
                total_completed: 0,
                total_failed: 0,
                closed: false,
            }),
            paused: AtomicBool::new(false),
            handler,
            limiter,
            config,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the worker pool. Call once.
    pub fn start(self: &Arc<Self>) {
        let mut workers = self.workers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for worker_id in 0..self.config.concurrency {
            let queue = Arc::clone(self);
            workers.push(tokio::spawn(async move {
                queue.worker_loop(worker_id).await;
            }));
        }
        info!(workers = self.config.concurrency, "trial queue started");
    }

    /// Enqueue one scenario as a job. Returns false if a job with the same
    /// scenario id is already tracked, or if the queue is closed.
    pub fn enqueue(&self, scenario: Scenario) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            warn!(scenario_id = %scenario.id, "enqueue rejected: queue closed");
            return false;
        }
        if !inner.tracked_ids.insert(scenario.id.clone()) {
            debug!(scenario_id = %scenario.id, "duplicate enqueue ignored");
            return false;
        }
        let job = TrialJob::new(scenario);
        let priority = job.priority();
        inner.waiting.enqueue(job, priority);
        true
    }

    /// Enqueue a batch, returning how many were accepted.
    pub fn enqueue_batch(&self, scenarios: Vec<Scenario>) -> usize {
        scenarios.into_iter().filter(|s| self.enqueue(s.clone())).count()
    }

    /// Stop workers from picking up new jobs. Active jobs run to completion.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("trial queue paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("trial queue resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Close the queue to new work. Workers exit once everything tracked
    /// has reached a terminal state.
    pub fn close(&self) {
        self.lock().closed = true;
        info!("trial queue closed");
    }

    /// Wait until all tracked jobs have reached a terminal state.
    pub async fn drain(&self) {
        loop {
            {
                let inner = self.lock();
                if inner.waiting.is_empty() && inner.active == 0 && inner.scheduled_retries == 0 {
                    return;
                }
            }
            sleep(IDLE_POLL).await;
        }
    }

    /// Close, drain, and join the worker pool.
    pub async fn shutdown(&self) {
        self.close();
        self.drain().await;
        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self
                .workers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.drain(..).collect()
        };
        for handle in workers {
            let _ = handle.await;
        }
    }

    /// Current queue depth counters. Completed and failed counts are
    /// cumulative totals, not retention-buffer sizes.
    pub fn depth(&self) -> QueueDepth {
        let inner = self.lock();
        QueueDepth {
            waiting: inner.waiting.len() + inner.scheduled_retries,
            active: inner.active,
            completed: inner.total_completed,
            failed: inner.total_failed,
        }
    }

    /// Recent terminal outcomes, newest first, bounded by retention.
    pub fn recent_outcomes(&self) -> (Vec<JobOutcome>, Vec<JobOutcome>) {
        let inner = self.lock();
        (
            inner.completed.iter().cloned().collect(),
            inner.failed.iter().cloned().collect(),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        debug!(worker_id, "worker started");
        loop {
            if self.is_paused() {
                sleep(IDLE_POLL).await;
                continue;
            }

            // The guard's scope must end before any await so the worker
            // future stays Send.
            let dequeued = {
                let mut inner = self.lock();
                if inner.closed
                    && inner.waiting.is_empty()
                    && inner.active == 0
                    && inner.scheduled_retries == 0
                {
                    break;
                }
                inner.waiting.dequeue().map(|job| {
                    inner.active += 1;
                    job
                })
            };
            let Some(job) = dequeued else {
                sleep(IDLE_POLL).await;
                continue;
            };

            self.limiter.acquire().await;
            Arc::clone(&self).execute(job).await;
        }
        debug!(worker_id, "worker stopped");
    }

    async fn execute(self: Arc<Self>, mut job: TrialJob) {
        job.attempts_made += 1;
        let attempt = job.attempts_made;
        debug!(job_id = %job.id(), attempt, "trial attempt started");

        let result = self.handler.handle(&job).await;

        let mut inner = self.lock();
        inner.active -= 1;
        match result {
            Ok(()) => {
                inner.tracked_ids.remove(job.id());
                inner.total_completed += 1;
                push_bounded(
                    &mut inner.completed,
                    outcome(&job, JobState::Completed, None),
                    self.config.keep_completed,
                );
                info!(job_id = %job.id(), attempt, "trial completed");
            }
            Err(err) if attempt < self.config.retry.max_attempts => {
                let delay_ms = self.config.retry.backoff_ms(attempt);
                let delay = Duration::from_millis(delay_ms);
                inner.scheduled_retries += 1;
                drop(inner);
                warn!(job_id = %job.id(), attempt, error = %err, delay_ms, "trial failed, retry scheduled");
                let queue = Arc::clone(&self);
                tokio::spawn(async move {
                    sleep(delay).await;
                    let mut inner = queue.lock();
                    inner.scheduled_retries -= 1;
                    // The id stays tracked across the backoff sleep, so the
                    // dedupe guarantee holds for retries too.
                    let priority = job.priority();
                    inner.waiting.enqueue(job, priority);
                });
            }
            Err(err) => {
                inner.tracked_ids.remove(job.id());
                inner.total_failed += 1;
                push_bounded(
                    &mut inner.failed,
                    outcome(&job, JobState::Failed, Some(err.to_string())),
                    self.config.keep_failed,
                );
                error!(job_id = %job.id(), attempt, error = %err, "trial failed permanently");
            }
        }
    }
}

fn outcome(job: &TrialJob, state: JobState, error: Option<String>) -> JobOutcome {
    JobOutcome {
        job_id: job.id().to_string(),
        state,
        attempts_made: job.attempts_made,
        error,
        finished_at: Utc::now(),
    }
}

/// Push newest-first with a retention bound.
fn push_bounded(buffer: &mut VecDeque<JobOutcome>, item: JobOutcome, limit: usize) {
    buffer.push_front(item);
    buffer.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        ComplexityMetrics, RetryConfig, Tier, ToolConfig, ValidationPolicy,
    };
    use std::sync::atomic::AtomicUsize;

    fn scenario(id: &str, tier: Tier) -> Scenario {
        Scenario {
            id: id.to_string(),
            experiment_id: "exp".to_string(),
            domain: "analytical".to_string(),
            tier,
            repetition: 0,
            model_id: "sonnet".to_string(),
            tool_config: ToolConfig::default(),
            title: String::new(),
            description: String::new(),
            business_context: String::new(),
            success_criteria: vec![],
            expected_calculations: vec![],
            expected_insights: vec![],
            requirements: vec![],
            optional_data: vec![],
            complexity_score: 2.0,
            complexity_metrics: ComplexityMetrics::default(),
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fast_config(concurrency: usize) -> QueueConfig {
        QueueConfig {
            concurrency,
            jobs_per_second: 1000.0,
            retry: RetryConfig {
                max_attempts: 3,
                initial_backoff_ms: 10,
                max_backoff_ms: 100,
            },
            keep_completed: 1000,
            keep_failed: 5000,
            validation_policy: ValidationPolicy::AllOrNothing,
        }
    }

    /// Handler that fails a configurable number of times per job, then
    /// succeeds, recording the order jobs were picked up in.
    struct ScriptedHandler {
        failures_before_success: u32,
        attempts: Mutex<std::collections::HashMap<String, u32>>,
        order: Mutex<Vec<String>>,
        handled: AtomicUsize,
    }

    impl ScriptedHandler {
        fn new(failures_before_success: u32) -> Self {
            Self {
                failures_before_success,
                attempts: Mutex::new(std::collections::HashMap::new()),
                order: Mutex::new(Vec::new()),
                handled: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobHandler for ScriptedHandler {
        async fn handle(&self, job: &TrialJob) -> Result<(), ExecutionError> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(job.id().to_string());
            let mut attempts = self.attempts.lock().unwrap();
            let seen = attempts.entry(job.id().to_string()).or_insert(0);
            *seen += 1;
            if *seen <= self.failures_before_success {
                return Err(ExecutionError::Agent(
                    crate::domain::ports::agent::AgentError::ExecutionFailed(
                        "scripted failure".to_string(),
                    ),
                ));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_jobs_complete_and_counted() {
        let handler = Arc::new(ScriptedHandler::new(0));
        let queue = TrialQueue::new(fast_config(4), handler.clone());
        queue.start();

        for i in 0..8 {
            assert!(queue.enqueue(scenario(&format!("job-{i}"), Tier::Simple)));
        }
        queue.shutdown().await;

        let depth = queue.depth();
        assert_eq!(depth.completed, 8);
        assert_eq!(depth.failed, 0);
        assert_eq!(depth.waiting, 0);
        assert_eq!(depth.active, 0);
    }

    #[tokio::test]
    async fn test_duplicate_enqueue_is_noop() {
        let handler = Arc::new(ScriptedHandler::new(0));
        let queue = TrialQueue::new(fast_config(1), handler.clone());

        assert!(queue.enqueue(scenario("dup", Tier::Simple)));
        assert!(!queue.enqueue(scenario("dup", Tier::Simple)));

        queue.start();
        queue.shutdown().await;
        assert_eq!(queue.depth().completed, 1);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_simple_tier_dequeues_first() {
        let handler = Arc::new(ScriptedHandler::new(0));
        // Single worker so pickup order is observable.
        let queue = TrialQueue::new(fast_config(1), handler.clone());

        queue.enqueue(scenario("c", Tier::Complex));
        queue.enqueue(scenario("m", Tier::Moderate));
        queue.enqueue(scenario("s", Tier::Simple));
        queue.start();
        queue.shutdown().await;

        let order = handler.order.lock().unwrap().clone();
        assert_eq!(order, vec!["s", "m", "c"]);
    }

    #[tokio::test]
    async fn test_retry_then_success_counts_attempts() {
        // Fails twice, succeeds on the third attempt.
        let handler = Arc::new(ScriptedHandler::new(2));
        let queue = TrialQueue::new(fast_config(1), handler.clone());
        queue.start();

        queue.enqueue(scenario("flaky", Tier::Simple));
        queue.shutdown().await;

        let depth = queue.depth();
        assert_eq!(depth.completed, 1);
        assert_eq!(depth.failed, 0);
        let (completed, _) = queue.recent_outcomes();
        assert_eq!(completed[0].attempts_made, 3);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_exhausted_fails_job() {
        // Never succeeds within 3 attempts.
        let handler = Arc::new(ScriptedHandler::new(10));
        let queue = TrialQueue::new(fast_config(1), handler.clone());
        queue.start();

        queue.enqueue(scenario("doomed", Tier::Simple));
        queue.shutdown().await;

        let depth = queue.depth();
        assert_eq!(depth.completed, 0);
        assert_eq!(depth.failed, 1);
        let (_, failed) = queue.recent_outcomes();
        assert_eq!(failed[0].attempts_made, 3);
        assert_eq!(failed[0].state, JobState::Failed);
        assert!(failed[0].error.as_deref().unwrap().contains("scripted failure"));
        assert_eq!(handler.handled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pause_blocks_pickup() {
        let handler = Arc::new(ScriptedHandler::new(0));
        let queue = TrialQueue::new(fast_config(2), handler.clone());
        queue.pause();
        queue.start();

        queue.enqueue(scenario("held", Tier::Simple));
        sleep(Duration::from_millis(150)).await;
        assert_eq!(handler.handled.load(Ordering::SeqCst), 0);
        assert_eq!(queue.depth().waiting, 1);

        queue.resume();
        queue.shutdown().await;
        assert_eq!(queue.depth().completed, 1);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_enqueue() {
        let handler = Arc::new(ScriptedHandler::new(0));
        let queue = TrialQueue::new(fast_config(1), handler);
        queue.close();
        assert!(!queue.enqueue(scenario("late", Tier::Simple)));
    }

    #[test]
    fn test_retention_bound() {
        let mut buffer = VecDeque::new();
        for i in 0..10 {
            push_bounded(
                &mut buffer,
                JobOutcome {
                    job_id: format!("j{i}"),
                    state: JobState::Completed,
                    attempts_made: 1,
                    error: None,
                    finished_at: Utc::now(),
                },
                3,
            );
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer[0].job_id, "j9");
    }
}
