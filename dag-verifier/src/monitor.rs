//! Verification Monitor
//!
//! Runs a verification pass every interval in a background task and delivers
//! each summary through the retry loop. Stopping the monitor cancels the pass
//! in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cancel::{cancel_pair, CancelHandle, CancelSignal};
use crate::config::VerifierConfig;
use crate::error::{NotifyError, VerifierResult};
use crate::notify::{NotificationDispatcher, Notifier};
use crate::retry::{deliver, DeliveryReport, RetryPolicy};
use crate::runner::{RunReport, VerificationRunner};

/// One pass and its delivery
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub report: RunReport,
    /// `None` when no notifier is set or the monitor stopped first
    pub delivery: Option<Result<DeliveryReport, NotifyError>>,
}

/// Periodic verification monitor
pub struct VerificationMonitor {
    runner: VerificationRunner,
    projects: Vec<String>,
    interval: Duration,
    notifier: Option<Arc<dyn Notifier>>,
    policy: RetryPolicy,
    last_pass: Arc<RwLock<Option<PassOutcome>>>,
    passes: Arc<AtomicU64>,
}

impl VerificationMonitor {
    /// Create a monitor without a notifier
    pub fn new(runner: VerificationRunner, projects: Vec<String>, interval: Duration) -> Self {
        Self {
            runner,
            projects,
            interval: interval.max(Duration::from_millis(1)),
            notifier: None,
            policy: RetryPolicy::default(),
            last_pass: Arc::new(RwLock::new(None)),
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Deliver each summary through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, policy: RetryPolicy) -> Self {
        self.notifier = Some(notifier);
        self.policy = policy;
        self
    }

    /// Build from configuration, notifying only when a webhook is set
    pub fn from_config(config: &VerifierConfig) -> VerifierResult<Self> {
        let runner = VerificationRunner::from_config(config)?;
        let monitor = Self::new(runner, config.project_ids(), config.interval());

        Ok(match NotificationDispatcher::from_config(&config.webhook)? {
            Some(dispatcher) => monitor.with_notifier(
                Arc::new(dispatcher),
                RetryPolicy::from_config(&config.webhook),
            ),
            None => monitor,
        })
    }

    pub fn runner(&self) -> &VerificationRunner {
        &self.runner
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one pass and deliver its summary
    pub async fn run_pass(&self, cancel: CancelSignal) -> PassOutcome {
        let report = self.runner.run_until(&self.projects, cancel.clone()).await;

        let delivery = match &self.notifier {
            Some(notifier) if !cancel.is_cancelled() => tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = deliver(notifier.as_ref(), &report.summary, &self.policy) => Some(result),
            },
            Some(_) => None,
            None => {
                debug!("No notifier configured, summary not delivered");
                None
            }
        };

        PassOutcome { report, delivery }
    }

    /// Start the monitor in a background task
    ///
    /// Returns a handle that can be used to stop the monitor.
    pub fn start(self) -> MonitorHandle {
        let (shutdown, signal) = cancel_pair();
        let last_pass = self.last_pass.clone();
        let passes = self.passes.clone();
        let interval = self.interval;

        let task_handle = tokio::spawn(async move {
            self.run_monitor_loop(signal).await;
        });

        MonitorHandle {
            shutdown,
            task_handle,
            last_pass,
            passes,
            interval,
        }
    }

    async fn run_monitor_loop(self, shutdown: CancelSignal) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            projects = self.projects.len(),
            notify = self.notifier.is_some(),
            "Verification monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Verification monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.run_pass(shutdown.clone()).await;
                    let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;

                    match &outcome.delivery {
                        Some(Ok(delivery)) => {
                            debug!(pass, attempts = delivery.attempts, "Summary delivered");
                        }
                        Some(Err(e)) => {
                            error!(pass, error = %e, "Summary delivery failed");
                        }
                        None => {}
                    }
                    if outcome.report.summary.has_issues() {
                        warn!(
                            pass,
                            issues = outcome.report.summary.overall_issue_count,
                            "Chain issues found"
                        );
                    }

                    *self.last_pass.write().await = Some(outcome);
                }
            }
        }
    }
}

/// Handle for controlling the monitor
pub struct MonitorHandle {
    shutdown: CancelHandle,
    task_handle: tokio::task::JoinHandle<()>,
    last_pass: Arc<RwLock<Option<PassOutcome>>>,
    passes: Arc<AtomicU64>,
    interval: Duration,
}

impl MonitorHandle {
    /// Stop the monitor, cancelling any pass in flight
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.task_handle.await;
        info!("Verification monitor stopped");
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Outcome of the most recent pass
    pub async fn last_pass(&self) -> Option<PassOutcome> {
        self.last_pass.read().await.clone()
    }

    /// Passes completed so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
