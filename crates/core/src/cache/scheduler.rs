//! Periodic cleanup scheduler
//!
//! Runs [`CleanupSweeper::cleanup_once`] on a fixed interval in a background
//! task with explicit lifecycle management.
//!
//! # Features
//!
//! - Optional jitter on the period
//! - Graceful shutdown with cancellation and a bounded join
//! - Restartable after `stop`

use std::sync::Arc;
use std::time::Duration;

use tidepool_common::error::{CommonError, CommonResult};
use tidepool_common::time::{Interval, IntervalConfig};
use tidepool_domain::constants::SCHEDULER_STOP_TIMEOUT_SECS;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::cleanup::CleanupSweeper;

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the cleanup scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between sweeps
    pub interval: Duration,
    /// Optional jitter factor (0.0 - 1.0)
    pub jitter: Option<f64>,
    /// Bound on waiting for the loop to exit in `stop`
    pub stop_timeout: Duration,
}

impl SchedulerConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval, jitter: None, stop_timeout: Duration::from_secs(SCHEDULER_STOP_TIMEOUT_SECS) }
    }

    pub fn with_jitter(mut self, jitter: Option<f64>) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Background cleanup scheduler with lifecycle management
pub struct CleanupScheduler {
    sweeper: Arc<CleanupSweeper>,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl CleanupScheduler {
    pub fn new(sweeper: Arc<CleanupSweeper>, config: SchedulerConfig) -> Self {
        Self {
            sweeper,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// The first sweep happens one full period after start; startup sweeps
    /// are the engine's job.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> CommonResult<()> {
        if self.is_running().await {
            return Err(CommonError::config("Cleanup scheduler already running"));
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting cleanup scheduler");

        // Fresh token so the scheduler can restart after stop
        self.cancellation_token = CancellationToken::new();

        let sweeper = Arc::clone(&self.sweeper);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::cleanup_loop(sweeper, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion. An in-flight sweep
    /// is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is not running, the task panicked, or it
    /// did not exit within the stop timeout
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> CommonResult<()> {
        if !self.is_running().await {
            return Err(CommonError::config("Cleanup scheduler not running"));
        }

        info!("Stopping cleanup scheduler");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let limit = self.config.stop_timeout;
            match tokio::time::timeout(limit, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Cleanup scheduler task panicked");
                    return Err(CommonError::internal_with_context(
                        format!("Cleanup task panicked: {e}"),
                        "cleanup_scheduler",
                    ));
                }
                Err(_) => {
                    warn!("Cleanup scheduler did not complete within timeout");
                    return Err(CommonError::timeout("cleanup_scheduler", limit));
                }
            }
        }

        info!("Cleanup scheduler stopped");

        Ok(())
    }

    /// Check if the scheduler has a live background task
    pub async fn is_running(&self) -> bool {
        let guard = self.task_handle.lock().await;
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn cleanup_loop(
        sweeper: Arc<CleanupSweeper>,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) {
        let mut interval_config = IntervalConfig::new(config.interval).delay_first_tick(true);
        if let Some(jitter) = config.jitter {
            interval_config = interval_config.with_jitter(jitter);
        }
        let mut interval = Interval::new(interval_config);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Cleanup loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match sweeper.cleanup_once().await {
                        Ok(report) => {
                            debug!(
                                version_purged = report.version_purged,
                                expired = report.expired,
                                "Periodic cleanup completed"
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "Periodic cleanup failed");
                        }
                    }
                }
            }
        }
    }
}

/// Ensure the loop is cancelled when the scheduler is dropped
impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        // Can't inspect the handle here (async lock), so go by the token
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}

impl std::fmt::Debug for CleanupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupScheduler").field("config", &self.config).finish_non_exhaustive()
    }
}
