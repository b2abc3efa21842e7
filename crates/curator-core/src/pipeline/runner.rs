//! Sequential, cancellable scoring-and-annotation run over an image queue.
//!
//! The pipeline is the only writer of its snapshot channel. After every
//! change it publishes the whole [`RunSnapshot`], so a subscriber that
//! misses intermediate values still sees a consistent, monotonically
//! growing result list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{ConfigError, CuratorError, Result};
use crate::llm::InferenceProvider;
use crate::policy::{decide, Decision};
use crate::types::{ImageItem, ItemResult, PipelineConfig};
use crate::validation::ConnectionStatus;

use super::results::{ResultSet, RunSummary};

pub const PROGRESS_STARTING: &str = "Starting analysis...";
pub const PROGRESS_STOPPED: &str = "Processing stopped by user.";

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// A stop was requested; the current item is finishing
    Stopping,
}

/// Everything a subscriber needs to render a run.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    pub state: RunState,
    /// Human-readable progress; empty when idle after completion
    pub progress: String,
    pub results: ResultSet,
}

/// Shared flags between the pipeline and its stop handles.
#[derive(Default)]
struct RunFlags {
    running: AtomicBool,
    cancel: AtomicBool,
}

/// Requests cooperative cancellation of the active run.
#[derive(Clone)]
pub struct StopHandle {
    flags: Arc<RunFlags>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
}

impl StopHandle {
    /// Ask the active run to stop before its next item.
    ///
    /// Has no effect when no run is active. An in-flight provider call is
    /// never aborted.
    pub fn stop(&self) {
        if !self.flags.running.load(Ordering::SeqCst) {
            return;
        }
        self.flags.cancel.store(true, Ordering::SeqCst);
        self.snapshots.send_if_modified(|s| {
            if s.state == RunState::Running {
                s.state = RunState::Stopping;
                true
            } else {
                false
            }
        });
        tracing::info!("Stop requested; finishing current image");
    }
}

/// Resets the run flags however the run ends, including when the
/// `start` future is dropped mid-run.
struct RunGuard<'a> {
    flags: &'a RunFlags,
    snapshots: &'a watch::Sender<RunSnapshot>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flags.cancel.store(false, Ordering::SeqCst);
        self.flags.running.store(false, Ordering::SeqCst);
        self.snapshots.send_if_modified(|s| {
            let changed = s.state != RunState::Idle;
            s.state = RunState::Idle;
            changed
        });
    }
}

/// Drives one provider over a queue of images, one image at a time.
pub struct BatchPipeline {
    provider: Arc<dyn InferenceProvider>,
    flags: Arc<RunFlags>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
}

impl BatchPipeline {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        let (snapshots, _) = watch::channel(RunSnapshot::default());
        Self {
            provider,
            flags: Arc::new(RunFlags::default()),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Live view of state, progress and results.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flags: self.flags.clone(),
            snapshots: self.snapshots.clone(),
        }
    }

    pub fn state(&self) -> RunState {
        self.snapshots.borrow().state
    }

    /// Copy of the current results.
    pub fn results(&self) -> ResultSet {
        self.snapshots.borrow().results.clone()
    }

    /// Drop all results, for example after the image queue was cleared.
    /// Ignored while a run is active.
    pub fn clear_results(&self) {
        if self.flags.running.load(Ordering::SeqCst) {
            return;
        }
        self.snapshots.send_modify(|s| {
            s.results.clear();
            s.progress.clear();
        });
    }

    /// Run the whole queue.
    ///
    /// Fails without changing any state when a run is already active, the
    /// connection is not valid, the queue is empty, or the concept is blank.
    /// Per-image provider failures never fail the run; they are recorded as
    /// error results.
    pub async fn start(
        &self,
        images: &[ImageItem],
        config: &PipelineConfig,
        connection: &ConnectionStatus,
    ) -> Result<RunSummary> {
        if self.flags.running.load(Ordering::SeqCst) {
            return Err(CuratorError::AlreadyRunning);
        }
        if !connection.is_valid() {
            return Err(ConfigError::ConnectionNotValidated.into());
        }
        if images.is_empty() {
            return Err(ConfigError::EmptyQueue.into());
        }
        config.validate()?;

        if self
            .flags
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CuratorError::AlreadyRunning);
        }
        self.flags.cancel.store(false, Ordering::SeqCst);
        let _guard = RunGuard {
            flags: &self.flags,
            snapshots: &self.snapshots,
        };

        self.snapshots.send_replace(RunSnapshot {
            state: RunState::Running,
            progress: PROGRESS_STARTING.to_string(),
            results: ResultSet::new(),
        });

        let total = images.len();
        tracing::info!(
            "Curating {total} image(s) for '{}' with {} (threshold {:.2}, {})",
            config.concept,
            self.provider.name(),
            config.threshold,
            config.mode
        );

        let mut results = ResultSet::new();
        for (index, image) in images.iter().enumerate() {
            if self.flags.cancel.load(Ordering::SeqCst) {
                self.snapshots.send_modify(|s| {
                    s.state = RunState::Idle;
                    s.progress = PROGRESS_STOPPED.to_string();
                });
                tracing::info!("Stopped after {} of {total} image(s)", results.len());
                return Ok(results.summary(total, true));
            }

            let result = self.process_one(image, index + 1, total, config).await;
            results.push(result.clone());
            self.snapshots.send_modify(|s| s.results.push(result));
        }

        self.snapshots.send_modify(|s| {
            s.state = RunState::Idle;
            s.progress.clear();
        });

        let summary = results.summary(total, false);
        tracing::info!(
            "Finished: {} accepted, {} rejected, {} errored",
            summary.accepted,
            summary.rejected,
            summary.errored
        );
        Ok(summary)
    }

    /// Score one image and annotate it when accepted.
    async fn process_one(
        &self,
        image: &ImageItem,
        position: usize,
        total: usize,
        config: &PipelineConfig,
    ) -> ItemResult {
        let start = Instant::now();
        self.set_progress(format!(
            "Scoring image {position} of {total}: {}",
            image.file_name
        ));

        let outcome = match self.provider.score_image(image, &config.concept).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Error processing {}: {e}", image.file_name);
                return ItemResult::error(image.clone(), e.to_string());
            }
        };

        let result = match decide(outcome.score, config.threshold) {
            Decision::Rejected => ItemResult::rejected(image.clone(), outcome),
            Decision::Accepted => {
                self.set_progress(format!(
                    "Generating annotation for image {position} of {total}..."
                ));
                match self
                    .provider
                    .annotate_image(image, &config.concept, config.mode)
                    .await
                {
                    Ok(annotation) => ItemResult::accepted(image.clone(), outcome, annotation),
                    Err(e) => {
                        tracing::warn!("Error annotating {}: {e}", image.file_name);
                        ItemResult::error(image.clone(), e.to_string())
                    }
                }
            }
        };

        tracing::info!(
            file = %image.file_name,
            status = %result.status(),
            score = ?result.score(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Processed image {position}/{total}"
        );
        result
    }

    fn set_progress(&self, progress: String) {
        self.snapshots.send_modify(|s| s.progress = progress);
    }
}
