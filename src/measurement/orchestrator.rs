//! Single-flight measurement orchestration.
//!
//! [`MeasurementOrchestrator`] runs at most one measurement at a time on a
//! background task, publishes a [`ProgressState`] for every phase, keeps a
//! bounded history of completed results and turns every provider failure
//! into a sticky error state.
//!
//! Publication order on success is: history and latest result, then the
//! `Completed` progress state, then the in-flight flag is cleared. A reader
//! that sees `Completed` therefore always finds the matching result.

use super::history::{ResultHistory, HISTORY_CAPACITY};
use super::progress::{ProgressState, TestPhase};
use super::provider::MeasurementProvider;
use super::results::{MeasurementResult, RawMeasurement};
use crate::errors::MeasurementError;
use futures_util::FutureExt;
use log::{debug, error, info, warn};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

/// Wall-clock budget for a whole run.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget shared by all phases of one run.
    pub budget: Duration,
    /// Bound each provider call by the remaining budget.
    ///
    /// When false only the checkpoints before and after each call are
    /// enforced, so a single slow call can overrun the budget before the
    /// run is failed.
    pub cancel_in_flight: bool,
    pub history_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            cancel_in_flight: true,
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

/// Answer to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub started: bool,
    pub message: String,
}

impl StartOutcome {
    fn started() -> Self {
        Self {
            started: true,
            message: "Speed test started successfully. Please wait while we measure your connection speed.".to_string(),
        }
    }

    fn rejected(error: MeasurementError) -> Self {
        Self { started: false, message: error.message }
    }
}

/// Points at which the budget is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checkpoint {
    Initializing,
    FindingServer,
    Download,
    Upload,
}

impl Checkpoint {
    fn timeout_error(self) -> MeasurementError {
        let message = match self {
            Checkpoint::Initializing => "Test timeout while initializing",
            Checkpoint::FindingServer => "Test timeout while finding server",
            Checkpoint::Download => "Test timeout during download",
            Checkpoint::Upload => "Test timeout during upload",
        };
        MeasurementError::timeout(message)
    }
}

#[derive(Debug, Default)]
struct Records {
    current: Option<MeasurementResult>,
    history: ResultHistory,
}

pub struct MeasurementOrchestrator {
    provider: Arc<dyn MeasurementProvider>,
    config: OrchestratorConfig,
    is_testing: AtomicBool,
    progress: watch::Sender<ProgressState>,
    records: RwLock<Records>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MeasurementOrchestrator {
    pub fn new(
        provider: Arc<dyn MeasurementProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let (progress, _) = watch::channel(ProgressState::ready());
        let records = Records {
            current: None,
            history: ResultHistory::with_capacity(config.history_capacity),
        };

        Self {
            provider,
            config,
            is_testing: AtomicBool::new(false),
            progress,
            records: RwLock::new(records),
            task: Mutex::new(None),
        }
    }

    /// Start a measurement in the background unless one is running.
    ///
    /// The in-flight flag is claimed with a single compare-and-swap, so of
    /// any number of racing callers exactly one starts a run. Must be
    /// called from within a tokio runtime.
    pub fn start_measurement(self: &Arc<Self>) -> StartOutcome {
        if self
            .is_testing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Start rejected, a test is already running");
            return StartOutcome::rejected(
                MeasurementError::already_in_progress(),
            );
        }

        self.publish(ProgressState::testing(
            TestPhase::Initializing,
            "Initializing speed test...",
        ));

        let mut slot = lock(&self.task);
        let this = Arc::clone(self);
        *slot = Some(tokio::spawn(async move { this.run_measurement().await }));

        StartOutcome::started()
    }

    /// Current progress. Never waits on a running measurement.
    pub fn snapshot(&self) -> ProgressState {
        self.progress.borrow().clone()
    }

    /// Receiver notified on every published progress state.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    pub fn latest_result(&self) -> Option<MeasurementResult> {
        read(&self.records).current.clone()
    }

    /// Copy of the history; later runs do not change it.
    pub fn history(&self) -> ResultHistory {
        read(&self.records).history.clone()
    }

    pub fn is_testing(&self) -> bool {
        self.is_testing.load(Ordering::Acquire)
    }

    /// Wait for the background run started last, if any, to finish.
    pub async fn wait_until_idle(&self) {
        let handle = lock(&self.task).take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Background test task failed to join: {}", e);
            }
        }
    }

    async fn run_measurement(&self) {
        let started = Instant::now();
        info!("Starting speed test");

        let outcome = AssertUnwindSafe(self.execute(started))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(MeasurementError::probe_failure(
                    "Measurement provider panicked",
                ))
            });

        match outcome {
            Ok(result) => self.complete(result),
            Err(error) => self.fail(error),
        }

        self.is_testing.store(false, Ordering::Release);
        debug!("Test finished after {:?}", started.elapsed());
    }

    async fn execute(
        &self,
        started: Instant,
    ) -> Result<MeasurementResult, MeasurementError> {
        info!("Initializing Speedtest...");
        let mut session = self
            .checkpointed(
                started,
                Checkpoint::Initializing,
                self.provider.open_session(),
            )
            .await?;

        self.publish(ProgressState::testing(
            TestPhase::FindingServer,
            "Finding optimal server...",
        ));
        info!("Finding best server...");
        let server = self
            .checkpointed(
                started,
                Checkpoint::FindingServer,
                session.discover_best_server(),
            )
            .await?;

        let connected = format!("Connected to {} ({})", server.sponsor, server.name);
        info!("{}", connected);
        self.publish(ProgressState::testing(TestPhase::ServerFound, connected));

        self.publish(ProgressState::testing(
            TestPhase::TestingDownload,
            "Testing download speed...",
        ));
        info!("Testing download speed...");
        let download_mbps = self
            .checkpointed(started, Checkpoint::Download, session.measure_download())
            .await?;

        self.publish(ProgressState::testing(
            TestPhase::TestingUpload,
            "Testing upload speed...",
        ));
        info!("Testing upload speed...");
        let upload_mbps = self
            .checkpointed(started, Checkpoint::Upload, session.measure_upload())
            .await?;

        Ok(MeasurementResult::from_raw(RawMeasurement {
            server,
            download_mbps,
            upload_mbps,
            ping_ms: session.last_ping_ms(),
            jitter_ms: session.jitter_ms(),
            packet_loss_pct: None,
            totals: session.totals(),
            share_url: session.share_url(),
        }))
    }

    /// Run one provider call between two budget checks.
    ///
    /// The check after the call applies even when the call succeeded.
    async fn checkpointed<T, F>(
        &self,
        started: Instant,
        checkpoint: Checkpoint,
        call: F,
    ) -> Result<T, MeasurementError>
    where
        F: Future<Output = Result<T, MeasurementError>>,
    {
        self.check_budget(started, checkpoint)?;

        let value = if self.config.cancel_in_flight {
            let remaining = self.config.budget.saturating_sub(started.elapsed());
            match timeout(remaining, call).await {
                Ok(outcome) => outcome?,
                Err(_) => {
                    warn!("{:?} cancelled after exhausting the budget", checkpoint);
                    return Err(checkpoint.timeout_error());
                }
            }
        } else {
            call.await?
        };

        self.check_budget(started, checkpoint)?;

        Ok(value)
    }

    fn check_budget(
        &self,
        started: Instant,
        checkpoint: Checkpoint,
    ) -> Result<(), MeasurementError> {
        let elapsed = started.elapsed();
        debug!("{:?} checkpoint at {:?}", checkpoint, elapsed);

        if elapsed > self.config.budget {
            return Err(checkpoint.timeout_error());
        }

        Ok(())
    }

    fn complete(&self, result: MeasurementResult) {
        info!(
            "Test completed: Download: {:.2} Mbps, Upload: {:.2} Mbps, Ping: {:.2} ms",
            result.download_mbps, result.upload_mbps, result.ping_ms
        );

        {
            let mut records = write(&self.records);
            records.history.append(result.clone());
            records.current = Some(result);
        }

        self.publish(ProgressState::completed());
    }

    fn fail(&self, error: MeasurementError) {
        error!("Speed test failed: {}", error);
        if let Some(source) = std::error::Error::source(&error) {
            debug!("Caused by: {}", source);
        }

        self.publish(ProgressState::failed(&error));
    }

    fn publish(&self, state: ProgressState) {
        self.progress.send_replace(state);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
