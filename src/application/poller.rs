//! Quote Poller
//!
//! Drives the fetch → extract → accept cycle on two timers:
//! - Steady: every 5 minutes while the source is healthy
//! - FastRetry: every 10 seconds after a failed cycle, until one succeeds
//!
//! Both timers are multiplexed on a single task, so at most one cycle is in
//! flight and store acceptance is serialized. Steady ticks that land while
//! FastRetry is active are skipped. A failed cycle is logged and never ends
//! the loop.

use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Notify, RwLock};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::domain::extractor::{ExtractionError, QuoteExtractor};
use crate::domain::quote::QuoteSnapshot;
use crate::domain::snapshot_store::{RejectedSnapshot, SnapshotStore};
use crate::ports::source::{FetchError, SourcePort};

/// Default steady polling interval
pub const DEFAULT_STEADY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default fast-retry interval
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Store rejected quote: {0}")]
    Rejected(#[from] RejectedSnapshot),
    #[error("Store task failed: {0}")]
    StoreTask(String),
}

/// Scheduler mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingMode {
    Steady,
    FastRetry,
}

/// Mode change caused by a cycle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnterFastRetry,
    ResumeSteady,
}

/// Steady/FastRetry state machine
#[derive(Debug, Clone)]
pub struct PollingState {
    mode: PollingMode,
    consecutive_failures: u32,
}

impl Default for PollingState {
    fn default() -> Self {
        Self {
            mode: PollingMode::Steady,
            consecutive_failures: 0,
        }
    }
}

impl PollingState {
    pub fn mode(&self) -> PollingMode {
        self.mode
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Apply a cycle outcome; outcomes matching the current mode are no-ops
    pub fn record(&mut self, success: bool) -> Option<Transition> {
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        match (self.mode, success) {
            (PollingMode::Steady, false) => {
                self.mode = PollingMode::FastRetry;
                Some(Transition::EnterFastRetry)
            }
            (PollingMode::FastRetry, true) => {
                self.mode = PollingMode::Steady;
                Some(Transition::ResumeSteady)
            }
            _ => None,
        }
    }
}

/// Poller timing
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub steady_interval: Duration,
    pub retry_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            steady_interval: DEFAULT_STEADY_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Status snapshot of the poller
#[derive(Debug, Clone)]
pub struct PollerStatus {
    pub is_running: bool,
    pub mode: PollingMode,
    pub consecutive_failures: u32,
    pub current: QuoteSnapshot,
}

enum PollEvent {
    Shutdown,
    SteadyTick,
    RetryTick,
}

/// Polling controller
#[derive(Clone)]
pub struct QuotePoller {
    source: Arc<dyn SourcePort>,
    extractor: Arc<QuoteExtractor>,
    store: Arc<SnapshotStore>,
    state: Arc<RwLock<PollingState>>,
    is_running: Arc<RwLock<bool>>,
    shutdown: Arc<Notify>,
    config: PollerConfig,
}

impl QuotePoller {
    pub fn new(
        source: Arc<dyn SourcePort>,
        extractor: Arc<QuoteExtractor>,
        store: Arc<SnapshotStore>,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
            state: Arc::new(RwLock::new(PollingState::default())),
            is_running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(Notify::new()),
            config,
        }
    }

    /// Run until `stop` is called
    pub async fn run(&self) {
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting quote poller - steady every {:?}, retry every {:?}",
            self.config.steady_interval,
            self.config.retry_interval
        );

        // First cycle runs before any timer is armed
        let mut retry = match self.cycle().await {
            Some(Transition::EnterFastRetry) => Some(self.retry_timer()),
            _ => None,
        };

        let mut steady = interval_at(
            Instant::now() + self.config.steady_interval,
            self.config.steady_interval,
        );
        steady.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while *self.is_running.read().await {
            let event = tokio::select! {
                _ = self.shutdown.notified() => PollEvent::Shutdown,
                _ = steady.tick() => PollEvent::SteadyTick,
                _ = next_retry(&mut retry) => PollEvent::RetryTick,
            };

            match event {
                PollEvent::Shutdown => break,
                PollEvent::SteadyTick => {
                    if self.mode().await == PollingMode::FastRetry {
                        tracing::debug!("Steady tick skipped, fast retry active");
                        continue;
                    }
                    if let Some(Transition::EnterFastRetry) = self.cycle().await {
                        retry = Some(self.retry_timer());
                    }
                }
                PollEvent::RetryTick => {
                    let failures = self.state.read().await.consecutive_failures();
                    tracing::info!("Retrying fetch (after {} consecutive failures)", failures);
                    if let Some(Transition::ResumeSteady) = self.cycle().await {
                        retry = None;
                    }
                }
            }
        }

        *self.is_running.write().await = false;
        tracing::info!("Quote poller stopped");
    }

    /// One fetch → extract → accept pass, without touching the mode
    pub async fn run_cycle(&self) -> Result<QuoteSnapshot, CycleError> {
        let markup = self.source.fetch().await?;
        let candidate = self.extractor.extract(&markup)?;

        // accept() writes the snapshot file synchronously
        let store = Arc::clone(&self.store);
        let accepted = tokio::task::spawn_blocking(move || store.accept(candidate))
            .await
            .map_err(|e| CycleError::StoreTask(format!("Task join error: {}", e)))??;
        Ok(accepted)
    }

    /// Run a cycle and feed its outcome to the state machine
    async fn cycle(&self) -> Option<Transition> {
        let success = match self.run_cycle().await {
            Ok(snapshot) => {
                tracing::debug!(
                    "Cycle ok: tola={:.2} 10g={:.2}",
                    snapshot.per_tola,
                    snapshot.per_ten_gram
                );
                true
            }
            Err(CycleError::Fetch(e)) if !e.is_transient() => {
                tracing::error!("Cycle failed: {}", CycleError::Fetch(e));
                false
            }
            Err(e) => {
                tracing::warn!("Cycle failed: {}", e);
                false
            }
        };

        let transition = self.state.write().await.record(success);
        match transition {
            Some(Transition::EnterFastRetry) => tracing::warn!(
                "Entering fast-retry mode, retrying every {:?}",
                self.config.retry_interval
            ),
            Some(Transition::ResumeSteady) => {
                tracing::info!("Retry successful, resuming steady polling")
            }
            None => {}
        }
        transition
    }

    fn retry_timer(&self) -> Interval {
        let mut timer = interval_at(
            Instant::now() + self.config.retry_interval,
            self.config.retry_interval,
        );
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }

    /// Stop the polling loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.notify_one();
        tracing::info!("Stop signal sent to quote poller");
    }

    pub async fn mode(&self) -> PollingMode {
        self.state.read().await.mode()
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Get current status snapshot
    pub async fn status(&self) -> PollerStatus {
        let state = self.state.read().await.clone();
        PollerStatus {
            is_running: *self.is_running.read().await,
            mode: state.mode(),
            consecutive_failures: state.consecutive_failures(),
            current: self.store.current(),
        }
    }
}

/// Next fast-retry tick, or never while the retry timer is disarmed
async fn next_retry(retry: &mut Option<Interval>) {
    match retry {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
