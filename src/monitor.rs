//! Polling runtime: drives the pipeline from two independent timers.
//!
//! The fast cycle refetches telemetry (default every second), the slow cycle
//! refetches grid context (default every 15 minutes). Both fire once
//! immediately on start. Each fetch runs in its own task so that a slow
//! backend never delays the next tick; completions are tagged with a per-cycle
//! sequence number and the pipeline drops any that arrive after a newer one.
//!
//! All pipeline state is owned by a single loop task. Readers observe it
//! through a `watch` channel carrying an immutable [`DashboardView`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::error::FetchError;
use crate::pipeline::types::{ControlAck, ControlAction, GridContext, TelemetryBatch};
use crate::pipeline::{DashboardView, Pipeline};
use crate::source::TelemetrySource;

/// Result of one spawned fetch.
enum Completion {
    Telemetry {
        seq: u64,
        result: Result<TelemetryBatch, FetchError>,
    },
    Grid {
        seq: u64,
        result: Result<GridContext, FetchError>,
    },
}

/// Out-of-cycle requests sent to the loop.
#[derive(Debug, Clone, Copy)]
enum Command {
    RefreshTelemetry,
    RefreshGrid,
}

/// Entry point for starting the polling runtime.
pub struct Monitor;

impl Monitor {
    /// Spawns the polling loop on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `source` - Backend the loop fetches from
    /// * `pipeline` - Pipeline that absorbs completed fetches
    /// * `polling` - Fast and slow cycle intervals
    pub fn spawn(
        source: Arc<dyn TelemetrySource>,
        pipeline: Pipeline,
        polling: &PollingConfig,
    ) -> MonitorHandle {
        let (view_tx, view_rx) = watch::channel(pipeline.view());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::channel(16);

        let state = LoopState {
            source: Arc::clone(&source),
            pipeline,
            view_tx,
            telemetry_issued: 0,
            grid_issued: 0,
            in_flight: JoinSet::new(),
        };
        info!(
            source = source.description(),
            telemetry_interval_ms = polling.telemetry_interval_ms,
            grid_interval_secs = polling.grid_interval_secs,
            "monitor starting"
        );
        let task = tokio::spawn(state.run(
            polling.telemetry_interval(),
            polling.grid_interval(),
            shutdown_rx,
            command_rx,
        ));

        MonitorHandle {
            client: MonitorClient {
                source,
                views: view_rx,
                commands: command_tx,
            },
            shutdown: shutdown_tx,
            task,
        }
    }
}

struct LoopState {
    source: Arc<dyn TelemetrySource>,
    pipeline: Pipeline,
    view_tx: watch::Sender<DashboardView>,
    telemetry_issued: u64,
    grid_issued: u64,
    in_flight: JoinSet<Completion>,
}

impl LoopState {
    async fn run(
        mut self,
        telemetry_every: Duration,
        grid_every: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut commands: mpsc::Receiver<Command>,
    ) {
        let mut fast = interval(telemetry_every);
        fast.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut slow = interval(grid_every);
        slow.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    // A dropped handle stops the loop as well.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(joined) = self.in_flight.join_next() => match joined {
                    Ok(completion) => self.absorb(completion),
                    Err(e) => warn!(error = %e, "fetch task failed"),
                },
                Some(command) = commands.recv() => match command {
                    Command::RefreshTelemetry => self.issue_telemetry(),
                    Command::RefreshGrid => self.issue_grid(),
                },
                _ = fast.tick() => self.issue_telemetry(),
                _ = slow.tick() => self.issue_grid(),
            }
        }

        // Outstanding fetches are cancelled; their results would be stale.
        self.in_flight.abort_all();
        info!(
            telemetry_seq = self.telemetry_issued,
            grid_seq = self.grid_issued,
            "monitor stopped"
        );
    }

    fn issue_telemetry(&mut self) {
        self.telemetry_issued += 1;
        let seq = self.telemetry_issued;
        let source = Arc::clone(&self.source);
        debug!(seq, "telemetry fetch issued");
        self.in_flight.spawn(async move {
            let result = source.fetch_live_telemetry().await;
            Completion::Telemetry { seq, result }
        });
    }

    fn issue_grid(&mut self) {
        self.grid_issued += 1;
        let seq = self.grid_issued;
        let source = Arc::clone(&self.source);
        debug!(seq, "grid context fetch issued");
        self.in_flight.spawn(async move {
            let result = source.fetch_grid_context().await;
            Completion::Grid { seq, result }
        });
    }

    fn absorb(&mut self, completion: Completion) {
        let applied = match completion {
            Completion::Telemetry { seq, result: Ok(batch) } => {
                self.pipeline.apply_telemetry(seq, batch.values(), Utc::now())
            }
            Completion::Telemetry { seq, result: Err(e) } => {
                warn!(seq, error = %e, "telemetry fetch failed, keeping previous values");
                false
            }
            Completion::Grid { seq, result: Ok(context) } => {
                self.pipeline.apply_grid_context(seq, context)
            }
            Completion::Grid { seq, result: Err(e) } => {
                warn!(seq, error = %e, "grid context fetch failed, keeping previous values");
                false
            }
        };
        if applied {
            self.view_tx.send_replace(self.pipeline.view());
        }
    }
}

/// Cloneable read/command access to a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    source: Arc<dyn TelemetrySource>,
    views: watch::Receiver<DashboardView>,
    commands: mpsc::Sender<Command>,
}

impl MonitorClient {
    /// Latest published view.
    pub fn view(&self) -> DashboardView {
        self.views.borrow().clone()
    }

    /// Receiver notified whenever a new view is published.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.views.clone()
    }

    /// Requests an immediate out-of-cycle telemetry fetch.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Closed` if the monitor has stopped.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.send(Command::RefreshTelemetry).await
    }

    /// Requests an immediate out-of-cycle grid-context fetch.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Closed` if the monitor has stopped.
    pub async fn refresh_grid(&self) -> Result<(), FetchError> {
        self.send(Command::RefreshGrid).await
    }

    /// Sends a control command and, on success, triggers a telemetry refetch.
    ///
    /// A stopped monitor refuses the command without contacting the backend.
    /// Once the backend has acknowledged, the ack is returned even if the
    /// monitor stops before the refetch can be queued.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Closed` if the monitor has stopped, or the
    /// backend's `FetchError` if the command fails; no refetch is requested
    /// in either case.
    pub async fn control(
        &self,
        device_id: &str,
        action: ControlAction,
    ) -> Result<ControlAck, FetchError> {
        if self.commands.is_closed() {
            warn!(device_id, %action, "device control refused, monitor is not running");
            return Err(FetchError::Closed);
        }
        let ack = match self.source.send_device_control(device_id, action).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!(device_id, %action, error = %e, "device control failed");
                return Err(e);
            }
        };
        info!(
            device_id,
            %action,
            status = %ack.status,
            message = %ack.message,
            "device control acknowledged"
        );
        if ack.is_success() {
            if let Err(e) = self.refresh().await {
                warn!(device_id, error = %e, "refetch after device control not queued");
            }
        }
        Ok(ack)
    }

    async fn send(&self, command: Command) -> Result<(), FetchError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FetchError::Closed)
    }
}

/// Owning handle to a running monitor.
///
/// Dropping the handle also stops the loop, but only [`MonitorHandle::stop`]
/// waits for it to finish.
#[derive(Debug)]
pub struct MonitorHandle {
    client: MonitorClient,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn client(&self) -> MonitorClient {
        self.client.clone()
    }

    /// Latest published view.
    pub fn view(&self) -> DashboardView {
        self.client.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.client.subscribe()
    }

    /// See [`MonitorClient::control`].
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Closed` after a stop, or the backend's
    /// `FetchError` if the command fails.
    pub async fn control(
        &self,
        device_id: &str,
        action: ControlAction,
    ) -> Result<ControlAck, FetchError> {
        self.client.control(device_id, action).await
    }

    /// See [`MonitorClient::refresh`].
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Closed` if the monitor has stopped.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.client.refresh().await
    }

    /// Stops both timers and waits for the loop to exit.
    ///
    /// Returns the last published view.
    pub async fn stop(self) -> DashboardView {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "monitor loop ended abnormally");
        }
        self.client.view()
    }
}
