use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::task::RecurringTask;
use crate::gateway::{BackendGateway, GatewayError};
use crate::sink::SinkHandle;

/// Lower bound on the wait between iterations, to bound request rate against
/// the backend regardless of configuration.
pub const MIN_WAIT_SECS: u64 = 5;

/// Where the refresh loop currently is.
///
/// `Stopped` is the only phase from which `start` spawns a new loop;
/// cancellation intent is re-observed at every phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Stopped,
    Iterating,
    Waiting,
}

struct LoopState {
    phase: Mutex<LoopPhase>,
    interval_secs: AtomicU64,
}

impl LoopState {
    fn set_phase(&self, phase: LoopPhase) {
        *self.phase.lock().expect("loop phase lock poisoned") = phase;
    }

    fn phase(&self) -> LoopPhase {
        *self.phase.lock().expect("loop phase lock poisoned")
    }
}

fn effective_wait_secs(configured: u64) -> u64 {
    configured.max(MIN_WAIT_SECS)
}

/// Controller for the recurring refresh loop.
///
/// At most one loop is active per controller instance; duplicate `start`
/// calls are no-ops. `stop` is cooperative: the in-flight gateway call is
/// never aborted, the loop just exits at its next checkpoint. A failing
/// iteration sets an error status and the loop continues; only an explicit
/// `stop` ends the subscription.
pub struct RefreshController {
    gateway: Arc<dyn BackendGateway>,
    sink: SinkHandle,
    task: Arc<dyn RecurringTask>,
    state: Arc<LoopState>,
    cancel: Mutex<Option<CancellationToken>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshController {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        sink: SinkHandle,
        task: Arc<dyn RecurringTask>,
    ) -> Self {
        Self {
            gateway,
            sink,
            task,
            state: Arc::new(LoopState {
                phase: Mutex::new(LoopPhase::Stopped),
                interval_secs: AtomicU64::new(MIN_WAIT_SECS),
            }),
            cancel: Mutex::new(None),
            join: Mutex::new(None),
        }
    }

    /// Start the loop with the given interval. No-op if a loop is already
    /// active. Returns without blocking; the loop runs as a spawned task.
    pub fn start(&self, interval_secs: u64) {
        {
            let mut phase = self.state.phase.lock().expect("loop phase lock poisoned");
            if *phase != LoopPhase::Stopped {
                info!("Refresh loop start requested while already running");
                self.sink.set_status("Refresh loop already running");
                return;
            }
            // Claim the loop before spawning so a concurrent start observes it.
            *phase = LoopPhase::Iterating;
        }

        self.state
            .interval_secs
            .store(interval_secs, Ordering::Relaxed);

        let token = CancellationToken::new();
        *self.cancel.lock().expect("cancel token lock poisoned") = Some(token.clone());

        info!(
            "Starting {} loop with interval {}s (effective wait {}s)",
            self.task.name(),
            interval_secs,
            effective_wait_secs(interval_secs)
        );
        self.sink.set_status("Started");

        let gateway = Arc::clone(&self.gateway);
        let sink = self.sink.clone();
        let task = Arc::clone(&self.task);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            run_loop(gateway, sink, task, state, token).await;
        });
        *self.join.lock().expect("join handle lock poisoned") = Some(handle);
    }

    /// Record stop intent. The loop observes it at its next checkpoint;
    /// an iteration already past the checkpoint completes its render once.
    pub fn stop(&self) {
        let token = self.cancel.lock().expect("cancel token lock poisoned").take();
        match token {
            Some(token) => {
                info!("Stopping {} loop", self.task.name());
                token.cancel();
            }
            None => debug!("Stop requested but no loop is active"),
        }
    }

    /// Adjust the interval for subsequent waits. Observed at the next wait;
    /// a sleep already in progress is not shortened.
    pub fn set_interval(&self, interval_secs: u64) {
        self.state
            .interval_secs
            .store(interval_secs, Ordering::Relaxed);
        debug!("Refresh interval set to {}s", interval_secs);
    }

    pub fn is_running(&self) -> bool {
        self.state.phase() != LoopPhase::Stopped
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    /// Wait for a previously started loop to exit.
    pub async fn wait_until_stopped(&self) {
        let handle = self.join.lock().expect("join handle lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Single non-repeating invocation of the one-shot computation,
    /// orthogonal to the loop. Sink updates are serialized with the loop's
    /// through the shared handle.
    pub async fn run_once(&self) {
        info!("Running one-shot computation");
        self.sink.clear();
        self.sink.set_status("Running...");

        match self.gateway.run_computation().await {
            Ok(report) => {
                let pretty = serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|_| report.to_string());
                self.sink.set_status(&format!("Done\n{}", pretty));
            }
            Err(e) => {
                warn!("One-shot computation failed: {}", e);
                self.sink.set_status(&format!("Error: {}", e));
            }
        }
    }
}

async fn run_loop(
    gateway: Arc<dyn BackendGateway>,
    sink: SinkHandle,
    task: Arc<dyn RecurringTask>,
    state: Arc<LoopState>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        state.set_phase(LoopPhase::Iterating);

        sink.clear();
        sink.set_status("Running...");

        let outcome = task.run(gateway.as_ref()).await;
        // One interval read per iteration: the wait reported in the status
        // is the wait actually taken below.
        let wait = effective_wait_secs(state.interval_secs.load(Ordering::Relaxed));
        match outcome {
            Ok(result) => {
                sink.render(&result);
                sink.set_status(&format!(
                    "Rows: {}, Wait for another {}s",
                    result.row_count(),
                    wait
                ));
            }
            Err(GatewayError::EmptyResult) => {
                sink.render_no_data();
                sink.set_status("No data");
            }
            Err(e) => {
                // Failures end the iteration, never the loop.
                warn!("{} iteration failed: {}", task.name(), e);
                sink.set_status(&format!("Error: {}", e));
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        state.set_phase(LoopPhase::Waiting);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(wait)) => {}
            _ = cancel.cancelled() => break,
        }
    }

    state.set_phase(LoopPhase::Stopped);
    sink.set_status("Stopped");
    info!("{} loop stopped", task.name());
}
