//! Network and service fault injection
//!
//! Faults are applied to process-wide resources (the database process, the
//! host firewall, the primary interface's queueing discipline). Those are
//! reached through a [`FaultEnvironment`] that every operation borrows, and
//! which records the resulting [`FaultState`].

use std::sync::Arc;
use std::time::Duration;

use domain::{
    DomainError, FaultFlag, FaultKind, FaultState, FaultTarget, FaultWindow, FlapPhase,
    FlapTransition,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::interrupt::{InterruptSignal, sleep_or_interrupt};
use crate::ports::{DatabaseProcessPort, TrafficControlPort};

/// Default port of the database server
pub const DEFAULT_DATABASE_PORT: u16 = 3306;

/// Tunables for service control and fault timing
#[derive(Debug, Clone)]
pub struct NetworkFaultConfig {
    /// Port targeted by firewall faults
    pub port: u16,
    /// Interface for latency; the default-route interface when unset
    pub interface: Option<String>,
    /// Wait after a graceful shutdown before force-killing
    pub stop_grace: Duration,
    /// Health checks after launching the server
    pub start_attempts: u32,
    /// Delay between health checks
    pub poll_interval: Duration,
    /// Latency applied when none is given
    pub default_latency_ms: u32,
    /// Flap toggle interval when none is given
    pub flap_interval: Duration,
    /// Flap cycle length when none is given
    pub flap_duration: Duration,
}

impl Default for NetworkFaultConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DATABASE_PORT,
            interface: None,
            stop_grace: Duration::from_secs(2),
            start_attempts: 30,
            poll_interval: Duration::from_secs(1),
            default_latency_ms: 2000,
            flap_interval: Duration::from_secs(30),
            flap_duration: Duration::from_secs(300),
        }
    }
}

/// Handle to the shared process and network resources
///
/// Holds the fault flags raised and cleared through it. Callers must not run
/// two stateful operations against the same environment concurrently.
pub struct FaultEnvironment {
    process: Arc<dyn DatabaseProcessPort>,
    traffic: Arc<dyn TrafficControlPort>,
    state: Mutex<FaultState>,
}

impl std::fmt::Debug for FaultEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultEnvironment")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl FaultEnvironment {
    /// Create an environment with no faults recorded
    pub fn new(process: Arc<dyn DatabaseProcessPort>, traffic: Arc<dyn TrafficControlPort>) -> Self {
        Self {
            process,
            traffic,
            state: Mutex::new(FaultState::new()),
        }
    }

    /// Snapshot of the recorded faults
    pub fn state(&self) -> FaultState {
        self.state.lock().clone()
    }

    fn activate(&self, window: FaultWindow) {
        if let Some(previous) = self.state.lock().activate(window) {
            debug!(flag = %previous.flag, "Replaced active fault window");
        }
    }

    fn clear(&self, flags: &[FaultFlag]) -> Vec<FaultWindow> {
        self.state.lock().clear(flags)
    }
}

/// How a stop request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStop {
    /// The server was not running
    AlreadyStopped,
    /// Graceful shutdown completed within the grace period
    Stopped,
    /// The server had to be killed
    ForceStopped,
}

/// How a start request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ServiceStart {
    /// The server was already running
    AlreadyRunning,
    /// The server answered a health check
    Started { attempts: u32 },
    /// The server was launched but never answered
    Unconfirmed { attempts: u32 },
}

/// Result of bringing the database down
#[derive(Debug, Clone, Serialize)]
pub struct DownReport {
    /// Fault applied
    pub kind: FaultKind,
    /// Window opened for it
    pub window: FaultWindow,
    /// Stop result for service faults
    pub service: Option<ServiceStop>,
}

/// Result of a restore
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Flags this restore clears, whether or not they were active
    pub cleared: Vec<FaultFlag>,
    /// Windows that were active and are now closed
    pub closed: Vec<FaultWindow>,
    /// Start result when the restore relaunched the server
    pub service: Option<ServiceStart>,
}

/// Result of a duration-bounded fault
#[derive(Debug, Clone, Serialize)]
pub struct TimedFaultReport {
    /// Window that was held open
    pub window: FaultWindow,
    /// Time from applying the fault to restoring it
    pub elapsed: Duration,
    /// Whether the wait was cut short
    pub interrupted: bool,
    /// The symmetric restore
    pub restore: RestoreReport,
}

/// Result of a flap cycle
#[derive(Debug, Clone, Serialize)]
pub struct FlapReport {
    /// Fault toggled
    pub kind: FaultKind,
    /// Phase changes in order, offset from the start of the cycle
    pub transitions: Vec<FlapTransition>,
    /// Total time spent
    pub elapsed: Duration,
    /// Whether the cycle was cut short
    pub interrupted: bool,
    /// The terminal restore
    pub restore: RestoreReport,
}

/// Recorded faults plus live reachability
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStatus {
    /// Faults applied through this environment
    pub state: FaultState,
    /// Whether the server process exists
    pub service_running: bool,
    /// Whether the server answers a health check
    pub responding: bool,
}

/// Makes the database unreachable or slow and brings it back
#[derive(Debug, Clone, Default)]
pub struct NetworkFaultController {
    config: NetworkFaultConfig,
}

impl NetworkFaultController {
    /// Create a controller
    pub const fn new(config: NetworkFaultConfig) -> Self {
        Self { config }
    }

    /// Controller settings
    pub const fn config(&self) -> &NetworkFaultConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Service availability
    // ------------------------------------------------------------------

    /// Shut the server down, killing it if it outlives the grace period
    #[instrument(skip_all)]
    pub async fn stop_service(&self, env: &FaultEnvironment) -> Result<ServiceStop, ApplicationError> {
        let result = if env.process.is_running().await? {
            if let Err(e) = env.process.shutdown().await {
                warn!(error = %e, "Graceful shutdown failed, falling back to kill");
            }
            tokio::time::sleep(self.config.stop_grace).await;

            if env.process.is_running().await? {
                warn!("Server still running after grace period, killing");
                env.process.kill().await?;
                ServiceStop::ForceStopped
            } else {
                ServiceStop::Stopped
            }
        } else {
            info!("Server is not running");
            ServiceStop::AlreadyStopped
        };

        env.activate(FaultWindow::open(FaultFlag::ServiceDown, FaultTarget::Process));
        info!(result = ?result, "Database service down");
        Ok(result)
    }

    /// Launch the server and wait for it to answer
    ///
    /// A server that never answers is reported, not treated as an error.
    #[instrument(skip_all)]
    pub async fn start_service(
        &self,
        env: &FaultEnvironment,
    ) -> Result<ServiceStart, ApplicationError> {
        if env.process.is_running().await? {
            env.clear(&[FaultFlag::ServiceDown]);
            info!("Server is already running");
            return Ok(ServiceStart::AlreadyRunning);
        }

        env.process.launch().await?;
        env.clear(&[FaultFlag::ServiceDown]);

        for attempt in 1..=self.config.start_attempts {
            if env.process.ping().await {
                info!(attempts = attempt, "Database service up");
                return Ok(ServiceStart::Started { attempts: attempt });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        warn!(
            attempts = self.config.start_attempts,
            "Server launched but did not answer health checks"
        );
        Ok(ServiceStart::Unconfirmed {
            attempts: self.config.start_attempts,
        })
    }

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------

    /// Refuse new connections to `port` with a TCP reset
    #[instrument(skip(self, env))]
    pub async fn block_reject(
        &self,
        env: &FaultEnvironment,
        port: u16,
    ) -> Result<FaultWindow, ApplicationError> {
        env.traffic.set_reject(port).await?;
        let window = FaultWindow::open(FaultFlag::RejectActive, FaultTarget::Port(port));
        env.activate(window.clone());
        info!("Connections to port are rejected");
        Ok(window)
    }

    /// Silently drop packets to `port`
    #[instrument(skip(self, env))]
    pub async fn block_drop(
        &self,
        env: &FaultEnvironment,
        port: u16,
    ) -> Result<FaultWindow, ApplicationError> {
        env.traffic.set_drop(port).await?;
        let window = FaultWindow::open(FaultFlag::DropActive, FaultTarget::Port(port));
        env.activate(window.clone());
        info!("Packets to port are dropped");
        Ok(window)
    }

    /// Remove every firewall rule
    #[instrument(skip_all)]
    pub async fn clear_rules(&self, env: &FaultEnvironment) -> Result<RestoreReport, ApplicationError> {
        env.traffic.clear_firewall().await?;
        let closed = env.clear(&FaultFlag::FIREWALL);
        info!(closed = closed.len(), "Firewall rules cleared");
        Ok(RestoreReport {
            cleared: FaultFlag::FIREWALL.to_vec(),
            closed,
            service: None,
        })
    }

    // ------------------------------------------------------------------
    // Latency
    // ------------------------------------------------------------------

    async fn interface(&self, env: &FaultEnvironment) -> Result<String, ApplicationError> {
        match &self.config.interface {
            Some(name) => Ok(name.clone()),
            None => env.traffic.default_interface().await,
        }
    }

    /// Delay all egress traffic on the primary interface
    ///
    /// Replaces any latency already applied.
    #[instrument(skip(self, env))]
    pub async fn add_latency(
        &self,
        env: &FaultEnvironment,
        latency_ms: u32,
    ) -> Result<FaultWindow, ApplicationError> {
        if latency_ms == 0 {
            return Err(DomainError::invalid("latency must be at least 1 ms").into());
        }

        let name = self.interface(env).await?;
        env.traffic.set_latency(latency_ms, &name).await?;

        let window = FaultWindow::open(
            FaultFlag::LatencyActive,
            FaultTarget::Interface { name, latency_ms },
        );
        env.activate(window.clone());
        info!(target = %window.target, "Latency added");
        Ok(window)
    }

    /// Remove the latency discipline
    #[instrument(skip_all)]
    pub async fn remove_latency(
        &self,
        env: &FaultEnvironment,
    ) -> Result<RestoreReport, ApplicationError> {
        let name = self.interface(env).await?;
        env.traffic.clear_latency(&name).await?;
        let closed = env.clear(&[FaultFlag::LatencyActive]);
        info!(interface = %name, "Latency removed");
        Ok(RestoreReport {
            cleared: vec![FaultFlag::LatencyActive],
            closed,
            service: None,
        })
    }

    // ------------------------------------------------------------------
    // Composites
    // ------------------------------------------------------------------

    /// Make the database unavailable in the way `kind` selects
    #[instrument(skip(self, env))]
    pub async fn bring_down(
        &self,
        env: &FaultEnvironment,
        kind: FaultKind,
    ) -> Result<DownReport, ApplicationError> {
        let (window, service) = match kind {
            FaultKind::Service => {
                let stop = self.stop_service(env).await?;
                let window = env
                    .state()
                    .window(FaultFlag::ServiceDown)
                    .cloned()
                    .unwrap_or_else(|| {
                        FaultWindow::open(FaultFlag::ServiceDown, FaultTarget::Process)
                    });
                (window, Some(stop))
            },
            FaultKind::Reject => (self.block_reject(env, self.config.port).await?, None),
            FaultKind::Timeout => (self.block_drop(env, self.config.port).await?, None),
        };

        Ok(DownReport {
            kind,
            window,
            service,
        })
    }

    /// Undo only what `kind` breaks
    ///
    /// Service faults relaunch the server; reachability faults flush the
    /// firewall.
    #[instrument(skip(self, env))]
    pub async fn restore(
        &self,
        env: &FaultEnvironment,
        kind: FaultKind,
    ) -> Result<RestoreReport, ApplicationError> {
        match kind {
            FaultKind::Service => {
                let closed_before = env.state().window(FaultFlag::ServiceDown).cloned();
                let start = self.start_service(env).await?;
                Ok(RestoreReport {
                    cleared: FaultFlag::restored_by(kind).to_vec(),
                    closed: closed_before.into_iter().collect(),
                    service: Some(start),
                })
            },
            FaultKind::Reject | FaultKind::Timeout => self.clear_rules(env).await,
        }
    }

    /// Full reset: start the server, clear the firewall and remove latency
    ///
    /// All three steps run even if one fails; the first failure is returned.
    #[instrument(skip_all)]
    pub async fn bring_up(&self, env: &FaultEnvironment) -> Result<RestoreReport, ApplicationError> {
        let closed_before: Vec<FaultWindow> = {
            let state = env.state();
            FaultFlag::ALL
                .iter()
                .filter_map(|flag| state.window(*flag).cloned())
                .collect()
        };

        let start = self.start_service(env).await;
        let rules = self.clear_rules(env).await;
        let latency = self.remove_latency(env).await;

        let service = start?;
        rules?;
        latency?;

        info!("Database fully up");
        Ok(RestoreReport {
            cleared: FaultFlag::ALL.to_vec(),
            closed: closed_before,
            service: Some(service),
        })
    }

    // ------------------------------------------------------------------
    // Timed operations
    // ------------------------------------------------------------------

    /// Hold a fault for `duration`, then apply its symmetric restore
    ///
    /// An interrupt ends the wait early; the restore still runs.
    #[instrument(skip(self, env, signal))]
    pub async fn run_timed_fault(
        &self,
        env: &FaultEnvironment,
        kind: FaultKind,
        duration: Duration,
        signal: &InterruptSignal,
    ) -> Result<TimedFaultReport, ApplicationError> {
        let started = Instant::now();
        let down = match self.bring_down(env, kind).await {
            Ok(down) => down,
            Err(e) => {
                if let Err(restore_err) = self.restore(env, kind).await {
                    warn!(error = %restore_err, "Restore after failed fault also failed");
                }
                return Err(e);
            },
        };

        let window = down.window.with_duration(duration);
        env.activate(window.clone());
        info!(?duration, "Fault active");

        let interrupted = sleep_or_interrupt(duration, signal).await;
        if interrupted {
            warn!("Interrupted, restoring early");
        }

        let restore = self.restore(env, kind).await?;
        let elapsed = started.elapsed();
        info!(?elapsed, "Timed fault restored");

        Ok(TimedFaultReport {
            window,
            elapsed,
            interrupted,
            restore,
        })
    }

    /// Toggle between down and up every `interval` until `total` elapses
    ///
    /// The last phase may be cut short. The terminal restore runs on every
    /// exit path; an error from the cycle itself takes precedence over one
    /// from the restore.
    #[instrument(skip(self, env, signal))]
    pub async fn run_flap_cycle(
        &self,
        env: &FaultEnvironment,
        kind: FaultKind,
        interval: Duration,
        total: Duration,
        signal: &InterruptSignal,
    ) -> Result<FlapReport, ApplicationError> {
        if interval.is_zero() {
            return Err(DomainError::invalid("flap interval must be positive").into());
        }

        let started = Instant::now();
        let mut transitions = Vec::new();
        let cycle = self
            .flap(env, kind, interval, total, signal, started, &mut transitions)
            .await;

        let restore = self.restore(env, kind).await;
        let interrupted = match cycle {
            Ok(interrupted) => interrupted,
            Err(e) => {
                if let Err(restore_err) = restore {
                    warn!(error = %restore_err, "Terminal restore failed after cycle error");
                }
                return Err(e);
            },
        };
        let restore = restore?;

        let elapsed = started.elapsed();
        info!(
            transitions = transitions.len(),
            ?elapsed,
            interrupted,
            "Flap cycle complete"
        );
        Ok(FlapReport {
            kind,
            transitions,
            elapsed,
            interrupted,
            restore,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn flap(
        &self,
        env: &FaultEnvironment,
        kind: FaultKind,
        interval: Duration,
        total: Duration,
        signal: &InterruptSignal,
        started: Instant,
        transitions: &mut Vec<FlapTransition>,
    ) -> Result<bool, ApplicationError> {
        let mut phase = FlapPhase::Up;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= total {
                return Ok(false);
            }
            if signal.is_interrupted() {
                return Ok(true);
            }

            phase = phase.toggled();
            match phase {
                FlapPhase::Down => {
                    self.bring_down(env, kind).await?;
                },
                FlapPhase::Up => {
                    self.restore(env, kind).await?;
                },
            }
            info!(%phase, at = ?elapsed, "Flap transition");
            transitions.push(FlapTransition { phase, at: elapsed });

            let remaining = total.saturating_sub(started.elapsed());
            if sleep_or_interrupt(interval.min(remaining), signal).await {
                return Ok(true);
            }
        }
    }

    /// Recorded faults plus live process and health state
    pub async fn status(&self, env: &FaultEnvironment) -> Result<NetworkStatus, ApplicationError> {
        Ok(NetworkStatus {
            state: env.state(),
            service_running: env.process.is_running().await?,
            responding: env.process.ping().await,
        })
    }
}
