// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, timer dispatch, shutdown.

use std::fs::File;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use fs2::FileExt;
use gk_core::{GarageAdapters, GarageMode, ScheduledKind, Scheduler, SystemClock};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::backend::{BackendClient, SignalBroadcaster, TracingTelemetry};
use crate::config::Config;
use crate::controller::{Controller, PolicyError, WakeupPlanner, WakeupPolicy};

/// Controller with concrete adapter types
pub type DaemonController = Controller<DaemonAdapters, SystemClock>;

/// Production adapter bundle wired to the backend sockets
#[derive(Clone)]
pub struct DaemonAdapters {
    backend: BackendClient,
    signals: SignalBroadcaster,
    planner: WakeupPlanner<SystemClock>,
}

impl DaemonAdapters {
    pub fn new(
        backend: BackendClient,
        signals: SignalBroadcaster,
        planner: WakeupPlanner<SystemClock>,
    ) -> Self {
        Self {
            backend,
            signals,
            planner,
        }
    }
}

impl GarageAdapters for DaemonAdapters {
    type Jobs = BackendClient;
    type Users = BackendClient;
    type Signals = SignalBroadcaster;
    type Telemetry = TracingTelemetry;
    type Wakeup = WakeupPlanner<SystemClock>;

    fn jobs(&self) -> BackendClient {
        self.backend.clone()
    }

    fn users(&self) -> BackendClient {
        self.backend.clone()
    }

    fn signals(&self) -> SignalBroadcaster {
        self.signals.clone()
    }

    fn telemetry(&self) -> TracingTelemetry {
        TracingTelemetry
    }

    fn wakeup(&self) -> WakeupPlanner<SystemClock> {
        self.planner.clone()
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Control socket listener
    pub listener: UnixListener,
    /// Idle-window controller (shared with spawned completion tasks)
    pub controller: Arc<DaemonController>,
    /// Scheduler for timers (shared with the coordinator)
    pub scheduler: Arc<Mutex<Scheduler>>,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// How long the dispatch loop may sleep before a timer wants to fire
    ///
    /// Falls back to a 1s heartbeat when nothing is armed, so newly armed
    /// timers are picked up promptly.
    pub fn until_next_timer(&self) -> std::time::Duration {
        let heartbeat = std::time::Duration::from_secs(1);
        let scheduler = self.scheduler.lock().unwrap_or_else(|e| e.into_inner());
        match scheduler.next_fire_time() {
            Some(at) => at
                .saturating_duration_since(std::time::Instant::now())
                .min(heartbeat),
            None => heartbeat,
        }
    }

    /// Fire every due timer and dispatch it to its owner
    pub async fn dispatch_due_timers(&self) {
        let due = {
            let mut scheduler = self.scheduler.lock().unwrap_or_else(|e| e.into_inner());
            scheduler.poll(std::time::Instant::now())
        };
        for item in due {
            match item.kind {
                ScheduledKind::JobPoll => self.controller.garage().on_job_poll().await,
                ScheduledKind::UserStopCheck => {
                    self.controller.garage().on_user_stop_check().await
                }
                ScheduledKind::Wakeup => self.controller.on_wakeup().await,
            }
        }
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        // An open window must not leave the mode signal stuck on
        if self.controller.garage().is_active() {
            self.controller.cancel_garage_mode().await;
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("Invalid wakeup policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Acquire lock file FIRST - prevents races
    let lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Reborrow as immutable

    // 2. Parse the wakeup policy BEFORE binding the socket (fail fast)
    let policy = WakeupPolicy::parse(&config.settings.wakeup_policy)?;

    // 3. Remove stale socket and bind (only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 4. Wire up the coordinator
    let scheduler = Arc::new(Mutex::new(Scheduler::new()));
    let planner = WakeupPlanner::new(Arc::clone(&scheduler), policy, SystemClock);
    let adapters = DaemonAdapters::new(
        BackendClient::new(&config.settings.backend_socket),
        SignalBroadcaster::new(&config.settings.signal_socket),
        planner.clone(),
    );
    let garage = Arc::new(GarageMode::new(
        adapters,
        Arc::clone(&scheduler),
        SystemClock,
    ));
    let controller = Arc::new(Controller::new(garage, planner));

    info!("Daemon started in {}", config.root.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        controller,
        scheduler,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
