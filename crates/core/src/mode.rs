// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Garage mode: the idle-window coordinator
//!
//! Flips system idleness on, lets the job scheduler run deferred maintenance
//! jobs, polls until no idle-blocking job remains, then reports completion
//! and drains the background users it started. The window has no timeout of
//! its own; a caller needing a hard deadline cancels from outside.
//!
//! All ticks run on the dispatch loop, one at a time. `enter`, `cancel`,
//! `fail`, and the state queries may be called from anywhere; shared state
//! sits behind one mutex that is never held across an await.

use crate::adapters::{
    GarageAdapters, ModeSignal, ModeSignalAdapter, TelemetryAdapter, UserContextAdapter, UserId,
    WakeupScheduler,
};
use crate::clock::Clock;
use crate::drain::BackgroundUserTracker;
use crate::probe::JobSnapshotProbe;
use crate::scheduler::{ScheduledKind, Scheduler};
use crate::signal::{CompletionSignal, Outcome};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Delay before the first job poll after entering the window
pub const JOB_SNAPSHOT_INITIAL_UPDATE: Duration = Duration::from_secs(10);
/// Delay between subsequent job polls
pub const JOB_SNAPSHOT_UPDATE_FREQUENCY: Duration = Duration::from_secs(1);
/// Delay between background-user stop checks
pub const USER_STOP_CHECK_INTERVAL: Duration = Duration::from_secs(10);

const JOB_POLL_TIMER: &str = "garage:job-poll";
const USER_STOP_TIMER: &str = "garage:user-stop";

struct Inner {
    active: bool,
    /// Last non-empty snapshot of idle-blocking running jobs. Deliberately
    /// kept after the count drops to zero ("last known blockers"); cleared
    /// only by a fresh `enter`.
    pending_jobs: Vec<String>,
    users: BackgroundUserTracker,
    completion: Option<CompletionSignal>,
}

/// Idle-window coordinator
pub struct GarageMode<A: GarageAdapters, C: Clock> {
    adapters: A,
    probe: JobSnapshotProbe<A::Jobs>,
    scheduler: Arc<Mutex<Scheduler>>,
    clock: C,
    inner: Mutex<Inner>,
}

impl<A: GarageAdapters, C: Clock> GarageMode<A, C> {
    pub fn new(adapters: A, scheduler: Arc<Mutex<Scheduler>>, clock: C) -> Self {
        let probe = JobSnapshotProbe::new(adapters.jobs());
        Self {
            adapters,
            probe,
            scheduler,
            clock,
            inner: Mutex::new(Inner {
                active: false,
                pending_jobs: Vec::new(),
                users: BackgroundUserTracker::new(),
                completion: None,
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock_inner().active
    }

    /// Snapshot copy of the last known idle-blocking running jobs
    pub fn pending_jobs(&self) -> Vec<String> {
        self.lock_inner().pending_jobs.clone()
    }

    /// Open an idle window
    ///
    /// Broadcasts mode-on, arms the job poll, and starts all eligible
    /// background users. Side effects are best-effort; there is no error
    /// return. A second `enter` while a window is active is ignored.
    pub async fn enter(&self, completion: CompletionSignal) {
        tracing::debug!("entering garage mode");
        {
            let mut inner = self.lock_inner();
            if inner.active {
                tracing::warn!("garage mode already active, ignoring enter");
                return;
            }
            inner.active = true;
            inner.pending_jobs.clear();
            inner.completion = Some(completion);
        }

        self.broadcast(ModeSignal::On).await;
        self.adapters.telemetry().log_session_start().await;
        self.arm_job_poll(JOB_SNAPSHOT_INITIAL_UPDATE);

        match self.adapters.users().start_all_background_users().await {
            Ok(users) => {
                self.lock_inner().users.track_all(users);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start background users");
            }
        }
    }

    /// Cut the window short
    ///
    /// Callable from any state and idempotent: repeated calls only
    /// re-broadcast mode-off and re-arm the (already idempotent) drain.
    pub async fn cancel(&self) {
        self.broadcast(ModeSignal::Off).await;
        self.complete(Outcome::Canceled);
        self.arm_user_stop_check();
    }

    /// End the window on an unexpected error
    pub async fn fail(&self, reason: impl Into<String>) {
        self.broadcast(ModeSignal::Off).await;
        self.complete(Outcome::Failed(reason.into()));
        self.arm_user_stop_check();
    }

    /// Natural end: every idle-blocking job has finished
    async fn finish(&self) {
        self.broadcast(ModeSignal::Off).await;
        self.adapters.telemetry().log_session_stop().await;
        self.adapters.wakeup().schedule_next_wakeup();
        self.complete(Outcome::Completed);
        self.arm_user_stop_check();
    }

    /// Job poll tick, driven by the dispatch loop
    ///
    /// Level-triggered: keeps re-arming until the count reaches zero. The
    /// pending list is only overwritten when something is running, so the
    /// last known blockers stay visible after the window closes.
    pub async fn on_job_poll(&self) {
        let result = self.probe.idle_blocking_running().await;
        if result.count > 0 {
            tracing::debug!(running = result.count, "jobs are still running, waiting for them");
            self.lock_inner().pending_jobs = result.pending;
            self.arm_job_poll(JOB_SNAPSHOT_UPDATE_FREQUENCY);
        } else {
            tracing::debug!("no idle-blocking jobs are currently running");
            self.finish().await;
        }
    }

    /// Background-user stop tick, driven by the dispatch loop
    ///
    /// Stops at most one tracked user per tick, and only while the global
    /// job count is zero; stopping users while jobs still run can crash
    /// their job scheduling.
    pub async fn on_user_stop_check(&self) {
        let (user, remaining) = {
            let inner = self.lock_inner();
            match inner.users.peek() {
                Some(user) => (user, inner.users.remaining()),
                None => return,
            }
        };

        let result = self.probe.idle_blocking_running().await;
        if result.count == 0 {
            if user != UserId::SYSTEM {
                if let Err(e) = self.adapters.users().stop_background_user(user).await {
                    tracing::warn!(user = %user, error = %e, "failed to stop background user");
                }
                tracing::info!(user = %user, remaining = remaining - 1, "stopping background user");
            }
            let drained = {
                let mut inner = self.lock_inner();
                inner.users.remove(user);
                inner.users.is_empty()
            };
            if drained {
                tracing::info!("all background users have stopped");
                return;
            }
        } else {
            // Same bookkeeping as the job poll: the drain tick's probe also
            // refreshes the last known blockers
            self.lock_inner().pending_jobs = result.pending;
            tracing::info!(remaining, "waiting for jobs to finish before stopping users");
        }

        // Poll again for the next user
        self.arm_user_stop_check();
    }

    /// Resolve the window's completion signal and, if this call won the
    /// resolution, run cleanup. Taking the signal out of `inner` makes the
    /// continuation fire exactly once per window.
    fn complete(&self, outcome: Outcome) {
        let Some(signal) = self.lock_inner().completion.take() else {
            return;
        };
        if signal.resolve(outcome.clone()) {
            match &outcome {
                Outcome::Completed => tracing::debug!("garage mode completed normally"),
                Outcome::Canceled => tracing::debug!("garage mode was canceled"),
                Outcome::Failed(reason) => {
                    tracing::error!(reason = %reason, "garage mode ended on failure");
                }
            }
        } else {
            tracing::warn!("completion signal was already resolved");
        }
        self.cleanup();
    }

    fn cleanup(&self) {
        tracing::debug!("cleaning up garage mode");
        self.lock_inner().active = false;
        self.lock_scheduler().cancel(JOB_POLL_TIMER);
        self.arm_user_stop_check();
    }

    async fn broadcast(&self, signal: ModeSignal) {
        tracing::debug!(action = signal.action(), "broadcasting garage mode signal");
        self.adapters.signals().broadcast(signal).await;
    }

    fn arm_job_poll(&self, delay: Duration) {
        let fire_at = self.clock.now() + delay;
        self.lock_scheduler()
            .schedule(JOB_POLL_TIMER, fire_at, ScheduledKind::JobPoll);
    }

    fn arm_user_stop_check(&self) {
        if self.lock_inner().users.is_empty() {
            return;
        }
        let fire_at = self.clock.now() + USER_STOP_CHECK_INTERVAL;
        self.lock_scheduler()
            .schedule(USER_STOP_TIMER, fire_at, ScheduledKind::UserStopCheck);
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
