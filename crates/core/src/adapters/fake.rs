// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapter implementations for testing

use super::bundle::GarageAdapters;
use super::traits::*;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Recorded call to an adapter method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    // Job backend calls
    AllJobs,
    StartedJobs,

    // User context calls
    StartAllBackgroundUsers,
    StopBackgroundUser { id: UserId },

    // Signal channel calls
    Broadcast { signal: ModeSignal },

    // Telemetry calls
    LogSessionStart,
    LogSessionStop,

    // Controller calls
    ScheduleNextWakeup,
}

/// One backend view consumed by a single probe (one `all_jobs` call)
#[derive(Debug, Clone, Default)]
struct BackendFrame {
    jobs: Vec<JobSnapshot>,
    started: Vec<JobId>,
}

/// Shared state for fake adapters
#[derive(Default)]
struct FakeState {
    calls: Vec<AdapterCall>,
    /// Current backend view; `all_jobs` pops the next scripted frame into it
    current: BackendFrame,
    scripted: VecDeque<BackendFrame>,
    background_users: Vec<UserId>,
    // Configurable failure modes
    backend_unavailable: bool,
    stop_user_fails: bool,
}

/// Fake adapters with call recording for testing
///
/// Implements every collaborator contract plus the [`GarageAdapters`] bundle,
/// so a test can hand one value to the coordinator and inspect everything it
/// did afterwards.
#[derive(Clone)]
pub struct FakeAdapters {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeAdapters {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAdapters {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.lock().calls.clone()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// How many times `signal` was broadcast
    pub fn broadcasts(&self, signal: ModeSignal) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, AdapterCall::Broadcast { signal: s } if *s == signal))
            .count()
    }

    /// Set the backend view returned until the next scripted frame
    pub fn set_jobs(&self, jobs: Vec<JobSnapshot>, started: Vec<JobId>) {
        let mut state = self.lock();
        state.current = BackendFrame { jobs, started };
    }

    /// Queue a backend view for one future probe; each `all_jobs` call
    /// consumes one frame, then the last frame sticks
    pub fn script_poll(&self, jobs: Vec<JobSnapshot>, started: Vec<JobId>) {
        self.lock().scripted.push_back(BackendFrame { jobs, started });
    }

    /// Convenience: script a probe observing `ids` as started idle-blocking jobs
    pub fn script_running(&self, ids: &[&str]) {
        let jobs = ids.iter().map(|id| JobSnapshot::new(*id, true)).collect();
        let started = ids.iter().map(|id| JobId(id.to_string())).collect();
        self.script_poll(jobs, started);
    }

    /// Set the users returned by `start_all_background_users`
    pub fn set_background_users(&self, users: Vec<UserId>) {
        self.lock().background_users = users;
    }

    /// Make both job backend calls fail until cleared
    pub fn set_backend_unavailable(&self, unavailable: bool) {
        self.lock().backend_unavailable = unavailable;
    }

    /// Make `stop_background_user` fail
    pub fn set_stop_user_fails(&self, fails: bool) {
        self.lock().stop_user_fails = fails;
    }
}

#[async_trait]
impl JobSchedulerAdapter for FakeAdapters {
    async fn all_jobs(&self) -> Result<Vec<JobSnapshot>, JobBackendError> {
        let mut state = self.lock();
        state.calls.push(AdapterCall::AllJobs);
        if state.backend_unavailable {
            return Err(JobBackendError::Unavailable("fake backend down".into()));
        }
        if let Some(frame) = state.scripted.pop_front() {
            state.current = frame;
        }
        Ok(state.current.jobs.clone())
    }

    async fn started_jobs(&self) -> Result<Vec<JobId>, JobBackendError> {
        let mut state = self.lock();
        state.calls.push(AdapterCall::StartedJobs);
        if state.backend_unavailable {
            return Err(JobBackendError::Unavailable("fake backend down".into()));
        }
        Ok(state.current.started.clone())
    }
}

#[async_trait]
impl UserContextAdapter for FakeAdapters {
    async fn start_all_background_users(&self) -> Result<Vec<UserId>, UserContextError> {
        let mut state = self.lock();
        state.calls.push(AdapterCall::StartAllBackgroundUsers);
        Ok(state.background_users.clone())
    }

    async fn stop_background_user(&self, id: UserId) -> Result<(), UserContextError> {
        let mut state = self.lock();
        state.calls.push(AdapterCall::StopBackgroundUser { id });
        if state.stop_user_fails {
            return Err(UserContextError::StopFailed(id, "fake stop failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ModeSignalAdapter for FakeAdapters {
    async fn broadcast(&self, signal: ModeSignal) {
        self.lock().calls.push(AdapterCall::Broadcast { signal });
    }
}

#[async_trait]
impl TelemetryAdapter for FakeAdapters {
    async fn log_session_start(&self) {
        self.lock().calls.push(AdapterCall::LogSessionStart);
    }

    async fn log_session_stop(&self) {
        self.lock().calls.push(AdapterCall::LogSessionStop);
    }
}

impl WakeupScheduler for FakeAdapters {
    fn schedule_next_wakeup(&self) {
        self.lock().calls.push(AdapterCall::ScheduleNextWakeup);
    }
}

impl GarageAdapters for FakeAdapters {
    type Jobs = FakeAdapters;
    type Users = FakeAdapters;
    type Signals = FakeAdapters;
    type Telemetry = FakeAdapters;
    type Wakeup = FakeAdapters;

    fn jobs(&self) -> Self::Jobs {
        self.clone()
    }

    fn users(&self) -> Self::Users {
        self.clone()
    }

    fn signals(&self) -> Self::Signals {
        self.clone()
    }

    fn telemetry(&self) -> Self::Telemetry {
        self.clone()
    }

    fn wakeup(&self) -> Self::Wakeup {
        self.clone()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
