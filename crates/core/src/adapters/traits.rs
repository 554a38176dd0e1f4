// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter trait definitions for the coordinator's collaborators
//!
//! Garage mode never owns the job scheduler, the user manager, or the signal
//! channel; it only depends on these narrow contracts. Real implementations
//! live in the daemon, fakes in [`crate::adapters::fake`].

use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// Job scheduler backend
// =============================================================================

/// Unique identifier for a scheduled job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of a scheduled job, re-fetched on every poll
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    /// Whether the job is flagged as requiring an idle window to execute
    pub requires_idle: bool,
}

impl JobSnapshot {
    pub fn new(id: impl Into<String>, requires_idle: bool) -> Self {
        Self {
            id: JobId(id.into()),
            requires_idle,
        }
    }
}

/// Errors from the job scheduler backend
///
/// The probe treats every variant as "backend unavailable" and reports zero
/// blockers; nothing here escalates past a debug log.
#[derive(Debug, Error)]
pub enum JobBackendError {
    #[error("job backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed backend response: {0}")]
    BadResponse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for the job scheduler backend
#[async_trait]
pub trait JobSchedulerAdapter: Clone + Send + Sync + 'static {
    /// All jobs known to the backend
    async fn all_jobs(&self) -> Result<Vec<JobSnapshot>, JobBackendError>;

    /// Ids of jobs currently executing
    async fn started_jobs(&self) -> Result<Vec<JobId>, JobBackendError>;
}

// =============================================================================
// Background user contexts
// =============================================================================

/// Identifier of a background user context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i32);

impl UserId {
    /// The system user. A background user never becomes the system user, but
    /// the drain path keeps the guard: the system user is only untracked,
    /// never stopped.
    pub const SYSTEM: UserId = UserId(0);
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from the user context manager
#[derive(Debug, Error)]
pub enum UserContextError {
    #[error("user not found: {0}")]
    NotFound(UserId),
    #[error("failed to stop user {0}: {1}")]
    StopFailed(UserId, String),
    #[error("user manager unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for starting and stopping background user contexts
#[async_trait]
pub trait UserContextAdapter: Clone + Send + Sync + 'static {
    /// Start every background user eligible to run idle jobs
    async fn start_all_background_users(&self) -> Result<Vec<UserId>, UserContextError>;

    /// Stop a previously started background user
    async fn stop_background_user(&self, id: UserId) -> Result<(), UserContextError>;
}

// =============================================================================
// Mode signal channel
// =============================================================================

/// Signal name broadcast when garage mode turns on.
///
/// The idleness tracker on the job scheduler side matches on this exact
/// string; change both together.
pub const ACTION_GARAGE_MODE_ON: &str = "gk.jobscheduler.GARAGE_MODE_ON";

/// Signal name broadcast when garage mode turns off.
pub const ACTION_GARAGE_MODE_OFF: &str = "gk.jobscheduler.GARAGE_MODE_OFF";

/// The two well-known garage-mode signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSignal {
    On,
    Off,
}

impl ModeSignal {
    pub fn action(self) -> &'static str {
        match self {
            ModeSignal::On => ACTION_GARAGE_MODE_ON,
            ModeSignal::Off => ACTION_GARAGE_MODE_OFF,
        }
    }
}

/// Fire-and-forget broadcast to registered receivers; no acknowledgment, no
/// abort, no error surface
#[async_trait]
pub trait ModeSignalAdapter: Clone + Send + Sync + 'static {
    async fn broadcast(&self, signal: ModeSignal);
}

// =============================================================================
// Telemetry sink
// =============================================================================

/// Fire-and-forget session markers for the stats pipeline
#[async_trait]
pub trait TelemetryAdapter: Clone + Send + Sync + 'static {
    async fn log_session_start(&self);
    async fn log_session_stop(&self);
}

// =============================================================================
// Wake-up scheduling
// =============================================================================

/// Owned by the controller; a natural finish asks it to arm the next
/// maintenance wake-up
pub trait WakeupScheduler: Clone + Send + Sync + 'static {
    fn schedule_next_wakeup(&self);
}
