// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gk-core: the garage-mode idle-window coordinator
//!
//! This crate provides:
//! - The [`mode::GarageMode`] coordinator state machine
//! - Adapter traits for the collaborators it polls and signals
//! - A deterministic cancellable timer scheduler for the dispatch loop
//! - A single-fulfillment completion signal per idle window

pub mod adapters;
pub mod clock;
pub mod drain;
pub mod mode;
pub mod probe;
pub mod scheduler;
pub mod signal;

// Re-exports
pub use adapters::{
    AdapterCall, FakeAdapters, GarageAdapters, JobBackendError, JobId, JobSchedulerAdapter,
    JobSnapshot, ModeSignal, ModeSignalAdapter, TelemetryAdapter, UserContextAdapter,
    UserContextError, UserId, WakeupScheduler, ACTION_GARAGE_MODE_OFF, ACTION_GARAGE_MODE_ON,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use drain::BackgroundUserTracker;
pub use mode::{
    GarageMode, JOB_SNAPSHOT_INITIAL_UPDATE, JOB_SNAPSHOT_UPDATE_FREQUENCY,
    USER_STOP_CHECK_INTERVAL,
};
pub use probe::{JobSnapshotProbe, ProbeResult};
pub use scheduler::{ScheduledItem, ScheduledKind, Scheduler};
pub use signal::{CompletionSignal, CompletionWaiter, Outcome};
