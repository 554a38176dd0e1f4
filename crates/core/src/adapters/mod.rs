// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter modules for the coordinator's external collaborators

pub mod bundle;
pub mod fake;
pub mod traits;

// Re-export traits and types
pub use traits::{
    JobBackendError, JobId, JobSchedulerAdapter, JobSnapshot, ModeSignal, ModeSignalAdapter,
    TelemetryAdapter, UserContextAdapter, UserContextError, UserId, WakeupScheduler,
    ACTION_GARAGE_MODE_OFF, ACTION_GARAGE_MODE_ON,
};

// Re-export bundle
pub use bundle::GarageAdapters;

// Re-export fake adapters
pub use fake::{AdapterCall, FakeAdapters};
