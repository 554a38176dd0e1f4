// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter bundle handed to the coordinator

use super::traits::{
    JobSchedulerAdapter, ModeSignalAdapter, TelemetryAdapter, UserContextAdapter, WakeupScheduler,
};

/// Everything the coordinator talks to, as one generic parameter
pub trait GarageAdapters: Clone + Send + Sync + 'static {
    type Jobs: JobSchedulerAdapter;
    type Users: UserContextAdapter;
    type Signals: ModeSignalAdapter;
    type Telemetry: TelemetryAdapter;
    type Wakeup: WakeupScheduler;

    fn jobs(&self) -> Self::Jobs;
    fn users(&self) -> Self::Users;
    fn signals(&self) -> Self::Signals;
    fn telemetry(&self) -> Self::Telemetry;
    fn wakeup(&self) -> Self::Wakeup;
}
