// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller: owns the coordinator and decides when the vehicle wakes up
//!
//! A natural garage-mode finish asks the planner for the next maintenance
//! wake-up. The policy walks a schedule of `"<interval>,<times>"` rows, e.g.
//! wake once after 15 minutes, then every 6 hours eight times, then daily.
//! Leaving idle (vehicle back in use) resets the walk.

use gk_core::{
    Clock, CompletionSignal, CompletionWaiter, GarageAdapters, GarageMode, ScheduledKind,
    Scheduler, WakeupScheduler,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Timer id for the next maintenance wake-up
pub const WAKEUP_TIMER: &str = "controller:wakeup";

/// Wake-up policy parse errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("malformed policy row {0:?}: expected \"<interval>,<times>\"")]
    MalformedRow(String),

    #[error("bad interval in policy row {row:?}: {source}")]
    BadInterval {
        row: String,
        source: humantime::DurationError,
    },

    #[error("repetition count must be positive in policy row {0:?}")]
    ZeroTimes(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WakeupRow {
    interval: Duration,
    times: u32,
}

/// Schedule of wake-up intervals, walked one wake-up at a time
#[derive(Debug, Clone)]
pub struct WakeupPolicy {
    rows: Vec<WakeupRow>,
    /// Wake-ups handed out since the last reset
    position: usize,
}

impl WakeupPolicy {
    /// Parse rows like `"15m,1"`, `"6h,8"`, `"1d,5"`
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, PolicyError> {
        let mut parsed = Vec::with_capacity(rows.len());
        for row in rows {
            let row = row.as_ref();
            let (interval, times) = row
                .split_once(',')
                .ok_or_else(|| PolicyError::MalformedRow(row.to_string()))?;

            let interval =
                humantime::parse_duration(interval.trim()).map_err(|source| {
                    PolicyError::BadInterval {
                        row: row.to_string(),
                        source,
                    }
                })?;
            let times: u32 = times
                .trim()
                .parse()
                .map_err(|_| PolicyError::MalformedRow(row.to_string()))?;
            if times == 0 {
                return Err(PolicyError::ZeroTimes(row.to_string()));
            }

            parsed.push(WakeupRow { interval, times });
        }

        Ok(Self {
            rows: parsed,
            position: 0,
        })
    }

    /// Interval until the next wake-up, advancing the walk
    ///
    /// An exhausted schedule keeps returning its last row's interval; an
    /// empty policy yields nothing (no wake-ups at all).
    pub fn next_interval(&mut self) -> Option<Duration> {
        let interval = self.interval_at(self.position)?;
        self.position += 1;
        Some(interval)
    }

    /// Restart the walk from the first row
    pub fn reset(&mut self) {
        self.position = 0;
    }

    fn interval_at(&self, position: usize) -> Option<Duration> {
        let mut cursor = position;
        for row in &self.rows {
            if cursor < row.times as usize {
                return Some(row.interval);
            }
            cursor -= row.times as usize;
        }
        self.rows.last().map(|row| row.interval)
    }
}

/// Arms the wake-up timer according to the policy
///
/// Shared between the controller (reset on vehicle use) and the coordinator
/// (armed on a natural finish, via [`WakeupScheduler`]).
#[derive(Clone)]
pub struct WakeupPlanner<C: Clock> {
    scheduler: Arc<Mutex<Scheduler>>,
    policy: Arc<Mutex<WakeupPolicy>>,
    clock: C,
}

impl<C: Clock> WakeupPlanner<C> {
    pub fn new(scheduler: Arc<Mutex<Scheduler>>, policy: WakeupPolicy, clock: C) -> Self {
        Self {
            scheduler,
            policy: Arc::new(Mutex::new(policy)),
            clock,
        }
    }

    /// Restart the policy walk and drop any armed wake-up
    pub fn reset(&self) {
        self.lock_policy().reset();
        self.lock_scheduler().cancel(WAKEUP_TIMER);
    }

    fn lock_policy(&self) -> MutexGuard<'_, WakeupPolicy> {
        self.policy.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock> WakeupScheduler for WakeupPlanner<C> {
    fn schedule_next_wakeup(&self) {
        let Some(interval) = self.lock_policy().next_interval() else {
            tracing::warn!("wake-up policy is empty, not scheduling a wake-up");
            return;
        };
        let fire_at = self.clock.now() + interval;
        self.lock_scheduler()
            .schedule(WAKEUP_TIMER, fire_at, ScheduledKind::Wakeup);
        tracing::info!(
            interval = %humantime::format_duration(interval),
            "next maintenance wake-up scheduled"
        );
    }
}

/// Owns the coordinator and reacts to idle triggers and wake-up timers
pub struct Controller<A: GarageAdapters, C: Clock> {
    garage: Arc<GarageMode<A, C>>,
    planner: WakeupPlanner<C>,
}

impl<A: GarageAdapters, C: Clock> Controller<A, C> {
    pub fn new(garage: Arc<GarageMode<A, C>>, planner: WakeupPlanner<C>) -> Self {
        Self { garage, planner }
    }

    pub fn garage(&self) -> &Arc<GarageMode<A, C>> {
        &self.garage
    }

    /// The vehicle went idle: open a garage-mode window
    pub async fn initiate_garage_mode(&self) -> CompletionWaiter {
        let signal = CompletionSignal::new();
        let waiter = signal.subscribe();
        self.garage.enter(signal).await;
        waiter
    }

    /// The vehicle is back in use: cut the window and restart the wake-up walk
    pub async fn cancel_garage_mode(&self) {
        self.planner.reset();
        self.garage.cancel().await;
    }

    /// Wake-up timer fired: run another maintenance window unless one is open
    pub async fn on_wakeup(&self) {
        if self.garage.is_active() {
            tracing::debug!("wake-up fired while garage mode already active");
            return;
        }
        tracing::info!("maintenance wake-up, entering garage mode");
        let waiter = self.initiate_garage_mode().await;
        tokio::spawn(async move {
            let outcome = waiter.wait().await;
            tracing::info!(?outcome, "wake-up window ended");
        });
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
