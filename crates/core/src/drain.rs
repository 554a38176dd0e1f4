// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracked set of background users started for the current window
//!
//! Pure state: the drain tick on [`crate::mode::GarageMode`] decides when a
//! user may actually be stopped (only while no idle-blocking jobs run) and
//! stops at most one per tick, so the user manager never sees a shutdown
//! storm and the no-jobs precondition is re-checked before every stop.

use crate::adapters::UserId;
use std::collections::BTreeSet;

/// Ordered set of background users awaiting shutdown
#[derive(Debug, Default)]
pub struct BackgroundUserTracker {
    started: BTreeSet<UserId>,
}

impl BackgroundUserTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record users started for this window
    pub fn track_all(&mut self, ids: impl IntoIterator<Item = UserId>) {
        self.started.extend(ids);
    }

    /// Next user to stop, lowest id first; the set is unchanged
    pub fn peek(&self) -> Option<UserId> {
        self.started.iter().next().copied()
    }

    /// Untrack a user once stopped (or skipped); true if it was tracked
    pub fn remove(&mut self, id: UserId) -> bool {
        self.started.remove(&id)
    }

    pub fn remaining(&self) -> usize {
        self.started.len()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
