// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable timer queue for the dispatch loop
//!
//! All garage-mode ticks are fixed-delay timers, not completion events: the
//! job backend exposes no notification, so the coordinator re-arms a one-shot
//! timer after each tick. Re-scheduling an id replaces any pending entry for
//! it, so repeated `cancel()` calls or drain re-arms can never double-fire.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// A timer that has come due
#[derive(Debug, Clone)]
pub struct ScheduledItem {
    pub id: String,
    pub fire_at: Instant,
    pub kind: ScheduledKind,
    generation: u64,
}

/// What a fired timer should trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledKind {
    /// Poll the job backend for idle-blocking running jobs
    JobPoll,
    /// Check whether the next background user can be stopped
    UserStopCheck,
    /// Wake the vehicle for the next maintenance window
    Wakeup,
}

impl PartialEq for ScheduledItem {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl Eq for ScheduledItem {}

impl PartialOrd for ScheduledItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first
        Reverse(self.fire_at).cmp(&Reverse(other.fire_at))
    }
}

/// One-shot timer queue
///
/// Stale heap entries (replaced or cancelled) are recognized by generation
/// and skipped at poll time rather than removed eagerly.
pub struct Scheduler {
    items: BinaryHeap<ScheduledItem>,
    live: HashMap<String, u64>,
    next_generation: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            items: BinaryHeap::new(),
            live: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Arm a one-shot timer, replacing any pending timer with the same id
    pub fn schedule(&mut self, id: impl Into<String>, fire_at: Instant, kind: ScheduledKind) {
        let id = id.into();
        self.next_generation += 1;
        self.live.insert(id.clone(), self.next_generation);
        self.items.push(ScheduledItem {
            id,
            fire_at,
            kind,
            generation: self.next_generation,
        });
    }

    /// Cancel a pending timer; no-op if nothing is armed under this id
    pub fn cancel(&mut self, id: &str) {
        self.live.remove(id);
    }

    /// Whether a timer is currently armed under this id
    pub fn is_armed(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Pop all timers due at or before `now`, earliest first
    pub fn poll(&mut self, now: Instant) -> Vec<ScheduledItem> {
        let mut ready = Vec::new();

        while let Some(item) = self.items.peek() {
            if item.fire_at > now {
                break;
            }

            let Some(item) = self.items.pop() else {
                break;
            };

            // Skip entries that were cancelled or superseded by a re-schedule
            if self.live.get(&item.id) != Some(&item.generation) {
                continue;
            }

            self.live.remove(&item.id);
            ready.push(item);
        }

        ready
    }

    /// Earliest pending fire time, if any
    ///
    /// May point at a stale entry; the dispatch loop then wakes, polls an
    /// empty batch, and goes back to sleep. Harmless.
    pub fn next_fire_time(&self) -> Option<Instant> {
        self.items.peek().map(|item| item.fire_at)
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
