// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe for idle-blocking running jobs
//!
//! Fetches a fresh view from the job backend on every call; nothing is
//! cached. Backend unavailability is reported as zero blockers so a window
//! can always close instead of hanging on a dead backend.

use crate::adapters::JobSchedulerAdapter;
use std::collections::HashSet;

/// Outcome of one probe
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    /// Number of jobs that are both started and flagged idle-required
    pub count: usize,
    /// Stringified ids of those jobs, for diagnostic exposure
    pub pending: Vec<String>,
}

/// Queries the job backend for jobs that keep the idle window open
#[derive(Clone)]
pub struct JobSnapshotProbe<J: JobSchedulerAdapter> {
    jobs: J,
}

impl<J: JobSchedulerAdapter> JobSnapshotProbe<J> {
    pub fn new(jobs: J) -> Self {
        Self { jobs }
    }

    /// Count currently running jobs that require an idle window
    pub async fn idle_blocking_running(&self) -> ProbeResult {
        let all = match self.jobs.all_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::debug!(error = %e, "job list unavailable, treating as no blockers");
                return ProbeResult::default();
            }
        };
        let started = match self.jobs.started_jobs().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!(error = %e, "started-job list unavailable, treating as no blockers");
                return ProbeResult::default();
            }
        };

        let started: HashSet<_> = started.into_iter().collect();
        let pending: Vec<String> = all
            .iter()
            .filter(|snap| snap.requires_idle && started.contains(&snap.id))
            .map(|snap| snap.id.to_string())
            .collect();

        ProbeResult {
            count: pending.len(),
            pending,
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
