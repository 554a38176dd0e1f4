// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-fulfillment completion signal for a garage-mode window
//!
//! A window ends exactly once: completed, canceled, or failed. The first
//! `resolve` wins and later calls are no-ops; the winning caller is the one
//! (and only) path that runs window cleanup. Waiters observe the outcome
//! asynchronously and cannot resolve or un-resolve it.

use tokio::sync::watch;

/// Terminal outcome of a garage-mode window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All idle-blocking jobs drained naturally
    Completed,
    /// The window was cut short from outside
    Canceled,
    /// The window ended on an unexpected error
    Failed(String),
}

/// Handle for awaiting a window's outcome
#[derive(Debug, Clone)]
pub struct CompletionWaiter {
    rx: watch::Receiver<Option<Outcome>>,
}

impl CompletionWaiter {
    /// Wait for the window to end
    ///
    /// Resolves immediately if the outcome is already set. If every signal
    /// handle is dropped unresolved, the window is reported as failed.
    pub async fn wait(mut self) -> Outcome {
        loop {
            if let Some(outcome) = self.rx.borrow().clone() {
                return outcome;
            }
            if self.rx.changed().await.is_err() {
                return Outcome::Failed("completion signal dropped".to_string());
            }
        }
    }

    /// Non-blocking peek at the outcome
    pub fn outcome(&self) -> Option<Outcome> {
        self.rx.borrow().clone()
    }
}

/// Single-assignment result cell for one window
#[derive(Debug)]
pub struct CompletionSignal {
    tx: watch::Sender<Option<Outcome>>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Record the terminal outcome
    ///
    /// Returns true only for the first terminal transition; the caller that
    /// gets true owns cleanup. Subsequent calls change nothing.
    pub fn resolve(&self, outcome: Outcome) -> bool {
        self.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.tx.borrow().clone()
    }

    /// New waiter for this window's outcome
    pub fn subscribe(&self) -> CompletionWaiter {
        CompletionWaiter {
            rx: self.tx.subscribe(),
        }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
