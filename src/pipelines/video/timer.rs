// SPDX-License-Identifier: GPL-3.0-only

//! Recording elapsed-time label

use std::time::Duration;
use tokio::time::Instant;

/// Format a duration as `MM:SS`; minutes keep counting past 59
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Elapsed-time display for an active recording
///
/// Driven by the display tick. The label is computed from the wall-clock
/// delta since `start`, never from a frame count. After `cancel` no further
/// updates are produced.
#[derive(Debug, Default, Clone)]
pub struct ElapsedTimer {
    started_at: Option<Instant>,
    updates: u64,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.updates = 0;
    }

    /// Stop producing updates; `true` only for the call that actually stopped it
    pub fn cancel(&mut self) -> bool {
        self.started_at.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Label updates produced since `start`
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Elapsed time without counting an update
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|started| now.saturating_duration_since(started))
    }

    /// One scheduling tick: the new label, or `None` when cancelled
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        let elapsed = self.elapsed(now)?;
        self.updates += 1;
        Some(format_elapsed(elapsed))
    }
}
