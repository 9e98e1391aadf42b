// SPDX-License-Identifier: GPL-3.0-only

//! Render loop
//!
//! ```text
//! display tick ──► FrameClock gate ──► latest camera frame
//!                                            │
//!                        compute_crop + compute_filter
//!                                            │
//!                                            ▼
//!                               draw_frame ──► Surface ──► grain (film)
//! ```
//!
//! The loop is a two-state machine. While **Idle** no ticks are scheduled at
//! all; while **Running** a display-rate interval fires and each tick either
//! composites a frame or is skipped by the frame-rate gate.

pub mod composite;
pub mod grain;
pub mod transform;

pub use composite::{Surface, draw_frame};
pub use transform::{CropRect, FilterParams, clamp_zoom, compute_crop, compute_filter};

use crate::app::ViewState;
use crate::backends::camera::CameraFrame;
use crate::constants::{grain as grain_consts, render};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Frame-rate gate
///
/// A tick is accepted once at least one frame interval has passed since the
/// last accepted draw. On acceptance the baseline moves to `now` minus the
/// leftover remainder, so the cadence stays phase-locked instead of drifting
/// by up to one display tick per frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    last_draw: Instant,
}

impl FrameClock {
    pub fn new(fps: u32, now: Instant) -> Self {
        Self {
            interval: Self::interval_for(fps),
            last_draw: now,
        }
    }

    fn interval_for(fps: u32) -> Duration {
        Duration::from_secs(1) / fps.max(1)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.interval = Self::interval_for(fps);
    }

    /// Restart the cadence at `now`
    pub fn reset(&mut self, now: Instant) {
        self.last_draw = now;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_draw) >= self.interval
    }

    /// Record an accepted draw at `now`, carrying the remainder forward
    pub fn commit(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_draw);
        let interval_nanos = self.interval.as_nanos().max(1);
        let remainder = Duration::from_nanos((elapsed.as_nanos() % interval_nanos) as u64);
        self.last_draw = now.checked_sub(remainder).unwrap_or(now);
    }
}

/// Result of one scheduling tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loop is stopped
    Idle,
    /// Frame interval not yet elapsed
    NotDue,
    /// Camera has not produced a frame yet; baseline untouched
    SourceNotReady,
    /// A frame was composited
    Drawn,
    /// The frame could not be composited and was skipped
    Failed,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub ticks: u64,
    pub drawn: u64,
    pub not_ready: u64,
    pub failed: u64,
}

/// Owner of the display-rate scheduling chain
///
/// There is at most one ticker; [`RenderLoop::stop`] drops it so no further
/// ticks are produced, and `start` on a running loop only resets the cadence.
pub struct RenderLoop {
    running: bool,
    ticker: Option<Interval>,
    clock: FrameClock,
    rng: StdRng,
    stats: RenderStats,
}

impl RenderLoop {
    pub fn new(fps: u32) -> Self {
        Self::with_rng(fps, StdRng::from_os_rng())
    }

    /// Loop with a fixed grain generator
    pub fn with_rng(fps: u32, rng: StdRng) -> Self {
        Self {
            running: false,
            ticker: None,
            clock: FrameClock::new(fps, Instant::now()),
            rng,
            stats: RenderStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn frame_interval(&self) -> Duration {
        self.clock.interval()
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.clock.set_fps(fps);
    }

    /// Idle → Running
    pub fn start(&mut self, now: Instant) {
        if !self.running {
            info!(interval_ms = self.clock.interval().as_millis() as u64, "Render loop started");
        }
        self.running = true;
        self.clock.reset(now);
    }

    /// Running → Idle; halts the scheduling chain
    pub fn stop(&mut self) {
        if self.running {
            info!(drawn = self.stats.drawn, failed = self.stats.failed, "Render loop stopped");
        }
        self.running = false;
        self.ticker = None;
    }

    /// Wait for the next display tick
    ///
    /// Never resolves while the loop is idle.
    pub async fn next_tick(&mut self) -> Instant {
        if !self.running {
            return std::future::pending().await;
        }
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = tokio::time::interval(render::DISPLAY_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await
    }

    /// Run one scheduling tick
    ///
    /// `frame` is the source's latest frame, `None` while it is not ready.
    pub fn tick(
        &mut self,
        now: Instant,
        frame: Option<&CameraFrame>,
        view: &ViewState,
        mirror: bool,
        surface: &mut Surface,
    ) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.stats.ticks += 1;

        if !self.clock.is_due(now) {
            return TickOutcome::NotDue;
        }

        let Some(frame) = frame else {
            self.stats.not_ready += 1;
            return TickOutcome::SourceNotReady;
        };

        // Failed frames still consume their slot
        self.clock.commit(now);

        let crop = compute_crop(frame.width, frame.height, view.zoom());
        let params = compute_filter(view.exposure(), view.filter());

        if let Err(e) = draw_frame(surface, frame, crop, &params, mirror) {
            self.stats.failed += 1;
            if self.stats.failed % render::FRAME_LOG_INTERVAL == 1 {
                warn!(error = %e, failed = self.stats.failed, "Skipping frame");
            }
            return TickOutcome::Failed;
        }

        if params.grain {
            grain::apply_grain(surface, grain_consts::DENSITY, &mut self.rng);
        }

        self.stats.drawn += 1;
        if self.stats.drawn % render::FRAME_LOG_INTERVAL == 0 {
            debug!(
                drawn = self.stats.drawn,
                ticks = self.stats.ticks,
                width = surface.width(),
                height = surface.height(),
                zoom = view.zoom(),
                filter = view.filter().name(),
                "Render stats"
            );
        }
        TickOutcome::Drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_phase_locked() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(30, t0);

        let late = t0 + Duration::from_millis(45);
        assert!(clock.is_due(late));
        clock.commit(late);

        // 45ms elapsed against a 33.3ms interval leaves ~11.7ms carried over,
        // so the next frame is due ~21.7ms later rather than a full interval
        assert!(!clock.is_due(late + Duration::from_millis(21)));
        assert!(clock.is_due(late + Duration::from_millis(22)));
    }

    #[test]
    fn test_clock_accepts_exact_interval() {
        let t0 = Instant::now();
        let clock = FrameClock::new(60, t0);
        assert!(clock.is_due(t0 + clock.interval()));
    }
}
