// SPDX-License-Identifier: GPL-3.0-only
//! Paced producer threads for synthetic frame sources
//!
//! A [`FrameLoop`] owns one OS thread that calls a producer closure at a fixed
//! rate and publishes each frame into a latest-frame channel. Stopping joins
//! the thread, so once `stop()` returns no more frames are published.

use super::types::{CameraFrame, FrameSender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the producer wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep producing
    Continue,
    /// Exit the thread
    Stop,
}

/// Controller for a frame producer thread
pub struct FrameLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl FrameLoop {
    /// Spawn a producer publishing into `sender` at `fps`
    ///
    /// `startup_delay` holds back the first frame, which lets callers observe
    /// the not-ready window of a fresh stream.
    pub fn start<F>(
        name: &str,
        fps: u32,
        startup_delay: Duration,
        sender: FrameSender,
        mut produce: F,
    ) -> Self
    where
        F: FnMut(u64) -> (CameraFrame, LoopAction) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop_signal);
        let thread_name = name.to_string();
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));

        info!(name = %name, fps, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            if !sleep_unless_stopped(&stop_clone, startup_delay) {
                debug!(name = %thread_name, "Stopped before first frame");
                return;
            }

            let mut sequence = 0u64;
            let mut next_deadline = Instant::now();
            loop {
                if stop_clone.load(Ordering::SeqCst) {
                    debug!(name = %thread_name, "Stop signal received");
                    break;
                }

                let (frame, action) = produce(sequence);
                sender.send_replace(Some(Arc::new(frame)));
                sequence += 1;

                if action == LoopAction::Stop {
                    debug!(name = %thread_name, "Producer requested stop");
                    break;
                }

                next_deadline += period;
                let wait = next_deadline.saturating_duration_since(Instant::now());
                if !sleep_unless_stopped(&stop_clone, wait) {
                    break;
                }
            }

            info!(name = %thread_name, frames = sequence, "Frame loop exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Whether the producer thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Frame loop thread finished");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}

/// Sleep in short slices so a stop request is honoured promptly.
/// Returns `false` if stopped.
fn sleep_unless_stopped(stop: &AtomicBool, total: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(5);
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::frame_channel;

    fn tiny_frame() -> CameraFrame {
        CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255])
    }

    #[test]
    fn test_producer_stop_action() {
        let (tx, rx) = frame_channel();
        let mut frame_loop = FrameLoop::start("test", 1000, Duration::ZERO, tx, |seq| {
            let action = if seq >= 3 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            };
            (tiny_frame(), action)
        });

        frame_loop.stop();
        assert!(rx.borrow().is_some());
        assert!(!frame_loop.is_running());
    }

    #[test]
    fn test_stop_during_startup_delay_publishes_nothing() {
        let (tx, rx) = frame_channel();
        let mut frame_loop =
            FrameLoop::start("delayed", 30, Duration::from_secs(10), tx, |_| {
                (tiny_frame(), LoopAction::Continue)
            });

        frame_loop.stop();
        assert!(rx.borrow().is_none());
    }
}
