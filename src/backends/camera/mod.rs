// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   App (context)     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   SessionManager    │  ← one session at a time, stop-before-start
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource trait  │  ← acquisition
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────────────┐
//!       ▼                   ▼
//!  ┌──────────┐     ┌──────────────┐
//!  │GStreamer │     │ Test pattern │
//!  └──────────┘     └──────────────┘
//! ```

#[cfg(feature = "gstreamer")]
pub mod gstreamer;
pub mod frame_loop;
pub mod manager;
pub mod test_pattern;
pub mod types;

pub use manager::SessionManager;
pub use test_pattern::TestPatternSource;
pub use types::*;

use crate::errors::AcquisitionError;
use std::sync::Arc;

/// A backend able to open live camera streams
///
/// `open` may block (device negotiation, pipeline start-up); callers run it off
/// the application task.
pub trait FrameSource: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// List the cameras this backend can open
    fn enumerate(&self) -> Vec<CameraDevice>;

    /// Acquire a stream for the request
    ///
    /// # Errors
    /// * `AcquisitionError::NoMatchingDevice` - no camera serves the facing
    /// * `AcquisitionError::PermissionDenied` - access refused
    /// * `AcquisitionError::Busy` - the device is still held
    fn open(&self, request: &StreamRequest) -> Result<CameraSession, AcquisitionError>;
}

/// Backend half of a live stream
pub trait StreamHandle: Send {
    /// Release every underlying track. Must be idempotent.
    fn stop(&mut self);
}

/// One active camera stream
///
/// Dropping a session stops it, but replacement goes through
/// [`SessionManager`] so the old stream is released before the next opens.
pub struct CameraSession {
    facing: Facing,
    target_fps: u32,
    device: CameraDevice,
    frames: FrameReceiver,
    handle: Box<dyn StreamHandle>,
}

impl CameraSession {
    /// Assemble a session from a backend stream
    pub fn new(
        request: &StreamRequest,
        device: CameraDevice,
        frames: FrameReceiver,
        handle: Box<dyn StreamHandle>,
    ) -> Self {
        Self {
            facing: request.facing,
            target_fps: request.ideal_fps,
            device,
            frames,
            handle,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    /// Most recent frame, `None` until the source has produced one
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frames.borrow().clone()
    }

    /// Whether the first frame has arrived
    pub fn is_ready(&self) -> bool {
        self.frames.borrow().is_some()
    }

    /// Wait until the first frame arrives
    ///
    /// Returns `false` if the producer went away first.
    pub async fn ready(&mut self) -> bool {
        self.frames.wait_for(|frame| frame.is_some()).await.is_ok()
    }

    /// Release the stream
    pub fn stop(&mut self) {
        self.handle.stop();
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.handle.stop();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("facing", &self.facing)
            .field("target_fps", &self.target_fps)
            .field("device", &self.device.name)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Camera backend selected at build time
///
/// GStreamer when compiled in, otherwise the synthetic test pattern.
pub fn default_source() -> Arc<dyn FrameSource> {
    #[cfg(feature = "gstreamer")]
    {
        Arc::new(gstreamer::GstCameraSource::new())
    }
    #[cfg(not(feature = "gstreamer"))]
    {
        Arc::new(TestPatternSource::new())
    }
}
