// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture and audio feedback
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │    Audio    │    │     Camera       │   │
//! │  │  (shutter)  │    │ GStreamer / test │   │
//! │  └─────────────┘    └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`audio`]: Shutter cue
//! - [`camera`]: Frame sources, sessions and session replacement

pub mod audio;
pub mod camera;

/// Initialize GStreamer once per process
///
/// Safe to call repeatedly; later calls are no-ops.
#[cfg(feature = "gstreamer")]
pub fn gst_init() -> Result<(), String> {
    gstreamer::init().map_err(|e| format!("GStreamer init failed: {}", e))
}
