// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing (selfie) camera
    Front,
    /// Environment-facing camera
    #[default]
    Back,
}

impl Facing {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    /// Parse a device location string ("front", "back", "user", "environment")
    pub fn from_location(location: &str) -> Option<Self> {
        match location.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Some(Facing::Front),
            "back" | "rear" | "environment" => Some(Facing::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Parameters for acquiring a camera stream
///
/// Width, height and frame rate are ideals: backends convert whatever the
/// device offers to this geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_fps: u32,
}

impl StreamRequest {
    /// Request with the default ideal resolution
    pub fn new(facing: Facing, ideal_fps: u32) -> Self {
        Self {
            facing,
            ideal_width: crate::constants::camera::IDEAL_WIDTH,
            ideal_height: crate::constants::camera::IDEAL_HEIGHT,
            ideal_fps,
        }
    }
}

/// A single RGBA frame from a camera
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (may exceed `width * 4` when the backend pads rows)
    pub stride: u32,
    /// Packed RGBA pixels
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame from RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    /// Bytes needed for the declared geometry
    pub fn required_len(&self) -> usize {
        if self.height == 0 {
            return 0;
        }
        (self.height as usize - 1) * self.stride as usize + self.width as usize * 4
    }

    /// RGBA value at (x, y); caller guarantees bounds
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = y as usize * self.stride as usize + x as usize * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A camera device discovered by a backend
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    /// Backend-specific identifier (device path, node id)
    pub path: String,
    /// Facing reported by the device; `None` for external cameras
    pub facing: Option<Facing>,
}

impl CameraDevice {
    /// Whether this device can serve a request for `facing`
    ///
    /// External cameras report no location and serve either facing.
    pub fn serves(&self, facing: Facing) -> bool {
        self.facing.is_none_or(|f| f == facing)
    }
}

/// Latest-frame channel; `None` until the first frame arrives
pub type FrameReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

/// Producer side of [`FrameReceiver`]
pub type FrameSender = watch::Sender<Option<Arc<CameraFrame>>>;

/// Create an empty latest-frame channel
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    watch::channel(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_len_with_padding() {
        let frame = CameraFrame {
            width: 3,
            height: 2,
            stride: 16,
            data: Arc::from(vec![0u8; 28]),
            captured_at: Instant::now(),
        };
        // Last row is not padded
        assert_eq!(frame.required_len(), 16 + 12);
    }

    #[test]
    fn test_external_device_serves_any_facing() {
        let device = CameraDevice {
            name: "USB Camera".to_string(),
            path: "/dev/video0".to_string(),
            facing: None,
        };
        assert!(device.serves(Facing::Front));
        assert!(device.serves(Facing::Back));
    }

    #[test]
    fn test_facing_from_location() {
        assert_eq!(Facing::from_location("Front"), Some(Facing::Front));
        assert_eq!(Facing::from_location("environment"), Some(Facing::Back));
        assert_eq!(Facing::from_location("external"), None);
    }
}
