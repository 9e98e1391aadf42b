// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera producing moving colour bars
//!
//! Used by `--test-pattern`, by builds without GStreamer and by the test suite.
//! The source models exclusive device access: opening a second stream while
//! one is alive fails with [`AcquisitionError::Busy`].

use super::frame_loop::{FrameLoop, LoopAction};
use super::types::{CameraDevice, CameraFrame, Facing, StreamRequest, frame_channel};
use super::{CameraSession, FrameSource, StreamHandle};
use crate::errors::AcquisitionError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Colour-bar frame source
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    /// Facings this source pretends to have; empty means an external camera
    facings: Vec<Facing>,
    width: u32,
    height: u32,
    startup_delay: Duration,
    active_streams: Arc<AtomicUsize>,
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPatternSource {
    /// Source with a front and a back camera at a small preview size
    pub fn new() -> Self {
        Self {
            facings: vec![Facing::Back, Facing::Front],
            width: 320,
            height: 180,
            startup_delay: Duration::ZERO,
            active_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Only expose the given camera
    pub fn with_only(mut self, facing: Facing) -> Self {
        self.facings = vec![facing];
        self
    }

    /// Behave like an external camera that serves any facing
    pub fn external(mut self) -> Self {
        self.facings.clear();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Hold back the first frame of every stream
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Streams currently holding the device
    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::SeqCst)
    }

    fn device_for(&self, facing: Facing) -> Option<CameraDevice> {
        self.enumerate()
            .into_iter()
            .find(|device| device.serves(facing))
    }
}

impl FrameSource for TestPatternSource {
    fn name(&self) -> &'static str {
        "test-pattern"
    }

    fn enumerate(&self) -> Vec<CameraDevice> {
        if self.facings.is_empty() {
            return vec![CameraDevice {
                name: "Test Pattern".to_string(),
                path: "test-pattern:0".to_string(),
                facing: None,
            }];
        }
        self.facings
            .iter()
            .enumerate()
            .map(|(index, facing)| CameraDevice {
                name: format!("Test Pattern ({})", facing),
                path: format!("test-pattern:{}", index),
                facing: Some(*facing),
            })
            .collect()
    }

    fn open(&self, request: &StreamRequest) -> Result<CameraSession, AcquisitionError> {
        let device = self
            .device_for(request.facing)
            .ok_or(AcquisitionError::NoMatchingDevice(request.facing))?;

        if self
            .active_streams
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(facing = %request.facing, "Test pattern already streaming");
            return Err(AcquisitionError::Busy);
        }

        let (sender, frames) = frame_channel();
        let (width, height) = (self.width, self.height);
        let facing = request.facing;
        let frame_loop = FrameLoop::start(
            &device.path,
            request.ideal_fps,
            self.startup_delay,
            sender,
            move |sequence| {
                (
                    render_bars(width, height, sequence, facing),
                    LoopAction::Continue,
                )
            },
        );

        info!(device = %device.name, width, height, fps = request.ideal_fps, "Test pattern stream opened");

        let handle = TestPatternHandle {
            frame_loop: Some(frame_loop),
            active_streams: Arc::clone(&self.active_streams),
        };
        Ok(CameraSession::new(request, device, frames, Box::new(handle)))
    }
}

struct TestPatternHandle {
    frame_loop: Option<FrameLoop>,
    active_streams: Arc<AtomicUsize>,
}

impl StreamHandle for TestPatternHandle {
    fn stop(&mut self) {
        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
            self.active_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Vertical colour bars scrolling one column per frame
///
/// The back camera gets a white marker in the top-left corner so mirroring is
/// visible in previews.
fn render_bars(width: u32, height: u32, sequence: u64, facing: Facing) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let bar_width = (width / BARS.len() as u32).max(1);
    let marker = (width.min(height) / 8).max(1);

    for y in 0..height {
        for x in 0..width {
            let shifted = (u64::from(x) + sequence) % u64::from(width);
            let bar = ((shifted / u64::from(bar_width)) as usize).min(BARS.len() - 1);
            let rgb = if facing == Facing::Back && x < marker && y < marker {
                [255, 255, 255]
            } else {
                BARS[bar]
            };
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }

    CameraFrame::from_rgba(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_open_is_busy() {
        let source = TestPatternSource::new();
        let request = StreamRequest::new(Facing::Back, 30);
        let mut first = source.open(&request).unwrap();

        let second = source.open(&StreamRequest::new(Facing::Front, 30));
        assert!(matches!(second, Err(AcquisitionError::Busy)));

        first.stop();
        assert_eq!(source.active_streams(), 0);
        assert!(source.open(&request).is_ok());
    }

    #[test]
    fn test_missing_facing() {
        let source = TestPatternSource::new().with_only(Facing::Back);
        let result = source.open(&StreamRequest::new(Facing::Front, 30));
        assert!(matches!(
            result,
            Err(AcquisitionError::NoMatchingDevice(Facing::Front))
        ));
    }

    #[test]
    fn test_external_serves_front() {
        let source = TestPatternSource::new().external();
        assert!(source.open(&StreamRequest::new(Facing::Front, 30)).is_ok());
    }

    #[test]
    fn test_bars_geometry() {
        let frame = render_bars(16, 4, 0, Facing::Front);
        assert_eq!(frame.data.len(), 16 * 4 * 4);
        assert_eq!(frame.pixel(0, 0), [235, 235, 235, 255]);
        assert_eq!(frame.pixel(15, 3), [16, 16, 16, 255]);
    }
}
