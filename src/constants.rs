// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Camera acquisition
pub mod camera {
    use super::Duration;

    /// Ideal capture width requested from the device
    pub const IDEAL_WIDTH: u32 = 1280;

    /// Ideal capture height requested from the device
    pub const IDEAL_HEIGHT: u32 = 720;

    /// How long a fresh session may take to deliver its first frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Frames drawn during this period after start-up are discarded by the
    /// headless photo command while exposure settles
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Timeout for the capture pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Maximum buffers queued in the capture appsink (older frames are dropped)
    pub const MAX_BUFFERS: u32 = 2;

    /// Raw format delivered to the compositor
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Render loop and transform tuning
pub mod render {
    use super::Duration;

    /// Display refresh tick driving the render loop (~60 Hz)
    pub const DISPLAY_TICK: Duration = Duration::from_micros(16_667);

    /// Brightness change per unit of exposure (`brightness = 1 + exposure * k`)
    pub const EXPOSURE_SENSITIVITY: f32 = 0.5;

    /// Contrast applied by the cinema filter
    pub const CINEMA_CONTRAST: f32 = 1.15;

    /// Saturation applied by the vivid filter
    pub const VIVID_SATURATION: f32 = 1.3;

    /// Log frame statistics every N accepted frames
    pub const FRAME_LOG_INTERVAL: u64 = 300;
}

/// Film grain overlay
pub mod grain {
    /// Marks per surface pixel. Quality/performance knob: 0.02 on a 720p
    /// surface scatters ~18k marks per frame.
    pub const DENSITY: f32 = 0.02;

    /// Opacity of a single mark (0-255)
    pub const MARK_ALPHA: u8 = 28;
}

/// Zoom control
pub mod zoom {
    /// Lower zoom bound, never cropped outside the source
    pub const MIN: f32 = 1.0;

    /// Zoom increment for step in/out
    pub const STEP: f32 = 0.1;

    /// Pinch gestures shorter than this (in pixels) are ignored
    pub const MIN_PINCH_DISTANCE: f32 = 1.0;
}

/// Exposure control
pub mod exposure {
    /// Slider lower bound
    pub const MIN: f32 = -1.0;

    /// Slider upper bound
    pub const MAX: f32 = 1.0;

    /// Exposure increment for step up/down
    pub const STEP: f32 = 0.1;
}

/// Photo capture and video recording
pub mod capture {
    use super::Duration;

    /// Frames per second pulled from the compositing surface while recording,
    /// independent of the render loop's target rate
    pub const RECORDING_FPS: u32 = 30;

    /// How long the capture flash stays visible
    pub const FLASH_DURATION: Duration = Duration::from_millis(150);

    /// Default JPEG quality (1-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;

    /// VP9 target bitrate for recordings (kbps)
    pub const RECORDING_BITRATE_KBPS: u32 = 4_000;

    /// How long shutdown waits for the recorder sink to finalize
    pub const FINALIZE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Container extension for recordings
    pub const VIDEO_EXTENSION: &str = "webm";
}

/// Focus indicator animation
pub mod focus {
    use super::Duration;

    /// Indicator fully visible after a tap
    pub const VISIBLE: Duration = Duration::from_millis(600);

    /// Fade-out after the visible phase
    pub const FADE: Duration = Duration::from_millis(300);
}

/// Shutter sound
pub mod sound {
    /// Beep frequency (Hz)
    pub const BEEP_FREQUENCY: f64 = 880.0;

    /// Beep volume (0.0-1.0)
    pub const BEEP_VOLUME: f64 = 0.3;

    /// Beep length in audio buffers (~10 ms each)
    pub const BEEP_BUFFERS: i32 = 8;
}
