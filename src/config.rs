// SPDX-License-Identifier: GPL-3.0-only

//! User settings
//!
//! Settings live in memory for the lifetime of the process. A JSON file can
//! seed them at start-up, but nothing is ever written back.

use crate::backends::camera::Facing;
use crate::constants::capture;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Target frame rate for the render loop and camera request
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FrameRateChoice {
    /// 24 frames per second
    Fps24,
    /// 30 frames per second
    #[default]
    Fps30,
    /// 60 frames per second
    Fps60,
}

impl FrameRateChoice {
    /// All choices, for settings iteration
    pub const ALL: [FrameRateChoice; 3] = [
        FrameRateChoice::Fps24,
        FrameRateChoice::Fps30,
        FrameRateChoice::Fps60,
    ];

    /// Frames per second
    pub fn fps(&self) -> u32 {
        match self {
            FrameRateChoice::Fps24 => 24,
            FrameRateChoice::Fps30 => 30,
            FrameRateChoice::Fps60 => 60,
        }
    }

    /// Display name for the settings panel
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameRateChoice::Fps24 => "24 fps",
            FrameRateChoice::Fps30 => "30 fps",
            FrameRateChoice::Fps60 => "60 fps",
        }
    }

    /// Cycle to the next choice, wrapping around
    pub fn next(self) -> Self {
        match self {
            FrameRateChoice::Fps24 => FrameRateChoice::Fps30,
            FrameRateChoice::Fps30 => FrameRateChoice::Fps60,
            FrameRateChoice::Fps60 => FrameRateChoice::Fps24,
        }
    }
}

impl TryFrom<u32> for FrameRateChoice {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.fps() == value)
            .ok_or(ConfigError::InvalidChoice {
                setting: "target_fps",
                value: value.to_string(),
            })
    }
}

impl From<FrameRateChoice> for u32 {
    fn from(choice: FrameRateChoice) -> Self {
        choice.fps()
    }
}

/// Upper bound for the zoom control
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MaxZoomChoice {
    /// 2x
    X2,
    /// 3x
    X3,
    /// 5x
    #[default]
    X5,
    /// 10x
    X10,
}

impl MaxZoomChoice {
    /// All choices, for settings iteration
    pub const ALL: [MaxZoomChoice; 4] = [
        MaxZoomChoice::X2,
        MaxZoomChoice::X3,
        MaxZoomChoice::X5,
        MaxZoomChoice::X10,
    ];

    /// Zoom factor
    pub fn factor(&self) -> u32 {
        match self {
            MaxZoomChoice::X2 => 2,
            MaxZoomChoice::X3 => 3,
            MaxZoomChoice::X5 => 5,
            MaxZoomChoice::X10 => 10,
        }
    }

    /// Zoom factor as used by the transform math
    pub fn value(&self) -> f32 {
        self.factor() as f32
    }

    /// Display name for the settings panel
    pub fn display_name(&self) -> &'static str {
        match self {
            MaxZoomChoice::X2 => "2x",
            MaxZoomChoice::X3 => "3x",
            MaxZoomChoice::X5 => "5x",
            MaxZoomChoice::X10 => "10x",
        }
    }

    /// Cycle to the next choice, wrapping around
    pub fn next(self) -> Self {
        match self {
            MaxZoomChoice::X2 => MaxZoomChoice::X3,
            MaxZoomChoice::X3 => MaxZoomChoice::X5,
            MaxZoomChoice::X5 => MaxZoomChoice::X10,
            MaxZoomChoice::X10 => MaxZoomChoice::X2,
        }
    }
}

impl TryFrom<u32> for MaxZoomChoice {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.factor() == value)
            .ok_or(ConfigError::InvalidChoice {
                setting: "max_zoom",
                value: value.to_string(),
            })
    }
}

impl From<MaxZoomChoice> for u32 {
    fn from(choice: MaxZoomChoice) -> Self {
        choice.factor()
    }
}

/// Image format for saved photos
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG with configurable quality
    Jpeg,
}

impl PhotoFormat {
    /// All choices, for settings iteration
    pub const ALL: [PhotoFormat; 2] = [PhotoFormat::Png, PhotoFormat::Jpeg];

    /// File extension (also the filename suffix of saved photos)
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoFormat::Png => "png",
            PhotoFormat::Jpeg => "jpeg",
        }
    }

    /// Display name for the settings panel
    pub fn display_name(&self) -> &'static str {
        match self {
            PhotoFormat::Png => "PNG",
            PhotoFormat::Jpeg => "JPEG",
        }
    }

    /// Cycle to the next choice, wrapping around
    pub fn next(self) -> Self {
        match self {
            PhotoFormat::Png => PhotoFormat::Jpeg,
            PhotoFormat::Jpeg => PhotoFormat::Png,
        }
    }
}

impl std::str::FromStr for PhotoFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(PhotoFormat::Png),
            "jpeg" | "jpg" => Ok(PhotoFormat::Jpeg),
            other => Err(ConfigError::InvalidChoice {
                setting: "save_format",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera to open at start-up
    pub facing: Facing,
    /// Render loop / camera frame rate
    pub target_fps: FrameRateChoice,
    /// Upper bound of the zoom control
    pub max_zoom: MaxZoomChoice,
    /// Photo file format
    pub save_format: PhotoFormat,
    /// JPEG quality (1-100), ignored for PNG
    pub jpeg_quality: u8,
    /// Play a shutter sound on capture
    pub shutter_sound: bool,
    /// Mirror the front camera like a selfie preview
    pub mirror_front: bool,
    /// Override for where photos and videos are saved
    pub save_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            target_fps: FrameRateChoice::default(),
            max_zoom: MaxZoomChoice::default(),
            save_format: PhotoFormat::default(),
            jpeg_quality: capture::DEFAULT_JPEG_QUALITY,
            shutter_sound: true,
            mirror_front: true,
            save_dir: None,
        }
    }
}

impl Config {
    /// Read settings from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            serde_json::from_str(text).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.jpeg_quality = config.jpeg_quality.clamp(1, 100);
        Ok(config)
    }

    /// Whether frames from the given camera are mirrored
    pub fn mirrors(&self, facing: Facing) -> bool {
        self.mirror_front && facing == Facing::Front
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "max_zoom": 3, "save_format": "jpeg" }"#).unwrap();
        assert_eq!(config.max_zoom, MaxZoomChoice::X3);
        assert_eq!(config.save_format, PhotoFormat::Jpeg);
        assert_eq!(config.target_fps, FrameRateChoice::Fps30);
        assert!(config.shutter_sound);
    }

    #[test]
    fn test_rejects_unknown_frame_rate() {
        let err = Config::from_json(r#"{ "target_fps": 45 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_jpeg_quality_is_clamped() {
        let config = Config::from_json(r#"{ "jpeg_quality": 0 }"#).unwrap();
        assert_eq!(config.jpeg_quality, 1);
    }

    #[test]
    fn test_choices_cycle_back_to_start() {
        let mut fps = FrameRateChoice::Fps24;
        for _ in 0..FrameRateChoice::ALL.len() {
            fps = fps.next();
        }
        assert_eq!(fps, FrameRateChoice::Fps24);

        let mut zoom = MaxZoomChoice::X2;
        for _ in 0..MaxZoomChoice::ALL.len() {
            zoom = zoom.next();
        }
        assert_eq!(zoom, MaxZoomChoice::X2);
    }

    #[test]
    fn test_mirrors_only_front() {
        let config = Config::default();
        assert!(config.mirrors(Facing::Front));
        assert!(!config.mirrors(Facing::Back));
    }
}
