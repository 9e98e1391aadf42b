// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use crate::backends::camera::Facing;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera acquisition errors
    Acquisition(AcquisitionError),
    /// Photo encoding errors
    Encode(EncodeError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Configuration errors
    Config(ConfigError),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera could not be opened
///
/// Fatal to the current attempt. Nothing retries automatically; the user has to
/// trigger a new acquisition (switch camera, restart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// Access to the device was refused
    PermissionDenied,
    /// No device matches the requested facing
    NoMatchingDevice(Facing),
    /// Another acquisition is still outstanding or the device is held elsewhere
    Busy,
    /// The stream started but never produced a frame
    Timeout,
    /// Backend error (e.g., GStreamer pipeline failure)
    Backend(String),
    /// The session cannot be replaced while a recording is active or finalizing
    RecordingActive,
}

/// The compositing surface could not be serialized to an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Nothing has been drawn yet (zero-size surface)
    EmptySurface,
    /// Photos are only taken in photo mode
    NotPhotoMode,
    /// Encoder rejected the pixels
    Encoding(String),
    /// Writing the file failed
    Save(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Recording already in progress
    AlreadyRecording,
    /// Stop requested while not recording
    NotRecording,
    /// Recordings are only started in video mode
    NotVideoMode,
    /// No encoder/muxer available to build a recorder sink
    EncoderNotAvailable(String),
    /// Recorder sink failed mid-recording
    Sink(String),
    /// Writing the finished file failed
    Save(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is not one of the enumerated choices
    InvalidChoice { setting: &'static str, value: String },
    /// Config file could not be read or parsed
    Load(String),
}

/// Errors raised while compositing a single frame
///
/// These never leave the render loop: the frame is skipped and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Frame buffer is smaller than its declared geometry
    TruncatedFrame { expected: usize, actual: usize },
    /// Frame has zero width or height
    EmptyFrame,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Acquisition(e) => write!(f, "Camera error: {}", e),
            AppError::Encode(e) => write!(f, "Photo error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::PermissionDenied => write!(f, "Camera permission denied"),
            AcquisitionError::NoMatchingDevice(facing) => {
                write!(f, "No {} camera found", facing)
            }
            AcquisitionError::Busy => write!(f, "Camera is busy"),
            AcquisitionError::Timeout => write!(f, "Camera did not deliver a frame in time"),
            AcquisitionError::Backend(msg) => write!(f, "Backend error: {}", msg),
            AcquisitionError::RecordingActive => write!(f, "Stop recording to change camera"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::EmptySurface => write!(f, "Nothing to capture yet"),
            EncodeError::NotPhotoMode => write!(f, "Switch to photo mode to take a photo"),
            EncodeError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            EncodeError::Save(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::NotRecording => write!(f, "No recording in progress"),
            RecordingError::NotVideoMode => write!(f, "Switch to video mode to record"),
            RecordingError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordingError::Sink(msg) => write!(f, "Recorder failed: {}", msg),
            RecordingError::Save(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidChoice { setting, value } => {
                write!(f, "Invalid value '{}' for {}", value, setting)
            }
            ConfigError::Load(msg) => write!(f, "Failed to load config: {}", msg),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TruncatedFrame { expected, actual } => write!(
                f,
                "Frame buffer too small: expected {} bytes, got {}",
                expected, actual
            ),
            RenderError::EmptyFrame => write!(f, "Frame has no pixels"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for AcquisitionError {}
impl std::error::Error for EncodeError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for RenderError {}

// Conversions from sub-errors to AppError
impl From<AcquisitionError> for AppError {
    fn from(err: AcquisitionError) -> Self {
        AppError::Acquisition(err)
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        AppError::Encode(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(err: image::ImageError) -> Self {
        EncodeError::Encoding(err.to_string())
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Save(err.to_string())
    }
}
