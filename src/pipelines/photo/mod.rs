// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! Surface → Snapshot → Encoding → Disk I/O
//!    ↓
//! Render loop continues uninterrupted
//! ```
//!
//! Only the snapshot happens on the caller's task. Encoding runs on the
//! blocking pool and the write is async.

pub mod capture;
pub mod encoding;

pub use capture::take_snapshot;
pub use encoding::{EncodedImage, PhotoEncoder};

use crate::config::{Config, PhotoFormat};
use crate::errors::EncodeError;
use crate::storage;
use image::RgbaImage;
use std::path::PathBuf;
use tracing::{error, info};

/// Encode-and-save stage for snapshots
#[derive(Debug, Clone)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
    output_dir: PathBuf,
}

impl PhotoPipeline {
    pub fn new(format: PhotoFormat, jpeg_quality: u8, output_dir: PathBuf) -> Self {
        Self {
            encoder: PhotoEncoder::new(format, jpeg_quality),
            output_dir,
        }
    }

    /// Pipeline for the current settings
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.save_format,
            config.jpeg_quality,
            storage::photo_dir(config),
        )
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Encode a snapshot and save it as `photo_<millis>.<ext>`
    pub async fn process(&self, snapshot: RgbaImage) -> Result<PathBuf, EncodeError> {
        let encoded = self.encoder.encode(snapshot).await?;
        let filename = storage::photo_filename(
            storage::timestamp_millis(),
            encoded.format.extension(),
        );

        let path = storage::write_output(&self.output_dir, &filename, &encoded.data)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to save photo"))?;

        info!(
            path = %path.display(),
            width = encoded.width,
            height = encoded.height,
            "Photo saved"
        );
        Ok(path)
    }
}
