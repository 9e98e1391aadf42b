// SPDX-License-Identifier: GPL-3.0-only

//! Save locations and output filenames
//!
//! Photos are written as `photo_<unix millis>.<ext>` and recordings as
//! `video_<unix millis>.webm`. Nothing else is persisted.

use crate::config::Config;
use crate::constants::capture;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Folder created under the user's Pictures/Videos directories
pub const DEFAULT_SAVE_FOLDER: &str = "Lenscap";

fn fallback_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Directory photos are saved into
pub fn photo_dir(config: &Config) -> PathBuf {
    config.save_dir.clone().unwrap_or_else(|| {
        dirs::picture_dir()
            .unwrap_or_else(fallback_dir)
            .join(DEFAULT_SAVE_FOLDER)
    })
}

/// Directory recordings are saved into
pub fn video_dir(config: &Config) -> PathBuf {
    config.save_dir.clone().unwrap_or_else(|| {
        dirs::video_dir()
            .unwrap_or_else(fallback_dir)
            .join(DEFAULT_SAVE_FOLDER)
    })
}

/// Current wall-clock time in Unix milliseconds
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn photo_filename(timestamp_ms: i64, extension: &str) -> String {
    format!("photo_{}.{}", timestamp_ms, extension)
}

pub fn video_filename(timestamp_ms: i64) -> String {
    format!("video_{}.{}", timestamp_ms, capture::VIDEO_EXTENSION)
}

/// Write `data` to `dir/filename`, creating `dir` if needed
pub async fn write_output(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    debug!(path = %path.display(), bytes = data.len(), "Writing output file");
    tokio::fs::write(&path, data).await?;
    info!(path = %path.display(), "Saved");
    Ok(path)
}
