// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the photo pipeline

use image::{Rgba, RgbaImage};
use lenscap::config::PhotoFormat;
use lenscap::errors::EncodeError;
use lenscap::pipelines::photo::{PhotoEncoder, PhotoPipeline, take_snapshot};
use lenscap::render::Surface;
use std::path::{Path, PathBuf};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lenscap-{}-{}", name, std::process::id()))
}

fn assert_photo_name(path: &Path, extension: &str) {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let digits = name
        .strip_prefix("photo_")
        .and_then(|rest| rest.strip_suffix(&format!(".{}", extension)))
        .unwrap_or_else(|| panic!("unexpected filename {}", name));
    assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_jpeg_photo_filename() {
    let dir = temp_dir("photo-jpeg");
    let pipeline = PhotoPipeline::new(PhotoFormat::Jpeg, 90, dir.clone());
    let snapshot = RgbaImage::from_pixel(16, 8, Rgba([200, 40, 40, 255]));

    let path = pipeline.process(snapshot).await.unwrap();
    assert_photo_name(&path, "jpeg");

    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_png_photo_is_lossless() {
    let dir = temp_dir("photo-png");
    let pipeline = PhotoPipeline::new(PhotoFormat::Png, 90, dir.clone());
    let snapshot = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));

    let path = pipeline.process(snapshot.clone()).await.unwrap();
    assert_photo_name(&path, "png");
    assert_eq!(image::open(&path).unwrap().to_rgba8(), snapshot);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_empty_surface_is_an_encode_error() {
    assert_eq!(
        take_snapshot(&Surface::new()).unwrap_err(),
        EncodeError::EmptySurface
    );
    let encoder = PhotoEncoder::new(PhotoFormat::Jpeg, 90);
    assert_eq!(
        encoder.encode_blocking(RgbaImage::new(0, 0)).unwrap_err(),
        EncodeError::EmptySurface
    );
}

#[tokio::test]
async fn test_unwritable_directory_is_a_save_error() {
    // A regular file where the directory should be
    let blocker = temp_dir("photo-blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let pipeline = PhotoPipeline::new(PhotoFormat::Png, 90, blocker.join("sub"));
    let err = pipeline
        .process(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])))
        .await
        .unwrap_err();
    assert!(matches!(err, EncodeError::Save(_)));

    std::fs::remove_file(&blocker).ok();
}
