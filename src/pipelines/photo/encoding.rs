// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! - PNG (lossless, keeps the surface's RGBA)
//! - JPEG (quality-controlled, alpha dropped)
//!
//! Encoding is CPU-bound and runs on the blocking pool.

use crate::config::PhotoFormat;
use crate::errors::EncodeError;
use image::RgbaImage;
use tracing::{debug, info};

/// Encoded image data ready for saving
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: PhotoFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    format: PhotoFormat,
    jpeg_quality: u8,
}

impl PhotoEncoder {
    pub fn new(format: PhotoFormat, jpeg_quality: u8) -> Self {
        Self {
            format,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    /// Encode a surface snapshot in the background
    pub async fn encode(&self, image: RgbaImage) -> Result<EncodedImage, EncodeError> {
        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode_blocking(image))
            .await
            .map_err(|e| EncodeError::Encoding(format!("Encoding task error: {}", e)))?
    }

    /// Encode on the current thread
    ///
    /// # Errors
    /// * `EncodeError::EmptySurface` - zero width or height
    /// * `EncodeError::Encoding` - the codec rejected the pixels
    pub fn encode_blocking(&self, image: RgbaImage) -> Result<EncodedImage, EncodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EncodeError::EmptySurface);
        }

        info!(width, height, format = self.format.extension(), "Encoding photo");

        let data = match self.format {
            PhotoFormat::Jpeg => Self::encode_jpeg(&image, self.jpeg_quality)?,
            PhotoFormat::Png => Self::encode_png(&image)?,
        };

        debug!(size = data.len(), "Encoding complete");

        Ok(EncodedImage {
            data,
            format: self.format,
            width,
            height,
        })
    }

    fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(buffer)
    }

    fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = Vec::new();
        image.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_surface() {
        let encoder = PhotoEncoder::new(PhotoFormat::Png, 92);
        assert_eq!(
            encoder.encode_blocking(RgbaImage::new(0, 0)).unwrap_err(),
            EncodeError::EmptySurface
        );
    }

    #[test]
    fn test_png_signature() {
        let encoder = PhotoEncoder::new(PhotoFormat::Png, 92);
        let encoded = encoder.encode_blocking(RgbaImage::new(4, 4)).unwrap();
        assert_eq!(&encoded.data[..4], b"\x89PNG");
    }

    #[test]
    fn test_jpeg_signature() {
        let encoder = PhotoEncoder::new(PhotoFormat::Jpeg, 80);
        let encoded = encoder.encode_blocking(RgbaImage::new(8, 8)).unwrap();
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (8, 8));
    }
}
