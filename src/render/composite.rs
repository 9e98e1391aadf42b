// SPDX-License-Identifier: GPL-3.0-only

//! Compositing surface and the filtered draw
//!
//! The surface is the single RGBA image every visible frame is drawn onto.
//! Photo capture snapshots it and the recorder samples it, so whatever the
//! preview shows is exactly what gets saved.

use super::transform::{CropRect, FilterParams};
use crate::backends::camera::CameraFrame;
use crate::errors::RenderError;
use image::RgbaImage;

/// Rec. 709 luma weights, as used by CSS `saturate()`
const LUMA: [f32; 3] = [0.213, 0.715, 0.072];

/// Drawable RGBA surface, sized to the incoming frames
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// A zero-size surface; nothing has been drawn yet
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }

    /// Drop the contents, returning to the zero-size state
    pub fn clear(&mut self) {
        self.image = RgbaImage::new(0, 0);
    }

    fn ensure_size(&mut self, width: u32, height: u32) {
        if self.image.width() != width || self.image.height() != height {
            self.image = RgbaImage::new(width, height);
        }
    }
}

/// Brightness and contrast folded into one lookup table
fn tone_lut(params: &FilterParams) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let v = value as f32 / 255.0 * params.brightness;
        let v = (v - 0.5) * params.contrast + 0.5;
        *slot = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    lut
}

#[inline]
fn saturate(rgb: [u8; 3], saturation: f32) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let lum = LUMA[0] * r + LUMA[1] * g + LUMA[2] * b;
    [r, g, b].map(|c| (lum + saturation * (c - lum)).clamp(0.0, 255.0).round() as u8)
}

/// Draw the cropped, filtered frame onto the surface
///
/// The output keeps the source resolution: the crop rectangle is scaled up to
/// fill it with nearest-neighbour sampling. `mirror` flips horizontally.
pub fn draw_frame(
    surface: &mut Surface,
    frame: &CameraFrame,
    crop: CropRect,
    params: &FilterParams,
    mirror: bool,
) -> Result<(), RenderError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(RenderError::EmptyFrame);
    }
    let expected = frame.required_len();
    if frame.data.len() < expected || (frame.stride as usize) < frame.width as usize * 4 {
        return Err(RenderError::TruncatedFrame {
            expected,
            actual: frame.data.len(),
        });
    }

    let (width, height) = (frame.width, frame.height);
    surface.ensure_size(width, height);

    let scale_x = crop.sw / width as f32;
    let scale_y = crop.sh / height as f32;
    let max_x = width - 1;
    let max_y = height - 1;

    let lut = tone_lut(params);
    let identity = params.is_identity();
    let adjust_saturation = params.saturation != 1.0;

    let columns: Vec<u32> = (0..width)
        .map(|ox| {
            let dx = if mirror { max_x - ox } else { ox };
            ((crop.sx + (dx as f32 + 0.5) * scale_x) as u32).min(max_x)
        })
        .collect();

    for (oy, row) in surface.image.rows_mut().enumerate() {
        let src_y = ((crop.sy + (oy as f32 + 0.5) * scale_y) as u32).min(max_y);
        for (pixel, &src_x) in row.zip(columns.iter()) {
            let [r, g, b, _] = frame.pixel(src_x, src_y);
            let mut rgb = if identity {
                [r, g, b]
            } else {
                [lut[r as usize], lut[g as usize], lut[b as usize]]
            };
            if adjust_saturation {
                rgb = saturate(rgb, params.saturation);
            }
            pixel.0 = [rgb[0], rgb[1], rgb[2], 255];
        }
    }

    Ok(())
}
