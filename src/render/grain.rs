// SPDX-License-Identifier: GPL-3.0-only

//! Film grain overlay
//!
//! Scatters `floor(w * h * density)` single-pixel translucent marks at uniform
//! random positions. The result is random by nature; only the mark count and
//! the linear cost in `resolution * density` are fixed. [`grain::DENSITY`]
//! trades texture against per-frame cost.
//!
//! [`grain::DENSITY`]: crate::constants::grain::DENSITY

use super::composite::Surface;
use crate::constants::grain;
use rand::Rng;

/// Number of marks for a surface of `width * height` pixels
pub fn mark_count(width: u32, height: u32, density: f32) -> usize {
    if density.is_nan() || density <= 0.0 {
        return 0;
    }
    (width as f32 * height as f32 * density).floor() as usize
}

/// Scatter grain over the surface; returns the number of marks drawn
pub fn apply_grain<R: Rng>(surface: &mut Surface, density: f32, rng: &mut R) -> usize {
    if surface.is_empty() {
        return 0;
    }
    let (width, height) = (surface.width(), surface.height());
    let count = mark_count(width, height, density);
    let alpha = u16::from(grain::MARK_ALPHA);
    let image = surface.image_mut();

    for _ in 0..count {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        let tone: u16 = if rng.random_bool(0.5) { 255 } else { 0 };
        let pixel = image.get_pixel_mut(x, y);
        for channel in pixel.0.iter_mut().take(3) {
            *channel = ((u16::from(*channel) * (255 - alpha) + tone * alpha) / 255) as u8;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FilterType;
    use crate::backends::camera::CameraFrame;
    use crate::render::composite::draw_frame;
    use crate::render::transform::{compute_crop, compute_filter};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_mark_count_is_linear() {
        assert_eq!(mark_count(100, 100, 0.02), 200);
        assert_eq!(mark_count(200, 100, 0.02), 400);
        assert_eq!(mark_count(100, 100, 0.0), 0);
        assert_eq!(mark_count(0, 100, 0.5), 0);
    }

    #[test]
    fn test_grain_marks_surface() {
        let frame = CameraFrame::from_rgba(32, 32, vec![128; 32 * 32 * 4]);
        let mut surface = Surface::new();
        let params = compute_filter(0.0, FilterType::Film);
        draw_frame(&mut surface, &frame, compute_crop(32, 32, 1.0), &params, false).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let drawn = apply_grain(&mut surface, 0.05, &mut rng);

        assert_eq!(drawn, 51);
        let changed = surface
            .image()
            .pixels()
            .filter(|p| p.0[0] != 128)
            .count();
        assert!(changed > 0 && changed <= drawn);
        // Alpha channel is never touched
        assert!(surface.image().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_empty_surface_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(apply_grain(&mut Surface::new(), 0.5, &mut rng), 0);
    }
}
