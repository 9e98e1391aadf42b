// SPDX-License-Identifier: GPL-3.0-only

//! Zoom crop and filter parameter math
//!
//! Everything here is pure and deterministic.

use crate::app::FilterType;
use crate::constants::{render, zoom};

/// Clamp a zoom value into `[1, max_zoom]`
///
/// NaN maps to 1. Idempotent: `clamp_zoom(clamp_zoom(v, m), m) == clamp_zoom(v, m)`.
pub fn clamp_zoom(value: f32, max_zoom: f32) -> f32 {
    let upper = if max_zoom.is_nan() {
        zoom::MIN
    } else {
        max_zoom.max(zoom::MIN)
    };
    if value.is_nan() {
        return zoom::MIN;
    }
    value.clamp(zoom::MIN, upper)
}

/// Source rectangle sampled for one output frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub sx: f32,
    pub sy: f32,
    pub sw: f32,
    pub sh: f32,
}

/// Centered crop of size `source / zoom`
///
/// Zoom below 1 would sample outside the source and is clamped to 1.
pub fn compute_crop(source_width: u32, source_height: u32, zoom: f32) -> CropRect {
    let zoom = if zoom.is_nan() {
        zoom::MIN
    } else {
        zoom.max(zoom::MIN)
    };
    let w = source_width as f32;
    let h = source_height as f32;
    let sw = w / zoom;
    let sh = h / zoom;
    CropRect {
        sx: (w - sw) / 2.0,
        sy: (h - sh) / 2.0,
        sw,
        sh,
    }
}

/// Per-frame colour adjustments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub grain: bool,
}

impl FilterParams {
    /// Whether the colour pass can be skipped entirely
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.saturation == 1.0
    }
}

/// Filter parameters for an exposure value and a filter selection
pub fn compute_filter(exposure: f32, filter: FilterType) -> FilterParams {
    let (contrast, saturation) = match filter {
        FilterType::Cinema => (render::CINEMA_CONTRAST, 1.0),
        FilterType::Mono => (1.0, 0.0),
        FilterType::Vivid => (1.0, render::VIVID_SATURATION),
        FilterType::Original | FilterType::Film => (1.0, 1.0),
    };

    FilterParams {
        brightness: 1.0 + exposure * render::EXPOSURE_SENSITIVITY,
        contrast,
        saturation,
        grain: filter == FilterType::Film,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame_at_zoom_one() {
        let crop = compute_crop(1920, 1080, 1.0);
        assert_eq!(
            crop,
            CropRect {
                sx: 0.0,
                sy: 0.0,
                sw: 1920.0,
                sh: 1080.0
            }
        );
    }

    #[test]
    fn test_crop_is_centered() {
        let crop = compute_crop(1000, 500, 4.0);
        assert_eq!(crop.sw, 250.0);
        assert_eq!(crop.sh, 125.0);
        assert_eq!(crop.sx, 375.0);
        assert_eq!(crop.sy, 187.5);
    }

    #[test]
    fn test_crop_rejects_zoom_below_one() {
        assert_eq!(compute_crop(640, 480, 0.5), compute_crop(640, 480, 1.0));
    }

    #[test]
    fn test_clamp_zoom_bounds() {
        assert_eq!(clamp_zoom(-3.0, 5.0), 1.0);
        assert_eq!(clamp_zoom(2.5, 5.0), 2.5);
        assert_eq!(clamp_zoom(f32::INFINITY, 5.0), 5.0);
        assert_eq!(clamp_zoom(f32::NAN, 5.0), 1.0);
    }

    #[test]
    fn test_filter_table() {
        let cinema = compute_filter(0.0, FilterType::Cinema);
        assert_eq!(cinema.contrast, 1.15);
        assert!(!cinema.grain);

        assert_eq!(compute_filter(0.0, FilterType::Mono).saturation, 0.0);
        assert_eq!(compute_filter(0.0, FilterType::Vivid).saturation, 1.3);
        assert!(compute_filter(0.0, FilterType::Film).grain);
        assert!(compute_filter(0.0, FilterType::Original).is_identity());
    }

    #[test]
    fn test_exposure_scales_brightness() {
        assert_eq!(compute_filter(1.0, FilterType::Original).brightness, 1.5);
        assert_eq!(compute_filter(-1.0, FilterType::Original).brightness, 0.5);
    }
}
