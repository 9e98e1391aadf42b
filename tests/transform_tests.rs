// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the zoom crop and filter math

use lenscap::FilterType;
use lenscap::render::{CropRect, clamp_zoom, compute_crop, compute_filter};

fn zoom_inputs() -> Vec<f32> {
    let mut inputs = vec![
        f32::NEG_INFINITY,
        -3.0,
        0.0,
        0.5,
        0.999,
        1.0,
        1.0001,
        2.5,
        4.99,
        5.0,
        7.0,
        1e9,
        f32::INFINITY,
        f32::NAN,
    ];
    inputs.extend((0..100).map(|i| i as f32 * 0.137 - 2.0));
    inputs
}

#[test]
fn test_clamp_zoom_stays_in_range() {
    for max_zoom in [2.0, 3.0, 5.0, 10.0] {
        for v in zoom_inputs() {
            let z = clamp_zoom(v, max_zoom);
            assert!(
                (1.0..=max_zoom).contains(&z),
                "clamp_zoom({}, {}) = {}",
                v,
                max_zoom,
                z
            );
        }
    }
}

#[test]
fn test_clamp_zoom_is_idempotent() {
    for max_zoom in [2.0, 3.0, 5.0, 10.0] {
        for v in zoom_inputs() {
            let once = clamp_zoom(v, max_zoom);
            assert_eq!(clamp_zoom(once, max_zoom), once);
        }
    }
}

#[test]
fn test_crop_matches_centered_formula() {
    for (w, h) in [(1920u32, 1080u32), (1280, 720), (640, 480), (3, 7)] {
        for zoom in [1.0f32, 1.5, 2.0, 3.3, 10.0] {
            let crop = compute_crop(w, h, zoom);
            let (wf, hf) = (w as f32, h as f32);
            let eps = 1e-3;
            assert!((crop.sw - wf / zoom).abs() < eps);
            assert!((crop.sh - hf / zoom).abs() < eps);
            assert!((crop.sx - (wf - wf / zoom) / 2.0).abs() < eps);
            assert!((crop.sy - (hf - hf / zoom) / 2.0).abs() < eps);

            // Never samples outside the source
            assert!(crop.sx >= 0.0 && crop.sy >= 0.0);
            assert!(crop.sx + crop.sw <= wf + eps);
            assert!(crop.sy + crop.sh <= hf + eps);
        }
    }
}

#[test]
fn test_crop_at_zoom_one_is_full_frame() {
    assert_eq!(
        compute_crop(800, 600, 1.0),
        CropRect {
            sx: 0.0,
            sy: 0.0,
            sw: 800.0,
            sh: 600.0
        }
    );
}

#[test]
fn test_filter_is_pure() {
    for filter in FilterType::ALL {
        for exposure in [-1.0f32, -0.3, 0.0, 0.25, 1.0] {
            assert_eq!(
                compute_filter(exposure, filter),
                compute_filter(exposure, filter)
            );
        }
    }
}

#[test]
fn test_filter_constants() {
    let none = compute_filter(0.0, FilterType::Original);
    assert_eq!(
        (none.brightness, none.contrast, none.saturation, none.grain),
        (1.0, 1.0, 1.0, false)
    );

    assert_eq!(compute_filter(0.0, FilterType::Cinema).contrast, 1.15);
    assert_eq!(compute_filter(0.0, FilterType::Mono).saturation, 0.0);
    assert_eq!(compute_filter(0.0, FilterType::Vivid).saturation, 1.3);

    // Only film carries grain
    for filter in FilterType::ALL {
        assert_eq!(
            compute_filter(0.0, filter).grain,
            filter == FilterType::Film
        );
    }
}

#[test]
fn test_brightness_follows_exposure() {
    let dark = compute_filter(-1.0, FilterType::Original).brightness;
    let neutral = compute_filter(0.0, FilterType::Original).brightness;
    let bright = compute_filter(1.0, FilterType::Original).brightness;
    assert!(dark < neutral && neutral < bright);
    assert_eq!(neutral, 1.0);
}

#[test]
fn test_filter_names_round_trip() {
    let names: Vec<&str> = FilterType::ALL.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["none", "bw", "vivid", "cinema", "film"]);
    for filter in FilterType::ALL {
        assert_eq!(FilterType::from_name(filter.name()), Some(filter));
    }
}
