// SPDX-License-Identifier: GPL-3.0-only

//! Application state types

use crate::constants::{exposure, zoom};
use crate::render::transform::clamp_zoom;
use serde::{Deserialize, Serialize};

/// Camera modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraMode {
    #[default]
    Photo,
    Video,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::Photo => CameraMode::Video,
            CameraMode::Video => CameraMode::Photo,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CameraMode::Photo => "PHOTO",
            CameraMode::Video => "VIDEO",
        }
    }
}

/// Filter types for the preview and everything captured from it
///
/// Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// No filter applied
    #[default]
    #[serde(rename = "none")]
    Original,
    /// Black & white
    #[serde(rename = "bw")]
    Mono,
    /// Boosted saturation
    #[serde(rename = "vivid")]
    Vivid,
    /// Raised contrast
    #[serde(rename = "cinema")]
    Cinema,
    /// Film grain overlay
    #[serde(rename = "film")]
    Film,
}

impl FilterType {
    /// All filters in selector order
    pub const ALL: [FilterType; 5] = [
        FilterType::Original,
        FilterType::Mono,
        FilterType::Vivid,
        FilterType::Cinema,
        FilterType::Film,
    ];

    /// Short identifier (`none`, `bw`, `vivid`, `cinema`, `film`)
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Original => "none",
            FilterType::Mono => "bw",
            FilterType::Vivid => "vivid",
            FilterType::Cinema => "cinema",
            FilterType::Film => "film",
        }
    }

    /// Label shown on the filter chip
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::Original => "ORIGINAL",
            FilterType::Mono => "B&W",
            FilterType::Vivid => "VIVID",
            FilterType::Cinema => "CINEMA",
            FilterType::Film => "FILM",
        }
    }

    /// Look a filter up by its short identifier
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Zoom, exposure and filter shared by the controls and the render loop
///
/// Fields are private: every setter clamps, so a stored value is always in
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f32,
    exposure: f32,
    filter: FilterType,
    max_zoom: f32,
}

impl ViewState {
    pub fn new(max_zoom: f32) -> Self {
        Self {
            zoom: zoom::MIN,
            exposure: 0.0,
            filter: FilterType::Original,
            max_zoom: max_zoom.max(zoom::MIN),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Set zoom, clamped to `[1, max_zoom]`; returns the stored value
    pub fn set_zoom(&mut self, value: f32) -> f32 {
        self.zoom = clamp_zoom(value, self.max_zoom);
        self.zoom
    }

    /// Change the upper zoom bound, re-clamping the current zoom
    pub fn set_max_zoom(&mut self, max_zoom: f32) {
        self.max_zoom = max_zoom.max(zoom::MIN);
        self.zoom = clamp_zoom(self.zoom, self.max_zoom);
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + zoom::STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - zoom::STEP)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = zoom::MIN;
    }

    /// Set exposure, clamped to the slider range
    pub fn set_exposure(&mut self, value: f32) -> f32 {
        self.exposure = if value.is_nan() {
            0.0
        } else {
            value.clamp(exposure::MIN, exposure::MAX)
        };
        self.exposure
    }

    pub fn exposure_up(&mut self) -> f32 {
        self.set_exposure(self.exposure + exposure::STEP)
    }

    pub fn exposure_down(&mut self) -> f32 {
        self.set_exposure(self.exposure - exposure::STEP)
    }

    pub fn reset_exposure(&mut self) {
        self.exposure = 0.0;
    }

    pub fn set_filter(&mut self, filter: FilterType) {
        self.filter = filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_never_stored_out_of_range() {
        let mut view = ViewState::new(3.0);
        assert_eq!(view.set_zoom(7.5), 3.0);
        assert_eq!(view.set_zoom(0.2), 1.0);
        assert_eq!(view.set_zoom(f32::NAN), 1.0);
    }

    #[test]
    fn test_lowering_max_zoom_reclamps() {
        let mut view = ViewState::new(10.0);
        view.set_zoom(8.0);
        view.set_max_zoom(2.0);
        assert_eq!(view.zoom(), 2.0);
    }

    #[test]
    fn test_exposure_steps_stop_at_bounds() {
        let mut view = ViewState::new(5.0);
        for _ in 0..30 {
            view.exposure_up();
        }
        assert_eq!(view.exposure(), exposure::MAX);
        view.reset_exposure();
        assert_eq!(view.exposure(), 0.0);
    }

    #[test]
    fn test_filter_cycle() {
        assert_eq!(FilterType::Film.next(), FilterType::Original);
        assert_eq!(FilterType::Original.prev(), FilterType::Film);
        assert_eq!(FilterType::from_name("bw"), Some(FilterType::Mono));
        assert_eq!(FilterType::from_name("sepia"), None);
    }
}
