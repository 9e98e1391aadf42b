// SPDX-License-Identifier: GPL-3.0-only

//! Input controllers: pinch-to-zoom and the focus indicator

use super::ViewState;
use crate::constants::{focus, zoom};
use crate::render::clamp_zoom;
use std::collections::HashMap;
use tokio::time::Instant;

/// A point in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Zoom from a two-finger gesture
///
/// `zoom_at_start * (current / start)`, clamped to `[1, max_zoom]`. Gestures
/// that start with the fingers (almost) together give `None`.
pub fn pinch_zoom(
    zoom_at_start: f32,
    start_distance: f32,
    current_distance: f32,
    max_zoom: f32,
) -> Option<f32> {
    if start_distance.is_nan() || start_distance <= zoom::MIN_PINCH_DISTANCE {
        return None;
    }
    Some(clamp_zoom(
        zoom_at_start * (current_distance / start_distance),
        max_zoom,
    ))
}

/// Tracks up to two touch points and turns their spread into zoom updates
#[derive(Debug, Default)]
pub struct PinchGesture {
    fingers: HashMap<u64, Point>,
    initial_distance: Option<f32>,
    zoom_at_pinch_start: f32,
}

impl PinchGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.initial_distance.is_some()
    }

    fn spread(&self) -> Option<f32> {
        let mut points = self.fingers.values();
        match (points.next(), points.next()) {
            (Some(a), Some(b)) => Some(a.distance(b)),
            _ => None,
        }
    }

    /// A finger touched down; the second finger starts the gesture
    pub fn finger_pressed(&mut self, id: u64, position: Point, view: &ViewState) {
        if self.fingers.len() >= 2 && !self.fingers.contains_key(&id) {
            return;
        }
        self.fingers.insert(id, position);
        if self.fingers.len() == 2 {
            self.initial_distance = self.spread();
            self.zoom_at_pinch_start = view.zoom();
        }
    }

    /// A tracked finger moved; applies and returns the new zoom
    pub fn finger_moved(&mut self, id: u64, position: Point, view: &mut ViewState) -> Option<f32> {
        let slot = self.fingers.get_mut(&id)?;
        *slot = position;

        let initial = self.initial_distance?;
        let current = self.spread()?;
        let zoom = pinch_zoom(self.zoom_at_pinch_start, initial, current, view.max_zoom())?;
        Some(view.set_zoom(zoom))
    }

    /// A finger lifted or was lost; ends the gesture
    pub fn finger_lifted(&mut self, id: u64) {
        if self.fingers.remove(&id).is_some() {
            self.initial_distance = None;
        }
    }
}

/// Visible phase of the focus indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPhase {
    Hidden,
    Visible { at: Point },
    /// `opacity` falls from 1 to 0 across the fade
    Fading { at: Point, opacity: f32 },
}

/// Tap-to-focus ring
///
/// Purely visual: a tap shows a ring at the tap position which fades out.
/// The camera's focus is not touched.
#[derive(Debug, Default, Clone)]
pub struct FocusIndicator {
    tap: Option<(Point, Instant)>,
}

impl FocusIndicator {
    pub fn tap(&mut self, at: Point, now: Instant) {
        self.tap = Some((at, now));
    }

    pub fn phase(&self, now: Instant) -> FocusPhase {
        let Some((at, tapped)) = self.tap else {
            return FocusPhase::Hidden;
        };
        let elapsed = now.saturating_duration_since(tapped);
        if elapsed < focus::VISIBLE {
            FocusPhase::Visible { at }
        } else if elapsed < focus::VISIBLE + focus::FADE {
            let into_fade = (elapsed - focus::VISIBLE).as_secs_f32();
            FocusPhase::Fading {
                at,
                opacity: 1.0 - into_fade / focus::FADE.as_secs_f32(),
            }
        } else {
            FocusPhase::Hidden
        }
    }
}
