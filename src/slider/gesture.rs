//! Pointer gesture tracking and the click / swipe / snap-back decision.
//!
//! A press-move-release on the banner can mean three things: follow the
//! slide's link, swipe to a neighbour, or nothing at all. The decision uses
//! only distance and time thresholds from [`SliderConfig`].

use super::Direction;
use crate::config::SliderConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which pointer button went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// What the pointer was over when a pointer event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A dot or an arrow; those handle navigation themselves.
    Control,
    /// The anchor of the slide at this display index.
    Slide(usize),
    /// Anywhere else on the track.
    #[default]
    Track,
}

/// An in-progress press on the track.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    start_x: f64,
    started_at: Duration,
    /// Track offset when the press began.
    base_offset: f64,
    dx: f64,
    dragged: bool,
}

/// Outcome of releasing a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Released over a control; the control's own handler navigates.
    Control,
    /// A quick, still press on a slide anchor.
    Click { display_index: usize },
    /// Far enough to move one slide.
    Swipe(Direction),
    /// Anything else returns to the current slide.
    SnapBack,
}

impl Gesture {
    pub fn begin(x: f64, at: Duration, base_offset: f64) -> Self {
        Self {
            start_x: x,
            started_at: at,
            base_offset,
            dx: 0.0,
            dragged: false,
        }
    }

    pub fn displacement(&self) -> f64 {
        self.dx
    }

    /// Whether the press has moved far enough to count as a drag.
    pub fn is_drag(&self) -> bool {
        self.dragged
    }

    /// Follow the pointer and return the track offset to show, 1:1 with the pointer.
    pub fn track(&mut self, x: f64, config: &SliderConfig) -> f64 {
        self.dx = x - self.start_x;
        if self.dx.abs() > config.drag_threshold_px {
            self.dragged = true;
        }
        self.base_offset + self.dx
    }

    /// Re-anchor the gesture after the container width changed mid-press.
    pub fn rebase(&mut self, base_offset: f64) {
        self.base_offset = base_offset;
    }

    /// Decide what releasing at `x` over `target` at time `at` means.
    pub fn release(&mut self, x: f64, at: Duration, target: Target, config: &SliderConfig) -> Release {
        self.track(x, config);

        if target == Target::Control {
            return Release::Control;
        }

        let elapsed = at.saturating_sub(self.started_at);
        if let Target::Slide(display_index) = target {
            if !self.dragged && elapsed < config.click_window() {
                return Release::Click { display_index };
            }
        }

        if self.dx.abs() >= config.swipe_threshold_px {
            // dragging left reveals the next slide
            let direction = if self.dx < 0.0 {
                Direction::Forward
            } else {
                Direction::Backward
            };
            return Release::Swipe(direction);
        }

        Release::SnapBack
    }
}
