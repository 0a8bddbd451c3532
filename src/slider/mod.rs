//! The banner slider: an auto-advancing, infinitely looping carousel.
//!
//! # Submodules
//!
//! - [`selection`]: which articles the banner features
//! - [`engine`]: the slider state machine
//! - [`gesture`]: click / swipe / snap-back classification of pointer presses
//! - [`host`]: a virtual-clock host that drives the engine from a script
//!
//! The engine owns no timers and touches no DOM. Each operation returns the
//! [`Effect`]s a host must apply (move the track, restart the autoplay timer,
//! follow a link), so the whole state machine runs under plain unit tests.

pub mod engine;
pub mod gesture;
pub mod host;
pub mod selection;

pub use engine::{Layout, Slider};
pub use host::{Script, SessionHost};
pub use selection::{select_slides, SlideLabel};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which way an advance moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// An instruction from the engine to whatever renders the slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Move the track. Animated moves end with a transition-end signal.
    SetTransform { offset_px: f64, animated: bool },
    /// Mark the pagination dot for this logical index as current.
    SetActiveDot { index: usize },
    /// (Re)start the repeating autoplay timer from zero.
    StartAutoplay { period: Duration },
    /// Cancel the autoplay timer.
    StopAutoplay,
    /// Leave the page for this link.
    Navigate { href: String },
    /// Remove every listener the slider registered.
    DetachListeners,
}
