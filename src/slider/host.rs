//! A virtual-clock host for the slider.
//!
//! The browser supplies two kinds of asynchronous signal to the banner: the
//! autoplay interval and the end of a CSS transition. [`SessionHost`] models
//! both on a virtual clock, applies the engine's [`Effect`]s the way a page
//! would, and replays a [`Script`] of timestamped user input. It is what the
//! `simulate` command runs and what the timing tests drive.

use super::engine::Slider;
use super::gesture::{PointerButton, Target};
use super::{Direction, Effect};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A recorded user session.
///
/// ```yaml
/// width: 800
/// until_ms: 20000
/// events:
///   - at_ms: 1000
///     input: { kind: pointer_down, x: 400, target: track }
///   - at_ms: 1100
///     input: { kind: pointer_up, x: 320 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Script {
    #[serde(default = "default_width")]
    pub width: f64,
    /// Keep the clock running until this time after the last event.
    #[serde(default)]
    pub until_ms: Option<u64>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

fn default_width() -> f64 {
    800.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptEvent {
    pub at_ms: u64,
    pub input: Input,
}

/// User input the page forwards to the slider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Input {
    PointerDown {
        x: f64,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        target: Target,
    },
    PointerMove {
        x: f64,
    },
    PointerUp {
        x: f64,
        #[serde(default)]
        target: Target,
    },
    PointerCancel,
    /// The pointer entered the banner container.
    PointerEnter,
    /// The pointer left the banner container.
    PointerLeave {
        #[serde(default)]
        x: f64,
    },
    Next,
    Prev,
    Dot {
        index: usize,
    },
    Resize {
        width: f64,
    },
    Destroy,
}

/// The slider's state after one step of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub at_ms: u64,
    pub cause: String,
    pub logical_index: usize,
    pub display_index: usize,
    pub offset_px: f64,
    pub phase: &'static str,
    pub autoplay: bool,
    pub effects: Vec<Effect>,
}

/// Outcome of replaying a script.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub frames: Vec<Frame>,
    pub navigated_to: Option<String>,
    pub final_logical_index: usize,
}

/// Drives a [`Slider`] on a virtual clock.
#[derive(Debug)]
pub struct SessionHost {
    slider: Slider,
    now: Duration,
    autoplay_period: Option<Duration>,
    autoplay_due: Option<Duration>,
    transition_due: Option<Duration>,
    navigated_to: Option<String>,
    detached: bool,
    frames: Vec<Frame>,
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

impl SessionHost {
    /// Take over a freshly mounted slider along with its mount effects.
    pub fn new(slider: Slider, mount_effects: Vec<Effect>) -> Self {
        let mut host = Self {
            slider,
            now: Duration::ZERO,
            autoplay_period: None,
            autoplay_due: None,
            transition_due: None,
            navigated_to: None,
            detached: false,
            frames: Vec::new(),
        };
        host.apply("mount", mount_effects);
        host
    }

    #[cfg(test)]
    pub fn slider(&self) -> &Slider {
        &self.slider
    }

    #[cfg(test)]
    pub fn navigated_to(&self) -> Option<&str> {
        self.navigated_to.as_deref()
    }

    /// When the autoplay timer will next fire, if it is armed.
    #[cfg(test)]
    pub fn autoplay_due(&self) -> Option<Duration> {
        self.autoplay_due
    }

    fn apply(&mut self, cause: &str, effects: Vec<Effect>) {
        for effect in &effects {
            match effect {
                Effect::SetTransform { animated: true, .. } => {
                    self.transition_due = Some(self.now + self.slider.transition_duration());
                }
                Effect::SetTransform { animated: false, .. } => {
                    // an instant move cancels any running transition
                    self.transition_due = None;
                }
                Effect::StartAutoplay { period } => {
                    self.autoplay_period = Some(*period);
                    self.autoplay_due = Some(self.now + *period);
                }
                Effect::StopAutoplay => {
                    self.autoplay_period = None;
                    self.autoplay_due = None;
                }
                Effect::Navigate { href } => {
                    self.navigated_to = Some(href.clone());
                    self.autoplay_due = None;
                    self.transition_due = None;
                }
                Effect::DetachListeners => {
                    self.detached = true;
                    self.autoplay_due = None;
                    self.transition_due = None;
                }
                Effect::SetActiveDot { .. } => {}
            }
        }
        self.frames.push(Frame {
            at_ms: millis(self.now),
            cause: cause.to_string(),
            logical_index: self.slider.logical_index(),
            display_index: self.slider.display_index(),
            offset_px: self.slider.offset(),
            phase: self.slider.phase().name(),
            autoplay: self.slider.is_autoplay_running(),
            effects,
        });
    }

    fn finished(&self) -> bool {
        self.navigated_to.is_some() || self.detached
    }

    /// Move the clock to `t`, firing every timer that falls due on the way.
    pub fn run_until(&mut self, t: Duration) {
        while !self.finished() {
            let due = match (self.transition_due, self.autoplay_due) {
                (Some(tr), Some(ap)) => tr.min(ap),
                (Some(tr), None) => tr,
                (None, Some(ap)) => ap,
                (None, None) => break,
            };
            if due > t {
                break;
            }
            self.now = due;
            if self.transition_due == Some(due) {
                self.transition_due = None;
                let effects = self.slider.transition_end();
                self.apply("transition_end", effects);
            } else {
                // repeating interval: re-arm before the tick runs
                self.autoplay_due = self.autoplay_period.map(|p| due + p);
                let effects = self.slider.autoplay_tick();
                self.apply("autoplay", effects);
            }
        }
        if t > self.now {
            self.now = t;
        }
    }

    /// Deliver one input at time `at`, after running any timers due before it.
    pub fn dispatch(&mut self, at: Duration, input: &Input) {
        self.run_until(at);
        if self.finished() {
            debug!(?input, "Session over; input dropped");
            return;
        }
        self.now = self.now.max(at);
        let now = self.now;
        let effects = match input {
            Input::PointerDown { x, button, target } => {
                self.slider.pointer_down(*x, now, *button, *target)
            }
            Input::PointerMove { x } => self.slider.pointer_move(*x),
            Input::PointerUp { x, target } => self.slider.pointer_up(*x, now, *target),
            Input::PointerCancel => self.slider.pointer_cancel(),
            Input::PointerEnter => self.slider.hover_enter(),
            Input::PointerLeave { x } => self.slider.pointer_leave(*x, now),
            Input::Next => self.slider.advance(Direction::Forward),
            Input::Prev => self.slider.advance(Direction::Backward),
            Input::Dot { index } => self.slider.go_to(*index),
            Input::Resize { width } => self.slider.resize(*width),
            Input::Destroy => self.slider.destroy(),
        };
        let cause = serde_json::to_value(input)
            .ok()
            .and_then(|v| v.get("kind").and_then(|k| k.as_str()).map(str::to_string))
            .unwrap_or_else(|| "input".to_string());
        self.apply(&cause, effects);
    }

    /// Replay a whole script, events in timestamp order.
    pub fn replay(mut self, script: &Script) -> Report {
        let mut events: Vec<&ScriptEvent> = script.events.iter().collect();
        events.sort_by_key(|e| e.at_ms);

        for event in events {
            self.dispatch(Duration::from_millis(event.at_ms), &event.input);
        }
        if let Some(until) = script.until_ms {
            self.run_until(Duration::from_millis(until));
        }

        info!(
            frames = self.frames.len(),
            width = self.slider.container_width(),
            navigated = self.navigated_to.is_some(),
            logical = self.slider.logical_index(),
            "Replayed slider session"
        );
        Report {
            final_logical_index: self.slider.logical_index(),
            navigated_to: self.navigated_to,
            frames: self.frames,
        }
    }
}
