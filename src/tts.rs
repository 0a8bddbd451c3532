//! Text-to-speech "Listen" buttons.
//!
//! Every article card and article page can carry a listen button, but only
//! one utterance plays at a time. [`TtsController`] owns that single
//! playback slot and the state of the button that started it; the platform
//! speech engine sits behind the [`SpeechSynth`] trait.

use crate::error::TtsError;
use crate::utils::collapse_whitespace;
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The platform speech engine.
pub trait SpeechSynth {
    fn speak(&mut self, text: &str) -> Result<(), TtsError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// State shown by one listen button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Button caption for this state.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Listen",
            PlaybackState::Playing => "Pause",
            PlaybackState::Paused => "Resume",
        }
    }
}

/// A button whose appearance must change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonUpdate {
    pub button: String,
    pub state: PlaybackState,
    pub label: &'static str,
}

impl ButtonUpdate {
    fn new(button: &str, state: PlaybackState) -> Self {
        Self {
            button: button.to_string(),
            state,
            label: state.label(),
        }
    }
}

/// A press that could not start narration.
///
/// `updates` still has to be applied: when the press interrupted another
/// button, that button has already been cancelled and must be drawn idle.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("{source}")]
pub struct ToggleRefused {
    pub updates: Vec<ButtonUpdate>,
    #[source]
    pub source: TtsError,
}

#[derive(Debug)]
struct Active {
    button: String,
    state: PlaybackState,
}

/// Owns the one playback slot of a page.
#[derive(Debug)]
pub struct TtsController<S> {
    synth: S,
    active: Option<Active>,
}

impl<S: SpeechSynth> TtsController<S> {
    pub fn new(synth: S) -> Self {
        Self {
            synth,
            active: None,
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    /// State of `button` as it should currently be drawn.
    pub fn state_of(&self, button: &str) -> PlaybackState {
        match &self.active {
            Some(active) if active.button == button => active.state,
            _ => PlaybackState::Idle,
        }
    }

    /// The user pressed `button`, which reads `text`.
    ///
    /// Pressing the playing button pauses it, pressing it again resumes.
    /// Pressing a different button stops the current utterance first.
    ///
    /// # Errors
    ///
    /// [`TtsError::NothingToRead`] for blank text, which leaves any current
    /// playback alone. A synth failure is reported after the previous
    /// button was cancelled, so its idle update travels with the error.
    /// The pressed button stays idle in both cases.
    pub fn toggle(&mut self, button: &str, text: &str) -> Result<Vec<ButtonUpdate>, ToggleRefused> {
        if let Some(active) = &mut self.active {
            if active.button == button {
                let next = match active.state {
                    PlaybackState::Playing => {
                        self.synth.pause();
                        PlaybackState::Paused
                    }
                    PlaybackState::Paused => {
                        self.synth.resume();
                        PlaybackState::Playing
                    }
                    PlaybackState::Idle => PlaybackState::Idle,
                };
                active.state = next;
                debug!(button, state = ?next, "Toggled playback");
                return Ok(vec![ButtonUpdate::new(button, next)]);
            }
        }

        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Err(ToggleRefused {
                updates: Vec::new(),
                source: TtsError::NothingToRead,
            });
        }

        let mut updates = self.reset();
        if let Err(e) = self.synth.speak(&text) {
            warn!(button, error = %e, "Speech synthesis refused utterance");
            return Err(ToggleRefused { updates, source: e });
        }
        info!(button, chars = text.len(), "Started narration");
        self.active = Some(Active {
            button: button.to_string(),
            state: PlaybackState::Playing,
        });
        updates.push(ButtonUpdate::new(button, PlaybackState::Playing));
        Ok(updates)
    }

    /// The utterance finished on its own.
    pub fn finished(&mut self) -> Vec<ButtonUpdate> {
        match self.active.take() {
            Some(active) => vec![ButtonUpdate::new(&active.button, PlaybackState::Idle)],
            None => Vec::new(),
        }
    }

    /// Stop whatever is playing (navigation, re-render, another button).
    pub fn reset(&mut self) -> Vec<ButtonUpdate> {
        match self.active.take() {
            Some(active) => {
                self.synth.cancel();
                debug!(button = %active.button, "Cancelled narration");
                vec![ButtonUpdate::new(&active.button, PlaybackState::Idle)]
            }
            None => Vec::new(),
        }
    }
}

/// Extract the readable text of an article page.
///
/// Prefers the `.article-body` element, then `<article>`, then the whole
/// `<body>`; scripts and styles are never read out.
pub fn readable_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let skip = Selector::parse("script, style, noscript").unwrap();
    let skipped: Vec<_> = document.select(&skip).map(|e| e.id()).collect();

    for css in [".article-body", "article", "body"] {
        let selector = Selector::parse(css).unwrap();
        if let Some(root) = document.select(&selector).next() {
            let text = root
                .descendants()
                .filter(|node| !node.ancestors().any(|a| skipped.contains(&a.id())))
                .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// A synth that records utterances instead of speaking them.
///
/// Used for dry runs. Setting `unavailable` makes it behave like a platform
/// without speech support; `max_chars` mimics engines that reject long
/// utterances.
#[derive(Debug, Default)]
pub struct TranscriptSynth {
    pub spoken: Vec<String>,
    pub paused: bool,
    pub cancelled: usize,
    pub unavailable: bool,
    pub max_chars: Option<usize>,
}

impl SpeechSynth for TranscriptSynth {
    fn speak(&mut self, text: &str) -> Result<(), TtsError> {
        if self.unavailable {
            return Err(TtsError::Unsupported);
        }
        if let Some(max) = self.max_chars {
            let chars = text.chars().count();
            if chars > max {
                return Err(TtsError::Synth(format!(
                    "utterance of {chars} characters exceeds limit of {max}"
                )));
            }
        }
        self.spoken.push(text.to_string());
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn cancel(&mut self) {
        self.cancelled += 1;
        self.paused = false;
    }
}
