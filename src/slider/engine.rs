//! The slider state machine.
//!
//! Slides live in an *effective list*: for two or more slides the last slide
//! is cloned in front and the first cloned behind, `[last, s0 .. sN-1, first]`.
//! Moving onto a clone animates normally; when that transition ends the
//! engine jumps, without animation, to the real slide the clone stands for.
//! Both show the same article at the same offset modulo the list, so the loop
//! never visibly jumps.
//!
//! Phases:
//!
//! ```text
//!            pointer_down                 pointer_up / cancel / leave
//!   Idle ─────────────────▶ Dragging ────────────────────────────────┐
//!    ▲                                                               │
//!    │ transition_end (seam correction)     advance / go_to / snap   ▼
//!    └──────────────────────────────────────────────────── Transitioning
//! ```

use super::gesture::{Gesture, PointerButton, Release, Target};
use super::selection::{SlideLabel, SlideSet};
use super::{Direction, Effect};
use crate::config::SliderConfig;
use crate::models::Article;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One node on the track.
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    pub article: Article,
    /// Boundary copy used only to make the loop seamless.
    pub is_clone: bool,
}

/// How the banner presents, fixed at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Nothing to show; the surrounding section is hidden.
    Hidden,
    /// One slide: no clones, controls, autoplay or gestures.
    Single,
    /// Two or more slides with boundary clones.
    Looping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Dragging(Gesture),
    /// An animated track move is in flight.
    Transitioning,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Dragging(_) => "dragging",
            Phase::Transitioning => "transitioning",
        }
    }
}

/// A mounted banner slider.
#[derive(Debug)]
pub struct Slider {
    config: SliderConfig,
    site_root: String,
    label: Option<SlideLabel>,
    layout: Layout,
    slides: Vec<Slide>,
    real_len: usize,
    logical: usize,
    display: usize,
    phase: Phase,
    width: f64,
    offset: f64,
    hovered: bool,
    autoplay_running: bool,
    mounted: bool,
}

fn sanitize_width(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 { width } else { 0.0 }
}

fn effective_list(articles: Vec<Article>) -> Vec<Slide> {
    let real = |article: Article| Slide {
        article,
        is_clone: false,
    };
    match (articles.first(), articles.last()) {
        (Some(first), Some(last)) if articles.len() > 1 => {
            let lead = Slide {
                article: last.clone(),
                is_clone: true,
            };
            let tail = Slide {
                article: first.clone(),
                is_clone: true,
            };
            std::iter::once(lead)
                .chain(articles.into_iter().map(real))
                .chain(std::iter::once(tail))
                .collect()
        }
        _ => articles.into_iter().map(real).collect(),
    }
}

impl Slider {
    /// Build the slider for `set` inside a container `container_width` px wide.
    ///
    /// Returns the slider and the effects that put it on screen: the initial
    /// track position, the first active dot, and the autoplay timer. `None`
    /// yields a hidden slider that ignores every event.
    pub fn mount(
        set: Option<SlideSet>,
        container_width: f64,
        config: SliderConfig,
        site_root: &str,
    ) -> (Self, Vec<Effect>) {
        let (label, articles) = match set {
            Some(set) => (Some(set.label), set.articles),
            None => (None, Vec::new()),
        };
        let real_len = articles.len();
        let layout = match real_len {
            0 => Layout::Hidden,
            1 => Layout::Single,
            _ => Layout::Looping,
        };

        let mut slider = Self {
            config,
            site_root: site_root.to_string(),
            label,
            layout,
            slides: effective_list(articles),
            real_len,
            logical: 0,
            display: 0,
            phase: Phase::Idle,
            width: sanitize_width(container_width),
            offset: 0.0,
            hovered: false,
            autoplay_running: false,
            mounted: true,
        };
        slider.display = slider.display_for(0);

        let mut effects = Vec::new();
        if layout != Layout::Hidden {
            effects.push(slider.position(false));
        }
        if layout == Layout::Looping {
            effects.push(Effect::SetActiveDot { index: 0 });
            effects.extend(slider.restart_autoplay());
        }
        info!(
            ?layout,
            slides = real_len,
            effective = slider.slides.len(),
            width = slider.width,
            "Mounted banner slider"
        );
        (slider, effects)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn label(&self) -> Option<SlideLabel> {
        self.label
    }

    /// The effective list, clones included, in track order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of real (uncloned) slides.
    pub fn len(&self) -> usize {
        self.real_len
    }

    pub fn logical_index(&self) -> usize {
        self.logical
    }

    pub fn display_index(&self) -> usize {
        self.display
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current horizontal track offset in px.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn container_width(&self) -> f64 {
        self.width
    }

    pub fn is_autoplay_running(&self) -> bool {
        self.autoplay_running
    }

    #[cfg(test)]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn transition_duration(&self) -> Duration {
        self.config.transition()
    }

    /// Whether the banner has more than one slide and therefore clones.
    pub fn needs_cloning(&self) -> bool {
        self.real_len > 1
    }

    /// The article currently centred in the container.
    #[cfg(test)]
    pub fn current_article(&self) -> Option<&Article> {
        self.slides.get(self.display).map(|s| &s.article)
    }

    /// Link of the slide at `display_index` in the effective list.
    pub fn href_at(&self, display_index: usize) -> Option<String> {
        self.slides
            .get(display_index)
            .map(|s| s.article.href(&self.site_root))
    }

    fn display_for(&self, logical: usize) -> usize {
        if self.needs_cloning() { logical + 1 } else { logical }
    }

    fn offset_for(&self, display: usize) -> f64 {
        -(display as f64) * self.width
    }

    /// Whether events should drive the state machine at all.
    fn interactive(&self) -> bool {
        self.mounted && self.layout == Layout::Looping
    }

    fn position(&mut self, animated: bool) -> Effect {
        self.offset = self.offset_for(self.display);
        Effect::SetTransform {
            offset_px: self.offset,
            animated,
        }
    }

    fn stop_autoplay(&mut self) -> Vec<Effect> {
        if !self.autoplay_running {
            return Vec::new();
        }
        self.autoplay_running = false;
        vec![Effect::StopAutoplay]
    }

    fn restart_autoplay(&mut self) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        let mut effects = self.stop_autoplay();
        self.autoplay_running = true;
        effects.push(Effect::StartAutoplay {
            period: self.config.autoplay_period(),
        });
        effects
    }

    /// Finish an in-flight transition: if it landed on a clone slot, jump to
    /// the real slot the clone mirrors.
    fn settle(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Transitioning {
            return Vec::new();
        }
        self.phase = Phase::Idle;

        let last = self.slides.len().saturating_sub(1);
        let real_slot = if !self.needs_cloning() {
            None
        } else if self.display == 0 {
            Some(last - 1)
        } else if self.display == last {
            Some(1)
        } else {
            None
        };

        match real_slot {
            Some(slot) => {
                debug!(from = self.display, to = slot, "Seam correction");
                self.display = slot;
                vec![self.position(false)]
            }
            None => Vec::new(),
        }
    }

    /// Move one slide in `direction` (the arrows, swipes and autoplay).
    pub fn advance(&mut self, direction: Direction) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        let mut effects = self.settle();
        if matches!(self.phase, Phase::Dragging(_)) {
            self.phase = Phase::Idle;
        }

        let n = self.real_len as isize;
        let step = direction.step();
        self.logical = (self.logical as isize + step + n).rem_euclid(n) as usize;
        self.display = (self.display as isize + step) as usize;
        self.phase = Phase::Transitioning;
        debug!(
            ?direction,
            logical = self.logical,
            display = self.display,
            "Advancing banner"
        );

        effects.push(self.position(true));
        effects.push(Effect::SetActiveDot {
            index: self.logical,
        });
        effects.extend(self.restart_autoplay());
        effects
    }

    /// Jump to the real slide `index` (a pagination dot).
    pub fn go_to(&mut self, index: usize) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        if index >= self.real_len {
            warn!(index, slides = self.real_len, "Ignoring dot for missing slide");
            return Vec::new();
        }
        let mut effects = self.settle();
        if matches!(self.phase, Phase::Dragging(_)) {
            self.phase = Phase::Idle;
        }

        self.logical = index;
        self.display = self.display_for(index);
        self.phase = Phase::Transitioning;
        debug!(logical = self.logical, display = self.display, "Jumping to slide");

        effects.push(self.position(true));
        effects.push(Effect::SetActiveDot { index });
        effects.extend(self.restart_autoplay());
        effects
    }

    /// The animated move finished; `Transitioning → Idle`.
    pub fn transition_end(&mut self) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        self.settle()
    }

    /// The autoplay timer fired.
    pub fn autoplay_tick(&mut self) -> Vec<Effect> {
        if !self.interactive() || !self.autoplay_running {
            return Vec::new();
        }
        if matches!(self.phase, Phase::Dragging(_)) {
            return Vec::new();
        }
        self.advance(Direction::Forward)
    }

    /// A pointer went down at `x` at time `at` since mount.
    pub fn pointer_down(
        &mut self,
        x: f64,
        at: Duration,
        button: PointerButton,
        target: Target,
    ) -> Vec<Effect> {
        if !self.interactive()
            || button != PointerButton::Primary
            || target == Target::Control
            || matches!(self.phase, Phase::Dragging(_))
        {
            return Vec::new();
        }

        let mut effects = self.settle();
        effects.extend(self.stop_autoplay());
        self.phase = Phase::Dragging(Gesture::begin(x, at, self.offset));
        effects.push(Effect::SetTransform {
            offset_px: self.offset,
            animated: false,
        });
        effects
    }

    /// The pointer moved while pressed; the track follows it.
    pub fn pointer_move(&mut self, x: f64) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        let Phase::Dragging(gesture) = &mut self.phase else {
            return Vec::new();
        };
        let offset = gesture.track(x, &self.config);
        self.offset = offset;
        vec![Effect::SetTransform {
            offset_px: offset,
            animated: false,
        }]
    }

    /// The pointer was released at `x` over `target`.
    pub fn pointer_up(&mut self, x: f64, at: Duration, target: Target) -> Vec<Effect> {
        if !self.interactive() {
            return Vec::new();
        }
        let mut gesture = match &self.phase {
            Phase::Dragging(g) => g.clone(),
            _ => return Vec::new(),
        };
        self.phase = Phase::Idle;

        match gesture.release(x, at, target, &self.config) {
            Release::Control => {
                let mut effects = vec![self.position(false)];
                effects.extend(self.restart_autoplay());
                effects
            }
            Release::Click { display_index } => match self.href_at(display_index) {
                Some(href) => {
                    info!(%href, display_index, "Banner slide clicked");
                    vec![self.position(false), Effect::Navigate { href }]
                }
                None => {
                    warn!(display_index, "Click on unknown slide; snapping back");
                    self.snap_back()
                }
            },
            Release::Swipe(direction) => {
                debug!(?direction, dx = gesture.displacement(), "Swipe");
                self.advance(direction)
            }
            Release::SnapBack => {
                debug!(
                    dx = gesture.displacement(),
                    dragged = gesture.is_drag(),
                    "Press released short of a swipe"
                );
                self.snap_back()
            }
        }
    }

    /// The browser cancelled the press; always return to the current slide.
    pub fn pointer_cancel(&mut self) -> Vec<Effect> {
        if !self.interactive() || !matches!(self.phase, Phase::Dragging(_)) {
            return Vec::new();
        }
        self.phase = Phase::Idle;
        self.snap_back()
    }

    /// The pointer left the container, ending any press and resuming autoplay.
    pub fn pointer_leave(&mut self, x: f64, at: Duration) -> Vec<Effect> {
        self.hovered = false;
        if !self.interactive() {
            return Vec::new();
        }
        if matches!(self.phase, Phase::Dragging(_)) {
            return self.pointer_up(x, at, Target::Track);
        }
        if self.autoplay_running {
            return Vec::new();
        }
        self.restart_autoplay()
    }

    /// The pointer entered the container; autoplay waits until it leaves.
    pub fn hover_enter(&mut self) -> Vec<Effect> {
        self.hovered = true;
        if !self.interactive() {
            return Vec::new();
        }
        self.stop_autoplay()
    }

    /// The container changed width; re-apply the position without animation.
    pub fn resize(&mut self, container_width: f64) -> Vec<Effect> {
        if !self.mounted || self.layout == Layout::Hidden {
            return Vec::new();
        }
        self.width = sanitize_width(container_width);
        let mut effects = self.settle();

        let base = self.offset_for(self.display);
        match &mut self.phase {
            Phase::Dragging(gesture) => {
                gesture.rebase(base);
                self.offset = base + gesture.displacement();
                effects.push(Effect::SetTransform {
                    offset_px: self.offset,
                    animated: false,
                });
            }
            _ => effects.push(self.position(false)),
        }
        effects
    }

    /// Tear the slider down before re-rendering or navigating away.
    ///
    /// Cancels the autoplay timer and detaches listeners; afterwards every
    /// operation is a no-op.
    pub fn destroy(&mut self) -> Vec<Effect> {
        if !self.mounted {
            return Vec::new();
        }
        let mut effects = self.stop_autoplay();
        self.mounted = false;
        self.phase = Phase::Idle;
        if self.layout != Layout::Hidden {
            effects.push(Effect::DetachListeners);
        }
        info!("Destroyed banner slider");
        effects
    }

    fn snap_back(&mut self) -> Vec<Effect> {
        self.phase = Phase::Transitioning;
        let mut effects = vec![self.position(true)];
        effects.extend(self.restart_autoplay());
        effects
    }
}
