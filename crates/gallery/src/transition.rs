//! Two-slot transition state machine.
//!
//! A gallery is either idle, showing the image in its current slot, or
//! transitioning towards the image in its next slot while a tween drives
//! `progress` from 0 to 1. At most one transition is ever in flight: change
//! requests that arrive meanwhile are dropped rather than queued. When the
//! tween finishes the next image is promoted into the current slot, the next
//! slot is reset to its placeholder, and progress returns to 0.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::Bitmap;
use crate::slots::{Slot, TextureSlots};
use crate::tween::{Easing, Tween};

/// Rotation sign applied by direction-aware effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// Maps any negative value to `Backward` and everything else to `Forward`.
    pub fn from_sign(sign: i8) -> Self {
        if sign < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Tween parameters for animated changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1200),
            easing: Easing::EaseInOutCubic,
        }
    }
}

/// Options attached to an image change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeRequest {
    pub direction: Option<Direction>,
    pub skip_animation: bool,
}

impl ChangeRequest {
    pub fn animated(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            skip_animation: false,
        }
    }

    pub fn immediate() -> Self {
        Self {
            direction: None,
            skip_animation: true,
        }
    }
}

/// What a change request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// First image of an empty gallery; shown without animation.
    Initialized,
    /// `skip_animation` swap straight into the current slot.
    Swapped,
    /// An animated transition began.
    Started,
    /// The image is already the current one.
    SameImage,
    /// Another transition was in flight.
    Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
}

pub struct TransitionState {
    config: TransitionConfig,
    current: Option<Arc<Bitmap>>,
    next: Option<Arc<Bitmap>>,
    tween: Option<Tween>,
    progress: f32,
    direction: Direction,
    initialized: bool,
}

impl TransitionState {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            current: None,
            next: None,
            tween: None,
            progress: 0.0,
            direction: Direction::Forward,
            initialized: false,
        }
    }

    pub fn config(&self) -> TransitionConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        if self.tween.is_some() {
            Phase::Transitioning
        } else {
            Phase::Idle
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn current(&self) -> Option<&Arc<Bitmap>> {
        self.current.as_ref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current.as_deref().map(Bitmap::url)
    }

    pub fn next(&self) -> Option<&Arc<Bitmap>> {
        self.next.as_ref()
    }

    pub fn request(
        &mut self,
        bitmap: Arc<Bitmap>,
        request: ChangeRequest,
        now: Instant,
        slots: &mut dyn TextureSlots,
    ) -> ChangeOutcome {
        if self.current.is_none() {
            slots.upload(Slot::Current, &bitmap);
            debug!(url = %bitmap.url(), "first image shown");
            self.current = Some(bitmap);
            self.initialized = true;
            return ChangeOutcome::Initialized;
        }

        if self.current_url() == Some(bitmap.url()) {
            debug!(url = %bitmap.url(), "image already current; ignoring change");
            return ChangeOutcome::SameImage;
        }

        if self.is_transitioning() {
            debug!(
                url = %bitmap.url(),
                progress = self.progress,
                "transition in flight; dropping image change"
            );
            return ChangeOutcome::Dropped;
        }

        if request.skip_animation {
            slots.upload(Slot::Current, &bitmap);
            debug!(url = %bitmap.url(), "image swapped without animation");
            self.current = Some(bitmap);
            self.progress = 0.0;
            return ChangeOutcome::Swapped;
        }

        slots.upload(Slot::Next, &bitmap);
        self.direction = request.direction.unwrap_or_default();
        self.progress = 0.0;
        self.tween = Some(Tween::new(
            0.0,
            1.0,
            self.config.duration,
            self.config.easing,
            now,
        ));
        debug!(
            url = %bitmap.url(),
            direction = self.direction.sign(),
            duration_ms = self.config.duration.as_millis() as u64,
            "transition started"
        );
        self.next = Some(bitmap);
        ChangeOutcome::Started
    }

    /// Steps the tween; returns `true` on the frame the transition completes.
    pub fn advance(&mut self, now: Instant, slots: &mut dyn TextureSlots) -> bool {
        let Some(tween) = self.tween.as_ref() else {
            return false;
        };
        let (value, finished) = tween.sample(now);
        self.progress = self.progress.max(value.clamp(0.0, 1.0));
        if !finished {
            return false;
        }

        self.tween = None;
        if let Some(next) = self.next.take() {
            slots.upload(Slot::Current, &next);
            debug!(url = %next.url(), "transition complete");
            self.current = Some(next);
        }
        slots.reset_to_placeholder(Slot::Next);
        self.progress = 0.0;
        true
    }

    /// Shows `bitmap` immediately, bypassing every check.
    ///
    /// Used when an externally driven sequence hands control back to the
    /// state machine.
    pub fn reset_to(&mut self, bitmap: Arc<Bitmap>, slots: &mut dyn TextureSlots) {
        slots.upload(Slot::Current, &bitmap);
        slots.reset_to_placeholder(Slot::Next);
        self.current = Some(bitmap);
        self.next = None;
        self.tween = None;
        self.progress = 0.0;
        self.initialized = true;
    }
}
