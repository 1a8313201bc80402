use std::time::{Duration, Instant};

use crate::tween::{Easing, Tween};

/// Length of the sweep through every image.
pub const INTRO_SWEEP: Duration = Duration::from_millis(2500);
/// Length of the closing turn from the last image back to the first.
pub const INTRO_RETURN: Duration = Duration::from_millis(800);

/// Where the intro is on a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntroFrame {
    /// Image index for the current slot.
    pub current: usize,
    /// Image index for the next slot.
    pub next: usize,
    /// Fractional progress between the two, fed to the shader.
    pub transition: f32,
    /// Slot indices differ from the previous frame.
    pub indices_changed: bool,
    pub finished: bool,
}

/// Two-phase spin through `count` images.
///
/// The sequence parameter runs 0 to `count - 1` with a quadratic ease, then
/// to `count` with a cubic ease so the last image turns back into the first.
pub struct IntroTimeline {
    count: usize,
    sweep: Tween,
    closing: Option<Tween>,
    last_indices: Option<(usize, usize)>,
}

impl IntroTimeline {
    pub fn new(count: usize, now: Instant) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let last = (count - 1) as f32;
        Some(Self {
            count,
            sweep: Tween::new(0.0, last, INTRO_SWEEP, Easing::EaseInOut, now),
            closing: None,
            last_indices: None,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sample(&mut self, now: Instant) -> IntroFrame {
        let (value, finished) = match self.closing.as_ref() {
            Some(closing) => closing.sample(now),
            None => {
                let (value, swept) = self.sweep.sample(now);
                if swept {
                    let closing = Tween::new(
                        value,
                        self.count as f32,
                        INTRO_RETURN,
                        Easing::EaseInOutCubic,
                        self.sweep.end(),
                    );
                    let sampled = closing.sample(now);
                    self.closing = Some(closing);
                    sampled
                } else {
                    (value, false)
                }
            }
        };

        let whole = value.floor();
        let base = whole.max(0.0) as usize;
        let current = base % self.count;
        let next = (base + 1) % self.count;
        let indices_changed = self.last_indices != Some((current, next));
        self.last_indices = Some((current, next));

        IntroFrame {
            current,
            next,
            transition: if finished { 0.0 } else { value - whole },
            indices_changed,
            finished,
        }
    }

    pub fn end(&self) -> Instant {
        self.sweep.end() + INTRO_RETURN
    }
}
