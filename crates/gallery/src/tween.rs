//! Time-based interpolation of a scalar with an easing curve.

use std::time::{Duration, Instant};

/// Easing curves available to tweens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Smoothstep,
    /// Quadratic ease-in-out.
    EaseInOut,
    /// Cubic ease-in-out, the default for image transitions.
    #[default]
    EaseInOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => clamped,
            Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            Easing::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
            Easing::EaseInOutCubic => {
                if clamped < 0.5 {
                    4.0 * clamped * clamped * clamped
                } else {
                    let inv = -2.0 * clamped + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Wall-clock interpolation of a scalar from `from` to `to`.
#[derive(Clone, Copy, Debug)]
pub struct Tween {
    start: Instant,
    duration: Duration,
    from: f32,
    to: f32,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration, easing: Easing, now: Instant) -> Self {
        Self {
            start: now,
            duration,
            from,
            to,
            easing,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the eased value at `now` and whether the tween has finished.
    ///
    /// A zero duration finishes immediately at `to`.
    pub fn sample(&self, now: Instant) -> (f32, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let elapsed = now.saturating_duration_since(self.start);
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        if t >= 1.0 {
            return (self.to, true);
        }
        let eased = self.easing.sample(t);
        (self.from + (self.to - self.from) * eased, false)
    }

    pub fn end(&self) -> Instant {
        self.start + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::Smoothstep,
        Easing::EaseInOut,
        Easing::EaseInOutCubic,
    ];

    #[test]
    fn every_curve_is_monotonic_and_pinned() {
        for easing in ALL {
            let mut last = 0.0;
            for step in 0..=100 {
                let sample = easing.sample(step as f32 / 100.0);
                assert!(sample >= last - 1e-6, "{easing:?} went backwards");
                last = sample;
            }
            assert!(easing.sample(0.0).abs() < 1e-6);
            assert!((easing.sample(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cubic_is_slower_at_the_edges_than_quadratic() {
        assert!(Easing::EaseInOutCubic.sample(0.2) < Easing::EaseInOut.sample(0.2));
        assert!((Easing::EaseInOutCubic.sample(0.5) - 0.5).abs() < 1e-6);
        assert!(Easing::EaseInOutCubic.sample(0.8) > Easing::EaseInOut.sample(0.8));
    }

    #[test]
    fn tween_reports_progress_and_completion() {
        let start = Instant::now();
        let tween = Tween::new(0.0, 1.0, Duration::from_millis(100), Easing::Linear, start);
        let (value, finished) = tween.sample(start + Duration::from_millis(50));
        assert!((value - 0.5).abs() < 0.05);
        assert!(!finished);
        let (value, finished) = tween.sample(start + Duration::from_millis(150));
        assert_eq!(value, 1.0);
        assert!(finished);
    }

    #[test]
    fn tween_interpolates_arbitrary_ranges() {
        let start = Instant::now();
        let tween = Tween::new(2.0, 4.0, Duration::from_secs(1), Easing::Linear, start);
        let (value, _) = tween.sample(start + Duration::from_millis(250));
        assert!((value - 2.5).abs() < 0.01);
        assert_eq!(tween.end(), start + Duration::from_secs(1));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let now = Instant::now();
        let tween = Tween::new(0.0, 3.0, Duration::ZERO, Easing::default(), now);
        assert_eq!(tween.sample(now), (3.0, true));
    }
}
