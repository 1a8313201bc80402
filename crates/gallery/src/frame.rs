use std::time::{Duration, Instant};

use tracing::debug;

/// Timing handed to the renderer for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Seconds since the loop was started.
    pub elapsed: f32,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// New surface size when it changed since the last tick.
    pub resized: Option<(u32, u32)>,
    pub frame: u64,
}

/// Explicit start/stop frame scheduler driven by the host's redraw callback.
///
/// The loop does not pace itself: every host callback while running yields a
/// tick. It starts when the first image is shown and stops on teardown.
pub struct FrameLoop {
    running: bool,
    started_at: Option<Instant>,
    last_tick: Option<Instant>,
    last_size: Option<(u32, u32)>,
    frame: u64,
    last_stats: Option<Instant>,
    frames_since_stats: u32,
    frames_per_second: f32,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            running: false,
            started_at: None,
            last_tick: None,
            last_size: None,
            frame: 0,
            last_stats: None,
            frames_since_stats: 0,
            frames_per_second: 0.0,
        }
    }

    /// Starts the loop; the time origin is kept if it already ran once.
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.started_at.get_or_insert(now);
        self.last_tick = Some(now);
        self.last_stats = Some(now);
        debug!("frame loop started");
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            debug!(frames = self.frame, "frame loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }

    /// Produces the next tick, or `None` while stopped.
    pub fn tick(&mut self, now: Instant, size: (u32, u32)) -> Option<FrameTick> {
        if !self.running {
            return None;
        }
        let started_at = *self.started_at.get_or_insert(now);
        let delta = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        let resized = if self.last_size != Some(size) {
            self.last_size = Some(size);
            Some(size)
        } else {
            None
        };

        self.frame += 1;
        self.frames_since_stats += 1;
        let last_stats = *self.last_stats.get_or_insert(now);
        let since_stats = now.saturating_duration_since(last_stats);
        if since_stats >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_stats as f32 / since_stats.as_secs_f32();
            self.frames_since_stats = 0;
            self.last_stats = Some(now);
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame,
                "render stats"
            );
        }

        Some(FrameTick {
            elapsed: now.saturating_duration_since(started_at).as_secs_f32(),
            delta,
            resized,
            frame: self.frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_loop_yields_nothing() {
        let mut frames = FrameLoop::new();
        assert!(frames.tick(Instant::now(), (10, 10)).is_none());
    }

    #[test]
    fn reports_elapsed_and_resizes() {
        let start = Instant::now();
        let mut frames = FrameLoop::new();
        frames.start(start);

        let first = frames.tick(start, (800, 600)).unwrap();
        assert_eq!(first.resized, Some((800, 600)));
        assert_eq!(first.frame, 1);

        let second = frames
            .tick(start + Duration::from_millis(16), (800, 600))
            .unwrap();
        assert_eq!(second.resized, None);
        assert!((second.delta - 0.016).abs() < 1e-3);

        let third = frames
            .tick(start + Duration::from_millis(500), (1024, 600))
            .unwrap();
        assert_eq!(third.resized, Some((1024, 600)));
        assert!((third.elapsed - 0.5).abs() < 1e-3);
    }

    #[test]
    fn restart_keeps_time_origin() {
        let start = Instant::now();
        let mut frames = FrameLoop::new();
        frames.start(start);
        frames.stop();
        assert!(!frames.is_running());
        frames.start(start + Duration::from_secs(2));
        let tick = frames.tick(start + Duration::from_secs(3), (1, 1)).unwrap();
        assert!((tick.elapsed - 3.0).abs() < 1e-3);
    }

    #[test]
    fn measures_frames_per_second() {
        let start = Instant::now();
        let mut frames = FrameLoop::new();
        frames.start(start);
        for step in 1..=60 {
            frames.tick(start + Duration::from_millis(step * 1000 / 60), (1, 1));
        }
        assert!((frames.frames_per_second() - 60.0).abs() < 1.0);
    }
}
