/// Fraction of the remaining distance the smoothed pointer covers per frame.
pub const POINTER_SMOOTHING: f32 = 0.1;

const CENTRE: [f32; 2] = [0.5, 0.5];

/// Pointer position in normalised viewport space (origin bottom-left).
///
/// `target` follows the real pointer while it hovers; `smoothed` chases the
/// target by a fixed fraction each frame, so the settle rate depends on the
/// refresh rate rather than wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    target: [f32; 2],
    smoothed: [f32; 2],
    hovering: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            target: CENTRE,
            smoothed: CENTRE,
            hovering: false,
        }
    }
}

impl PointerState {
    pub fn entered(&mut self) {
        self.hovering = true;
    }

    /// Resets the target to the centre; the smoothed value glides back.
    pub fn left(&mut self) {
        self.hovering = false;
        self.target = CENTRE;
    }

    /// Records a normalised position; ignored while the pointer is outside.
    pub fn moved(&mut self, x: f32, y: f32) {
        if !self.hovering {
            return;
        }
        self.target = [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)];
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn target(&self) -> [f32; 2] {
        self.target
    }

    pub fn smoothed(&self) -> [f32; 2] {
        self.smoothed
    }

    /// Advances the low-pass filter by one frame.
    pub fn smooth(&mut self) -> [f32; 2] {
        for axis in 0..2 {
            self.smoothed[axis] += (self.target[axis] - self.smoothed[axis]) * POINTER_SMOOTHING;
        }
        self.smoothed
    }
}

/// Converts window pixel coordinates (origin top-left) to normalised
/// coordinates with y pointing up.
pub fn normalize_position(x: f64, y: f64, width: u32, height: u32) -> [f32; 2] {
    let width = width.max(1) as f64;
    let height = height.max(1) as f64;
    [
        (x / width).clamp(0.0, 1.0) as f32,
        (1.0 - y / height).clamp(0.0, 1.0) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_are_ignored_until_hovering() {
        let mut pointer = PointerState::default();
        pointer.moved(0.9, 0.1);
        assert_eq!(pointer.target(), CENTRE);
        pointer.entered();
        pointer.moved(0.9, 0.1);
        assert_eq!(pointer.target(), [0.9, 0.1]);
    }

    #[test]
    fn smoothing_covers_a_tenth_per_frame() {
        let mut pointer = PointerState::default();
        pointer.entered();
        pointer.moved(1.0, 0.5);
        let first = pointer.smooth();
        assert!((first[0] - 0.55).abs() < 1e-6);
        for _ in 0..200 {
            pointer.smooth();
        }
        assert!((pointer.smoothed()[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn leaving_recentres_the_target() {
        let mut pointer = PointerState::default();
        pointer.entered();
        pointer.moved(0.0, 0.0);
        pointer.smooth();
        pointer.left();
        assert_eq!(pointer.target(), CENTRE);
        assert!(!pointer.is_hovering());
        pointer.moved(1.0, 1.0);
        assert_eq!(pointer.target(), CENTRE);
    }

    #[test]
    fn normalises_and_flips_y() {
        assert_eq!(normalize_position(0.0, 0.0, 200, 100), [0.0, 1.0]);
        assert_eq!(normalize_position(100.0, 100.0, 200, 100), [0.5, 0.0]);
        assert_eq!(normalize_position(-5.0, 500.0, 200, 100), [0.0, 0.0]);
    }
}
