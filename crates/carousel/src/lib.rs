use std::time::{Duration, Instant};

use galleryconfig::{GalleryConfig, PLACEHOLDER_MARKER};

#[derive(Debug, thiserror::Error)]
pub enum CarouselError {
    #[error("carousel has no slides")]
    Empty,
    #[error("slide index {index} out of range for {len} slides")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Emitted whenever the active slide changes.
///
/// `direction` is `+1` when moving forward through the list and `-1` when
/// moving backward, matching the sign the gallery uses for its rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideChange {
    pub index: usize,
    pub url: String,
    pub direction: i8,
    pub started_at: Instant,
}

pub struct Carousel {
    slides: Vec<String>,
    cursor: usize,
    autoplay: Option<Duration>,
    last_navigation: Instant,
}

fn is_placeholder(url: &str) -> bool {
    url.contains(PLACEHOLDER_MARKER)
}

impl Carousel {
    pub fn new(
        slides: Vec<String>,
        autoplay: Option<Duration>,
        now: Instant,
    ) -> Result<Self, CarouselError> {
        if slides.is_empty() {
            return Err(CarouselError::Empty);
        }
        let cursor = slides
            .iter()
            .position(|url| !is_placeholder(url))
            .unwrap_or(0);
        Ok(Self {
            slides,
            cursor,
            autoplay: autoplay.filter(|interval| !interval.is_zero()),
            last_navigation: now,
        })
    }

    /// Builds the slide list from `images`, or from `default_image` when the
    /// list is empty.
    ///
    /// The first slide shown is the first entry that is not a placeholder,
    /// falling back to the first entry.
    pub fn from_config(config: &GalleryConfig, now: Instant) -> Result<Self, CarouselError> {
        let slides = if config.images.is_empty() {
            config.default_image.iter().cloned().collect()
        } else {
            config.images.clone()
        };
        Self::new(slides, config.autoplay_interval(), now)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn current_url(&self) -> &str {
        &self.slides[self.cursor]
    }

    pub fn next(&mut self, now: Instant) -> Option<SlideChange> {
        self.step(1, now)
    }

    pub fn prev(&mut self, now: Instant) -> Option<SlideChange> {
        self.step(-1, now)
    }

    /// Jumps to `index`; the direction follows the sign of the index delta.
    pub fn select(
        &mut self,
        index: usize,
        now: Instant,
    ) -> Result<Option<SlideChange>, CarouselError> {
        let len = self.slides.len();
        if index >= len {
            return Err(CarouselError::IndexOutOfRange { index, len });
        }
        if index == self.cursor || is_placeholder(&self.slides[index]) {
            return Ok(None);
        }
        let direction = if index > self.cursor { 1 } else { -1 };
        Ok(Some(self.move_to(index, direction, now)))
    }

    /// Appends a slide and makes it active, as when a file is dropped on the window.
    pub fn push(&mut self, url: impl Into<String>, now: Instant) -> SlideChange {
        self.slides.push(url.into());
        let index = self.slides.len() - 1;
        self.move_to(index, 1, now)
    }

    /// Advances when the autoplay interval has elapsed since the last navigation.
    pub fn tick(&mut self, now: Instant) -> Option<SlideChange> {
        let interval = self.autoplay?;
        if now.saturating_duration_since(self.last_navigation) < interval {
            return None;
        }
        tracing::trace!(interval_ms = interval.as_millis() as u64, "autoplay interval elapsed");
        let change = self.next(now);
        // A carousel with nothing to advance to still restarts its interval.
        self.last_navigation = now;
        change
    }

    /// Instant at which autoplay next fires, if enabled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autoplay.map(|interval| self.last_navigation + interval)
    }

    fn step(&mut self, delta: isize, now: Instant) -> Option<SlideChange> {
        let len = self.slides.len() as isize;
        let mut index = self.cursor as isize;
        for _ in 1..len {
            index = (index + delta).rem_euclid(len);
            if !is_placeholder(&self.slides[index as usize]) {
                let direction = if delta > 0 { 1 } else { -1 };
                return Some(self.move_to(index as usize, direction, now));
            }
        }
        None
    }

    fn move_to(&mut self, index: usize, direction: i8, now: Instant) -> SlideChange {
        self.cursor = index;
        self.last_navigation = now;
        tracing::debug!(index, direction, url = %self.slides[index], "active slide changed");
        SlideChange {
            index,
            url: self.slides[index].clone(),
            direction,
            started_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slides(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn starts_on_first_real_slide() {
        let carousel = Carousel::new(
            slides(&["placeholder.png", "a.jpg", "b.jpg"]),
            None,
            Instant::now(),
        )
        .unwrap();
        assert_eq!(carousel.current_index(), 1);
        assert_eq!(carousel.current_url(), "a.jpg");
    }

    #[test]
    fn rejects_empty_list() {
        let err = Carousel::new(Vec::new(), None, Instant::now()).err();
        assert!(matches!(err, Some(CarouselError::Empty)));
    }

    #[test]
    fn next_and_prev_loop_with_direction() {
        let now = Instant::now();
        let mut carousel = Carousel::new(slides(&["a", "b", "c"]), None, now).unwrap();

        let change = carousel.prev(now).unwrap();
        assert_eq!((change.index, change.direction), (2, -1));
        assert_eq!(change.url, "c");

        let change = carousel.next(now).unwrap();
        assert_eq!((change.index, change.direction), (0, 1));
    }

    #[test]
    fn navigation_skips_placeholders() {
        let now = Instant::now();
        let mut carousel =
            Carousel::new(slides(&["a", "placeholder-1", "c"]), None, now).unwrap();
        let change = carousel.next(now).unwrap();
        assert_eq!(change.url, "c");
        let change = carousel.prev(now).unwrap();
        assert_eq!(change.url, "a");
    }

    #[test]
    fn single_slide_never_changes() {
        let now = Instant::now();
        let mut carousel = Carousel::new(slides(&["only"]), None, now).unwrap();
        assert!(carousel.next(now).is_none());
        assert!(carousel.prev(now).is_none());
    }

    #[test]
    fn select_uses_sign_of_delta() {
        let now = Instant::now();
        let mut carousel = Carousel::new(slides(&["a", "b", "c", "d"]), None, now).unwrap();
        let forward = carousel.select(3, now).unwrap().unwrap();
        assert_eq!(forward.direction, 1);
        let backward = carousel.select(1, now).unwrap().unwrap();
        assert_eq!(backward.direction, -1);
        assert!(carousel.select(1, now).unwrap().is_none());
        assert!(matches!(
            carousel.select(9, now),
            Err(CarouselError::IndexOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn autoplay_advances_after_interval() {
        let start = Instant::now();
        let mut carousel =
            Carousel::new(slides(&["a", "b"]), Some(Duration::from_secs(6)), start).unwrap();
        assert!(carousel.tick(start + Duration::from_secs(5)).is_none());
        let change = carousel.tick(start + Duration::from_secs(6)).unwrap();
        assert_eq!((change.url.as_str(), change.direction), ("b", 1));
        assert_eq!(
            carousel.next_deadline(),
            Some(start + Duration::from_secs(12))
        );
    }

    #[test]
    fn manual_navigation_resets_autoplay() {
        let start = Instant::now();
        let mut carousel =
            Carousel::new(slides(&["a", "b", "c"]), Some(Duration::from_secs(6)), start)
                .unwrap();
        carousel.next(start + Duration::from_secs(4));
        assert!(carousel.tick(start + Duration::from_secs(7)).is_none());
        assert!(carousel.tick(start + Duration::from_secs(10)).is_some());
    }

    #[test]
    fn push_activates_new_slide() {
        let now = Instant::now();
        let mut carousel = Carousel::new(slides(&["a"]), None, now).unwrap();
        let change = carousel.push("dropped.png", now);
        assert_eq!(change.index, 1);
        assert_eq!(carousel.current_url(), "dropped.png");
    }

    #[test]
    fn builds_from_config() {
        let config = GalleryConfig::from_toml_str(
            r#"
version = 1
images = ["a.jpg", "b.jpg"]

[autoplay]
interval = "3s"
"#,
        )
        .unwrap();
        let now = Instant::now();
        let carousel = Carousel::from_config(&config, now).unwrap();
        assert_eq!(carousel.len(), 2);
        assert_eq!(carousel.next_deadline(), Some(now + Duration::from_secs(3)));
    }

    #[test]
    fn config_falls_back_to_first_slide_then_default_image() {
        let now = Instant::now();
        let mut config = GalleryConfig {
            images: slides(&["one-placeholder.png", "two-placeholder.png"]),
            default_image: Some("fallback.png".into()),
            ..GalleryConfig::default()
        };
        let carousel = Carousel::from_config(&config, now).unwrap();
        assert_eq!(carousel.current_url(), "one-placeholder.png");

        config.images.clear();
        let carousel = Carousel::from_config(&config, now).unwrap();
        assert_eq!(carousel.current_url(), "fallback.png");
        assert_eq!(carousel.len(), 1);

        config.default_image = None;
        assert!(matches!(
            Carousel::from_config(&config, now),
            Err(CarouselError::Empty)
        ));
    }
}
