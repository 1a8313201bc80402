use std::path::Path;
use std::time::{Duration, Instant};

use carousel::{Carousel, SlideChange};
use gallery::{Direction, SlideRequest, SlideSource};
use galleryconfig::GalleryConfig;
use tracing::debug;

/// Drives the gallery from a carousel of configured images.
pub struct CarouselSource {
    carousel: Option<Carousel>,
    autoplay: Option<Duration>,
}

impl CarouselSource {
    pub fn from_config(config: &GalleryConfig, now: Instant) -> Self {
        let carousel = match Carousel::from_config(config, now) {
            Ok(carousel) => Some(carousel),
            Err(err) => {
                debug!(error = %err, "carousel starts empty");
                None
            }
        };
        Self {
            carousel,
            autoplay: config.autoplay_interval(),
        }
    }

    pub fn slide_count(&self) -> usize {
        self.carousel.as_ref().map_or(0, Carousel::len)
    }
}

fn to_request(change: SlideChange) -> SlideRequest {
    SlideRequest {
        url: change.url,
        direction: Some(Direction::from_sign(change.direction)),
        skip_animation: false,
    }
}

impl SlideSource for CarouselSource {
    fn initial(&mut self, _now: Instant) -> Option<SlideRequest> {
        let carousel = self.carousel.as_ref()?;
        Some(SlideRequest {
            url: carousel.current_url().to_string(),
            direction: None,
            skip_animation: true,
        })
    }

    fn next(&mut self, now: Instant) -> Option<SlideRequest> {
        self.carousel.as_mut()?.next(now).map(to_request)
    }

    fn prev(&mut self, now: Instant) -> Option<SlideRequest> {
        self.carousel.as_mut()?.prev(now).map(to_request)
    }

    fn dropped(&mut self, path: &Path, now: Instant) -> Option<SlideRequest> {
        let url = path.to_string_lossy().into_owned();
        debug!(url = %url, "file dropped onto gallery");
        match self.carousel.as_mut() {
            Some(carousel) => Some(SlideRequest {
                skip_animation: true,
                ..to_request(carousel.push(url, now))
            }),
            None => {
                let carousel = Carousel::new(vec![url], self.autoplay, now).ok()?;
                let request = SlideRequest {
                    url: carousel.current_url().to_string(),
                    direction: None,
                    skip_animation: true,
                };
                self.carousel = Some(carousel);
                Some(request)
            }
        }
    }

    fn tick(&mut self, now: Instant) -> Option<SlideRequest> {
        self.carousel.as_mut()?.tick(now).map(to_request)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.carousel.as_ref()?.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galleryconfig::AutoplaySettings;

    fn config(images: &[&str]) -> GalleryConfig {
        GalleryConfig {
            images: images.iter().map(|url| url.to_string()).collect(),
            ..GalleryConfig::default()
        }
    }

    #[test]
    fn initial_slide_skips_placeholders_and_animation() {
        let now = Instant::now();
        let mut source = CarouselSource::from_config(&config(&["placeholder.png", "a.jpg"]), now);

        let initial = source.initial(now).unwrap();

        assert_eq!(initial.url, "a.jpg");
        assert!(initial.skip_animation);
        assert_eq!(initial.direction, None);
    }

    #[test]
    fn navigation_carries_direction() {
        let now = Instant::now();
        let mut source = CarouselSource::from_config(&config(&["a.jpg", "b.jpg", "c.jpg"]), now);

        let next = source.next(now).unwrap();
        assert_eq!(next.url, "b.jpg");
        assert_eq!(next.direction, Some(Direction::Forward));
        assert!(!next.skip_animation);

        let prev = source.prev(now).unwrap();
        assert_eq!(prev.url, "a.jpg");
        assert_eq!(prev.direction, Some(Direction::Backward));
    }

    #[test]
    fn default_image_is_used_when_the_list_is_empty() {
        let now = Instant::now();
        let mut cfg = config(&[]);
        cfg.default_image = Some("fallback.jpg".into());
        let mut source = CarouselSource::from_config(&cfg, now);

        assert_eq!(source.initial(now).unwrap().url, "fallback.jpg");
        assert!(source.next(now).is_none());
    }

    #[test]
    fn dropped_files_join_or_start_the_carousel() {
        let now = Instant::now();
        let mut empty = CarouselSource::from_config(&config(&[]), now);
        assert!(empty.initial(now).is_none());
        assert_eq!(empty.slide_count(), 0);

        let request = empty.dropped(Path::new("/tmp/photo.png"), now).unwrap();
        assert_eq!(request.url, "/tmp/photo.png");
        assert!(request.skip_animation);
        assert_eq!(empty.slide_count(), 1);

        let mut source = CarouselSource::from_config(&config(&["a.jpg"]), now);
        let request = source.dropped(Path::new("/tmp/photo.png"), now).unwrap();
        assert_eq!(request.direction, Some(Direction::Forward));
        assert_eq!(source.slide_count(), 2);
    }

    #[test]
    fn autoplay_ticks_after_the_interval() {
        let now = Instant::now();
        let mut cfg = config(&["a.jpg", "b.jpg"]);
        cfg.autoplay = Some(AutoplaySettings {
            interval: Duration::from_secs(2),
        });
        let mut source = CarouselSource::from_config(&cfg, now);

        assert_eq!(source.next_deadline(), Some(now + Duration::from_secs(2)));
        assert!(source.tick(now + Duration::from_secs(1)).is_none());
        let request = source.tick(now + Duration::from_secs(2)).unwrap();
        assert_eq!(request.url, "b.jpg");
    }
}
