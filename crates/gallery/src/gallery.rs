//! Gallery instance and the event bridge into it.
//!
//! [`GalleryState`] holds everything that does not need a GPU: the image
//! cache handle, the transition state machine, pointer smoothing, the frame
//! loop and the optional intro. It writes textures through any
//! [`TextureSlots`] implementation and hands back the uniform block for each
//! frame. [`GalleryInstance`] pairs it with the wgpu renderer for a window.

use std::sync::Arc;
use std::time::Instant;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;

use crate::cache::{Bitmap, ImageCache, ImageRequest, PendingImage};
use crate::effect::Effect;
use crate::error::GalleryError;
use crate::frame::FrameLoop;
use crate::gpu::{GalleryUniforms, Renderer};
use crate::intro::IntroTimeline;
use crate::pointer::{normalize_position, PointerState};
use crate::slots::{Slot, TextureSlots};
use crate::transition::{
    ChangeOutcome, ChangeRequest, Direction, TransitionConfig, TransitionState,
};

/// Fisheye level used when nothing else is configured.
pub const DEFAULT_DISTORTION: f32 = 0.8;

/// Construction-time settings for one gallery.
#[derive(Clone, Debug)]
pub struct GalleryOptions {
    pub effect: Effect,
    pub transition: TransitionConfig,
    pub distortion: f32,
    /// Images to spin through before interactive use; empty disables the intro.
    pub intro: Vec<String>,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            effect: Effect::default(),
            transition: TransitionConfig::default(),
            distortion: DEFAULT_DISTORTION,
            intro: Vec::new(),
        }
    }
}

/// Result of an image-change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageChange {
    /// The bitmap was cached and the state machine acted on it.
    Applied(ChangeOutcome),
    /// The bitmap is loading; the change is applied when it arrives.
    Loading,
}

/// What the renderer needs for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameOutput {
    pub uniforms: GalleryUniforms,
    /// False until an image is shown; the renderer then clears to black.
    pub draw: bool,
    /// Set on the frame the intro hands over to normal operation.
    pub intro_finished: bool,
}

struct PendingChange {
    image: PendingImage,
    request: ChangeRequest,
}

enum IntroState {
    Off,
    Loading {
        urls: Vec<String>,
        pending: Vec<(usize, PendingImage)>,
        loaded: Vec<Option<Arc<Bitmap>>>,
    },
    Playing {
        timeline: IntroTimeline,
        bitmaps: Vec<Arc<Bitmap>>,
    },
}

impl IntroState {
    fn is_active(&self) -> bool {
        !matches!(self, IntroState::Off)
    }
}

pub struct GalleryState {
    cache: ImageCache,
    effect: Effect,
    transition: TransitionState,
    pointer: PointerState,
    frames: FrameLoop,
    pending: Vec<PendingChange>,
    intro: IntroState,
    uniforms: GalleryUniforms,
}

impl GalleryState {
    pub fn new(options: GalleryOptions, cache: ImageCache) -> Self {
        let intro = if options.intro.is_empty() {
            IntroState::Off
        } else {
            let urls = options.intro;
            let mut pending = Vec::new();
            let mut loaded = vec![None; urls.len()];
            for (index, url) in urls.iter().enumerate() {
                match cache.load(url) {
                    ImageRequest::Ready(bitmap) => loaded[index] = Some(bitmap),
                    ImageRequest::Pending(image) => pending.push((index, image)),
                }
            }
            debug!(images = urls.len(), "intro images requested");
            IntroState::Loading {
                urls,
                pending,
                loaded,
            }
        };

        Self {
            cache,
            effect: options.effect,
            transition: TransitionState::new(options.transition),
            pointer: PointerState::default(),
            frames: FrameLoop::new(),
            pending: Vec::new(),
            intro,
            uniforms: GalleryUniforms::new(1, 1, options.distortion),
        }
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn transition(&self) -> &TransitionState {
        &self.transition
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn frames(&self) -> &FrameLoop {
        &self.frames
    }

    pub fn is_intro_active(&self) -> bool {
        self.intro.is_active()
    }

    /// Loads still in flight, including intro images.
    pub fn has_pending_loads(&self) -> bool {
        !self.pending.is_empty()
            || matches!(&self.intro, IntroState::Loading { pending, .. } if !pending.is_empty())
    }

    /// Entry point for the surrounding carousel.
    pub fn request_image_change(
        &mut self,
        url: &str,
        request: ChangeRequest,
        now: Instant,
        slots: &mut dyn TextureSlots,
    ) -> ImageChange {
        if self.intro.is_active() {
            debug!(url, "intro playing; dropping image change");
            return ImageChange::Applied(ChangeOutcome::Dropped);
        }
        if self.transition.current_url() == Some(url) {
            debug!(url, "image already current; ignoring change");
            return ImageChange::Applied(ChangeOutcome::SameImage);
        }
        if self.transition.is_transitioning() {
            debug!(
                url,
                progress = self.transition.progress(),
                "transition in flight; dropping image change"
            );
            return ImageChange::Applied(ChangeOutcome::Dropped);
        }

        match self.cache.load(url) {
            ImageRequest::Ready(bitmap) => {
                ImageChange::Applied(self.apply(bitmap, request, now, slots))
            }
            ImageRequest::Pending(image) => {
                debug!(url, "image change waiting on load");
                self.pending.push(PendingChange { image, request });
                ImageChange::Loading
            }
        }
    }

    /// Pointer position in window pixels.
    pub fn pointer_moved(&mut self, x: f64, y: f64, size: (u32, u32)) {
        let [nx, ny] = normalize_position(x, y, size.0, size.1);
        self.pointer.moved(nx, ny);
    }

    pub fn pointer_entered(&mut self) {
        self.pointer.entered();
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left();
    }

    /// Advances loads, the intro and the transition, then fills the uniforms.
    pub fn update(
        &mut self,
        now: Instant,
        size: (u32, u32),
        slots: &mut dyn TextureSlots,
    ) -> FrameOutput {
        self.resolve_pending(now, slots);
        let (intro_transition, intro_finished) = self.update_intro(now, slots);
        if intro_transition.is_none() {
            self.transition.advance(now, slots);
        }

        let draw = self.transition.current().is_some() || intro_transition.is_some();
        if let Some(tick) = self.frames.tick(now, size) {
            if let Some((width, height)) = tick.resized {
                debug!(width, height, "viewport resized");
            }
            self.uniforms.set_resolution(size.0, size.1);
            self.uniforms.pointer = self.pointer.smooth();
            self.uniforms.time = tick.elapsed;
            match intro_transition {
                Some(progress) => {
                    self.uniforms.transition = progress;
                    self.uniforms.direction = Direction::Forward.sign();
                }
                None => {
                    self.uniforms.transition = self.transition.progress();
                    self.uniforms.direction = self.transition.direction().sign();
                }
            }
            if let Some(current) = self.transition.current() {
                self.uniforms.image_size = current.size();
            }
        }

        FrameOutput {
            uniforms: self.uniforms,
            draw,
            intro_finished,
        }
    }

    /// Stops the frame loop; pending loads still fill the cache.
    pub fn shutdown(&mut self) {
        self.frames.stop();
        self.pending.clear();
    }

    fn apply(
        &mut self,
        bitmap: Arc<Bitmap>,
        request: ChangeRequest,
        now: Instant,
        slots: &mut dyn TextureSlots,
    ) -> ChangeOutcome {
        let outcome = self.transition.request(bitmap, request, now, slots);
        if outcome == ChangeOutcome::Initialized {
            self.frames.start(now);
        }
        outcome
    }

    fn resolve_pending(&mut self, now: Instant, slots: &mut dyn TextureSlots) {
        if self.pending.is_empty() {
            return;
        }
        let mut waiting = Vec::with_capacity(self.pending.len());
        for change in std::mem::take(&mut self.pending) {
            match change.image.poll() {
                None => waiting.push(change),
                Some(Ok(bitmap)) => {
                    self.apply(bitmap, change.request, now, slots);
                }
                Some(Err(error)) => {
                    warn!(url = change.image.url(), error = %error, "keeping previous image");
                }
            }
        }
        self.pending = waiting;
    }

    /// Returns the intro's shader progress while it plays.
    fn update_intro(&mut self, now: Instant, slots: &mut dyn TextureSlots) -> (Option<f32>, bool) {
        if let IntroState::Loading {
            urls,
            pending,
            loaded,
        } = &mut self.intro
        {
            pending.retain(|(index, image)| match image.poll() {
                None => true,
                Some(Ok(bitmap)) => {
                    loaded[*index] = Some(bitmap);
                    false
                }
                Some(Err(error)) => {
                    warn!(url = image.url(), error = %error, "skipping intro image");
                    false
                }
            });
            if !pending.is_empty() {
                return (None, false);
            }

            let bitmaps: Vec<Arc<Bitmap>> = loaded.drain(..).flatten().collect();
            match IntroTimeline::new(bitmaps.len(), now) {
                Some(timeline) => {
                    info!(images = bitmaps.len(), requested = urls.len(), "intro started");
                    self.intro = IntroState::Playing { timeline, bitmaps };
                    self.frames.start(now);
                }
                None => {
                    warn!("no intro image could be loaded; skipping intro");
                    self.intro = IntroState::Off;
                    return (None, true);
                }
            }
        }

        let IntroState::Playing { timeline, bitmaps } = &mut self.intro else {
            return (None, false);
        };
        let frame = timeline.sample(now);
        if frame.finished {
            let first = Arc::clone(&bitmaps[0]);
            self.transition.reset_to(first, slots);
            self.intro = IntroState::Off;
            debug!("intro finished");
            return (None, true);
        }
        if frame.indices_changed {
            slots.upload(Slot::Current, &bitmaps[frame.current]);
            slots.upload(Slot::Next, &bitmaps[frame.next]);
        }
        (Some(frame.transition), false)
    }
}

/// A gallery bound to a window surface.
pub struct GalleryInstance {
    state: GalleryState,
    renderer: Renderer,
}

impl GalleryInstance {
    /// Creates the rendering context and builds the effect program.
    ///
    /// Failure is terminal for this instance only.
    pub fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        options: GalleryOptions,
        cache: ImageCache,
    ) -> Result<Self, GalleryError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let renderer = Renderer::new(target, size, &options.effect)?;
        Ok(Self {
            state: GalleryState::new(options, cache),
            renderer,
        })
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.renderer.size()
    }

    pub fn request_image_change(
        &mut self,
        url: &str,
        direction: Option<Direction>,
        skip_animation: bool,
    ) -> ImageChange {
        let request = ChangeRequest {
            direction,
            skip_animation,
        };
        self.state
            .request_image_change(url, request, Instant::now(), self.renderer.slots_mut())
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        let size = self.renderer.size();
        self.state.pointer_moved(x, y, (size.width, size.height));
    }

    pub fn pointer_entered(&mut self) {
        self.state.pointer_entered();
    }

    pub fn pointer_left(&mut self) {
        self.state.pointer_left();
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.resize(size);
    }

    /// Whether the host should keep scheduling frames.
    pub fn wants_frames(&self) -> bool {
        self.state.frames().is_running() || self.state.has_pending_loads()
    }

    /// Updates state and presents one frame.
    pub fn render(&mut self, now: Instant) -> Result<FrameOutput, GalleryError> {
        let size = self.renderer.size();
        let output = self
            .state
            .update(now, (size.width, size.height), self.renderer.slots_mut());
        self.renderer.render(&output.uniforms, output.draw)?;
        Ok(output)
    }

    pub fn shutdown(&mut self) {
        self.state.shutdown();
    }
}
