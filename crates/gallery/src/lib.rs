//! Fisheye image gallery renderer.
//!
//! A gallery shows one image through a fisheye projection and animates to the
//! next one with a two-slot transition. The overall flow is:
//!
//! ```text
//!   carousel / host
//!          │ request_image_change(url, direction, skip_animation)
//!          ▼
//!   ImageCache::load ──▶ TransitionState ──▶ TextureSlots ("current", "next")
//!                               │
//!   redraw callback ──▶ GalleryState::update ──▶ GalleryUniforms ──▶ Renderer
//! ```
//!
//! Everything up to the uniforms runs without a GPU, so the state machine,
//! effects and shader interface are tested headless. [`GalleryInstance`] adds
//! the wgpu renderer for a window and [`run_window`] is the `winit` preview
//! host used by the `orbview` binary.

mod cache;
mod effect;
mod error;
mod frame;
mod gallery;
mod gpu;
mod intro;
mod pointer;
mod shader;
mod slots;
mod transition;
mod tween;
mod window;

pub use cache::{Bitmap, ImageCache, ImageFetcher, ImageRequest, PendingImage, SourceFetcher};
pub use effect::Effect;
pub use error::{GalleryError, ShaderStageKind};
pub use frame::{FrameLoop, FrameTick};
pub use gallery::{
    FrameOutput, GalleryInstance, GalleryOptions, GalleryState, ImageChange, DEFAULT_DISTORTION,
};
pub use gpu::GalleryUniforms;
pub use intro::{IntroFrame, IntroTimeline, INTRO_RETURN, INTRO_SWEEP};
pub use pointer::{normalize_position, PointerState, POINTER_SMOOTHING};
pub use shader::{
    assemble_fragment, reflect_program, ProgramBindings, FRAGMENT_PRELUDE, VERTEX_SHADER,
};
pub use slots::{
    RecordingSlots, Slot, SlotContents, SlotWrite, TextureSlots, PLACEHOLDER_PIXEL,
};
pub use transition::{
    ChangeOutcome, ChangeRequest, Direction, Phase, TransitionConfig, TransitionState,
};
pub use tween::{Easing, Tween};
pub use window::{run_window, SlideRequest, SlideSource, WindowOptions};
