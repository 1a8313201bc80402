//! wgpu side of a gallery instance.
//!
//! - `context` owns the wgpu instance/device/surface wiring and reconfigures
//!   the surface when the window resizes.
//! - `slots` holds the two image textures ("current" and "next") behind one
//!   bind group and implements [`crate::slots::TextureSlots`].
//! - `program` turns the vertex stage plus an effect's fragment stage into a
//!   render pipeline, reporting compile and link failures separately.
//! - `uniforms` mirrors the `GalleryParams` block written every frame.
//! - `renderer` binds program, quad, uniforms and slots explicitly for each
//!   draw.

mod context;
mod program;
mod renderer;
mod slots;
mod uniforms;

pub(crate) use renderer::Renderer;
pub use uniforms::GalleryUniforms;
