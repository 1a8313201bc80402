use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::cache::ImageCache;
use crate::error::GalleryError;
use crate::gallery::{GalleryInstance, GalleryOptions};
use crate::transition::Direction;

/// An image change produced by the host's slide source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideRequest {
    pub url: String,
    pub direction: Option<Direction>,
    pub skip_animation: bool,
}

/// The collaborator that decides which image comes next.
///
/// The window host only forwards input to it and hands whatever it returns to
/// the gallery.
pub trait SlideSource {
    /// Image to show once the window is up; `None` means nothing to show yet.
    fn initial(&mut self, now: Instant) -> Option<SlideRequest>;
    fn next(&mut self, now: Instant) -> Option<SlideRequest>;
    fn prev(&mut self, now: Instant) -> Option<SlideRequest>;
    /// A file dropped onto the window.
    fn dropped(&mut self, path: &Path, now: Instant) -> Option<SlideRequest>;
    /// Timer-driven changes such as autoplay.
    fn tick(&mut self, now: Instant) -> Option<SlideRequest>;
    fn next_deadline(&self) -> Option<Instant>;
}

/// Preview window settings.
#[derive(Clone, Debug)]
pub struct WindowOptions {
    pub title: String,
    pub size: (u32, u32),
    /// Arrow keys and mouse back/forward navigate when set.
    pub show_controls: bool,
    pub gallery: GalleryOptions,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Orbview".to_string(),
            size: (1280, 720),
            show_controls: true,
            gallery: GalleryOptions::default(),
        }
    }
}

/// Input the window turns into navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Navigation {
    Next,
    Prev,
}

fn navigation_for_key(event: &KeyEvent) -> Option<Navigation> {
    if event.state != ElementState::Pressed {
        return None;
    }
    match event.logical_key {
        Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::ArrowDown) => {
            Some(Navigation::Next)
        }
        Key::Named(NamedKey::ArrowLeft) | Key::Named(NamedKey::ArrowUp) => Some(Navigation::Prev),
        _ => None,
    }
}

fn navigation_for_button(button: MouseButton) -> Option<Navigation> {
    match button {
        MouseButton::Forward => Some(Navigation::Next),
        MouseButton::Back => Some(Navigation::Prev),
        _ => None,
    }
}

// The gallery's surface borrows the window, so it is declared (and dropped) first.
struct WindowState<S> {
    gallery: GalleryInstance,
    window: Arc<Window>,
    source: S,
    show_controls: bool,
}

impl<S: SlideSource> WindowState<S> {
    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn submit(&mut self, request: Option<SlideRequest>) {
        let Some(request) = request else {
            return;
        };
        let outcome = self.gallery.request_image_change(
            &request.url,
            request.direction,
            request.skip_animation,
        );
        debug!(url = %request.url, ?outcome, "slide requested");
        self.window().request_redraw();
    }

    fn navigate(&mut self, navigation: Navigation) {
        if !self.show_controls {
            return;
        }
        let now = Instant::now();
        let request = match navigation {
            Navigation::Next => self.source.next(now),
            Navigation::Prev => self.source.prev(now),
        };
        self.submit(request);
    }

    fn render_frame(&mut self) -> Result<(), GalleryError> {
        let output = self.gallery.render(Instant::now())?;
        if output.intro_finished {
            let request = self.source.initial(Instant::now()).map(|request| SlideRequest {
                skip_animation: true,
                ..request
            });
            self.submit(request);
        }
        Ok(())
    }
}

/// Opens the preview window and runs the gallery until it is closed.
pub fn run_window<S>(options: WindowOptions, cache: ImageCache, source: S) -> Result<()>
where
    S: SlideSource + 'static,
{
    let event_loop = EventLoopBuilder::<()>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(options.size.0.max(1), options.size.1.max(1));
    let window = WindowBuilder::new()
        .with_title(options.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let gallery = GalleryInstance::new(
        window.as_ref(),
        window.inner_size(),
        options.gallery,
        cache,
    )
    .context("failed to initialise gallery renderer")?;

    let mut state = WindowState {
        gallery,
        window: Arc::clone(&window),
        source,
        show_controls: options.show_controls,
    };

    if state.gallery.state().is_intro_active() {
        info!("playing intro before the first slide");
    } else {
        let initial = state.source.initial(Instant::now());
        if initial.is_none() {
            warn!(error = %GalleryError::NoImageAvailable, "window opened without an image");
        }
        state.submit(initial);
    }
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    state.gallery.shutdown();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                    {
                        state.gallery.shutdown();
                        elwt.exit();
                        return;
                    }
                    if let Some(navigation) = navigation_for_key(&event) {
                        state.navigate(navigation);
                    }
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button,
                    ..
                } => {
                    if let Some(navigation) = navigation_for_button(button) {
                        state.navigate(navigation);
                    }
                }
                WindowEvent::CursorEntered { .. } => state.gallery.pointer_entered(),
                WindowEvent::CursorLeft { .. } => state.gallery.pointer_left(),
                WindowEvent::CursorMoved { position, .. } => {
                    state.gallery.pointer_moved(position.x, position.y);
                }
                WindowEvent::DroppedFile(path) => {
                    let request = state.source.dropped(&path, Instant::now());
                    state.submit(request.map(|request| SlideRequest {
                        skip_animation: true,
                        ..request
                    }));
                }
                WindowEvent::Resized(new_size) => {
                    state.gallery.resize(new_size);
                    state.window().request_redraw();
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.gallery.size());
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(_) => {}
                    Err(GalleryError::Surface(surface_err)) => match surface_err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            let size = state.gallery.size();
                            state.gallery.resize(size);
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            error!("surface out of memory; closing gallery");
                            state.gallery.shutdown();
                            elwt.exit();
                        }
                        wgpu::SurfaceError::Timeout => {
                            warn!("surface timeout; retrying next frame");
                        }
                        other => {
                            warn!(error = ?other, "surface error; retrying next frame");
                        }
                    },
                    Err(err) => {
                        error!(error = %err, "failed to render gallery frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            let request = state.source.tick(now);
            state.submit(request);

            if state.gallery.wants_frames() {
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = state.source.next_deadline() {
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
