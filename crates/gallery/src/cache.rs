//! Process-wide image cache and background loader.
//!
//! `ImageCache::load` hands back either a ready bitmap or a [`PendingImage`]
//! whose result arrives over a channel once a worker thread has fetched and
//! decoded the bytes. Only successful decodes are stored, keyed by the exact
//! URL string. Two loads of the same uncached URL each start their own fetch.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::error::GalleryError;

/// Decoded RGBA8 pixels, top row first.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    url: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("url", &self.url)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    pub fn from_rgba(
        url: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, GalleryError> {
        let url = url.into();
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(GalleryError::image_load(
                &url,
                format!(
                    "pixel buffer of {} bytes does not match {width}x{height} RGBA",
                    pixels.len()
                ),
            ));
        }
        Ok(Self {
            url,
            width,
            height,
            pixels,
        })
    }

    /// Single-colour bitmap, mostly useful as a stand-in in tests and demos.
    pub fn solid(url: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            url: url.into(),
            width,
            height,
            pixels,
        }
    }

    pub fn decode(url: impl Into<String>, bytes: &[u8]) -> Result<Self, GalleryError> {
        let url = url.into();
        let image =
            image::load_from_memory(bytes).map_err(|err| GalleryError::image_load(&url, err))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(url, width, height, rgba.into_raw())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Source of raw encoded image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, GalleryError>;
}

/// Fetches `http(s)://` URLs over the network and everything else from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceFetcher;

impl ImageFetcher for SourceFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, GalleryError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = reqwest::blocking::get(url)
                .and_then(|response| response.error_for_status())
                .map_err(|err| GalleryError::image_load(url, err))?;
            let bytes = response
                .bytes()
                .map_err(|err| GalleryError::image_load(url, err))?;
            return Ok(bytes.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        fs::read(Path::new(path)).map_err(|err| GalleryError::image_load(url, err))
    }
}

/// Outcome of [`ImageCache::load`].
pub enum ImageRequest {
    Ready(Arc<Bitmap>),
    Pending(PendingImage),
}

/// In-flight fetch + decode started by [`ImageCache::load`].
pub struct PendingImage {
    url: String,
    receiver: Receiver<Result<Arc<Bitmap>, GalleryError>>,
}

impl PendingImage {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-blocking check for completion.
    pub fn poll(&self) -> Option<Result<Arc<Bitmap>, GalleryError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(GalleryError::image_load(
                &self.url,
                "loader exited without a result",
            ))),
        }
    }

    /// Blocks until the worker reports back.
    pub fn wait(self) -> Result<Arc<Bitmap>, GalleryError> {
        self.receiver
            .recv()
            .map_err(|_| GalleryError::image_load(&self.url, "loader exited without a result"))?
    }
}

struct CacheInner {
    entries: Mutex<HashMap<String, Arc<Bitmap>>>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl CacheInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<Bitmap>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// URL-keyed bitmap cache. Cloning shares the same underlying store.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<CacheInner>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self::with_fetcher(SourceFetcher)
    }

    pub fn with_fetcher(fetcher: impl ImageFetcher + 'static) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                fetcher: Arc::new(fetcher),
            }),
        }
    }

    pub fn get(&self, url: &str) -> Option<Arc<Bitmap>> {
        self.inner.entries().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores an already-decoded bitmap under its own URL.
    pub fn insert(&self, bitmap: Bitmap) -> Arc<Bitmap> {
        let bitmap = Arc::new(bitmap);
        self.inner
            .entries()
            .insert(bitmap.url().to_string(), Arc::clone(&bitmap));
        bitmap
    }

    pub fn load(&self, url: &str) -> ImageRequest {
        if let Some(bitmap) = self.get(url) {
            return ImageRequest::Ready(bitmap);
        }

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let owned_url = url.to_string();
        let worker_sender = sender.clone();
        let spawned = thread::Builder::new()
            .name("image-loader".into())
            .spawn(move || {
                let result = inner
                    .fetcher
                    .fetch(&owned_url)
                    .and_then(|bytes| Bitmap::decode(owned_url.as_str(), &bytes))
                    .map(|bitmap| {
                        let bitmap = Arc::new(bitmap);
                        inner
                            .entries()
                            .insert(owned_url.clone(), Arc::clone(&bitmap));
                        bitmap
                    });
                if let Err(err) = &result {
                    tracing::warn!(url = %owned_url, error = %err, "image load failed");
                }
                let _ = worker_sender.send(result);
            });

        if let Err(err) = spawned {
            let _ = sender.send(Err(GalleryError::image_load(url, err)));
        }

        ImageRequest::Pending(PendingImage {
            url: url.to_string(),
            receiver,
        })
    }

    /// Blocking convenience wrapper around [`ImageCache::load`].
    pub fn load_blocking(&self, url: &str) -> Result<Arc<Bitmap>, GalleryError> {
        match self.load(url) {
            ImageRequest::Ready(bitmap) => Ok(bitmap),
            ImageRequest::Pending(pending) => pending.wait(),
        }
    }
}
