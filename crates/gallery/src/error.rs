use std::fmt;

/// Pipeline stage a shader source belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures surfaced by a gallery instance.
///
/// Construction-time kinds (`ContextUnavailable`, `ShaderCompile`,
/// `ShaderLink`) are terminal for the instance that raised them. `ImageLoad`
/// and `NoImageAvailable` are recoverable; the gallery keeps showing whatever
/// it showed before.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("no rendering context available: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed to compile:\n{diagnostics}")]
    ShaderCompile {
        stage: ShaderStageKind,
        diagnostics: String,
        shader_source: String,
    },
    #[error("shader program failed to link: {diagnostics}")]
    ShaderLink { diagnostics: String },
    #[error("failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },
    #[error("no candidate image available")]
    NoImageAvailable,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl GalleryError {
    pub(crate) fn image_load(url: &str, reason: impl fmt::Display) -> Self {
        GalleryError::ImageLoad {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures the instance recovers from on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GalleryError::ImageLoad { .. } | GalleryError::NoImageAvailable | GalleryError::Surface(_)
        )
    }
}
