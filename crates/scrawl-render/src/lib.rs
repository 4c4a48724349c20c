#![forbid(unsafe_code)]

//! Rasterizer for assembled scenes.
//!
//! A [`scrawl_core::RenderScene`] is written out as a self-contained SVG document, parsed by
//! `usvg` against a shared font database and painted by `resvg` onto a `tiny-skia` pixmap, which
//! is then encoded as PNG or JPEG.

pub mod color;
pub mod fonts;
pub mod raster;
pub mod svg;

pub use fonts::{FontBackend, FontConfig};
pub use raster::ResvgRasterizer;
pub use svg::{SvgDocument, SvgOptions, scene_to_svg};

use scrawl_core::RenderScene;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse SVG: {0}")]
    SvgParse(String),
    #[error("failed to allocate pixmap for raster rendering ({width}x{height})")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color for JPG rendering")]
    JpegBackground,
    #[error("JPG rendering requires an opaque background color (e.g. white)")]
    JpegOpaqueBackgroundRequired,
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("unsupported export mime type `{0}`")]
    UnsupportedMimeType(String),
    #[error("render backend unavailable: {0}")]
    Backend(String),
    #[error("font directory `{}` does not exist", .0.display())]
    FontDirMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Human-readable messages collected while rendering one scene.
///
/// Nothing in here is fatal on its own; callers append the messages to error responses and logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(diagnostic = %message, "render diagnostic");
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// All messages joined with ` | `.
    pub fn summary(&self) -> String {
        self.messages.join(" | ")
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

/// Turns a finished scene into encoded image bytes in `scene.export.mime_type`.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: &RenderScene, diagnostics: &mut Diagnostics) -> Result<Vec<u8>>;
}
