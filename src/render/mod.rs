//! Rendering and export boundary
//!
//! The compositor hands finished composites to a caller-supplied renderer
//! and exporter; nothing in the core inspects palettes or value ranges.
//!
//! Structure:
//! - `palette.rs`: embedded palette registry (the reference color ramps)
//! - `frame.rs`: [`PaletteRenderer`] and the border overlay
//! - `gif.rs`: [`GifExporter`] / [`PngExporter`]

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::earthdata::error::Result;
use crate::earthdata::raster::RasterImage;

pub mod frame;
pub mod gif;
pub mod palette;

// Re-exports for convenience
pub use frame::{BorderOverlay, BorderSpec, PaletteRenderer};
pub use gif::{GifExporter, PngExporter};
pub use palette::{PaletteDefinition, PaletteRegistry, PALETTE_REGISTRY};

/// Visualization parameters: which band to draw and how to map its values
/// onto a palette. Opaque pass-through configuration as far as the
/// compositor is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    /// Band to visualize.
    pub band: String,
    /// Value mapped to the first palette color.
    pub min: f64,
    /// Value mapped to the last palette color.
    pub max: f64,
    /// Palette name in the registry.
    pub palette: String,
}

/// One rendered RGBA frame, labeled with its composite's window label.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Renders one composite raster to an RGBA frame.
pub trait FrameRenderer: Send + Sync {
    fn render(&self, image: &RasterImage, vis: &VisParams, label: &str) -> Result<RenderedFrame>;
}

/// Writes an ordered, labeled frame sequence to an output target.
/// The output format is the implementation's concern.
pub trait SequenceExporter: Send + Sync {
    fn export(&self, frames: &[RenderedFrame], fps: u32, target: &Path) -> Result<()>;
}
