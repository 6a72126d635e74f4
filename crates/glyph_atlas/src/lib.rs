//! Dynamic glyph atlas for font rendering
//!
//! This crate provides:
//! - Shelf packing of glyph bitmaps into a growable single-channel page
//! - Two-tier codepoint lookup (dense table for Latin, hash map above it)
//! - Kerning pair storage with fast rejection
//! - Lazy rasterization on first use, with a font-provided fallback glyph
//! - Prebaked (immutable) atlases and a GPU texture mirror with deferred destruction
//!
//! # Example
//!
//! ```rust,no_run
//! use glyph_atlas::{AtlasCache, AtlasConfig, FontFace, SwashRasterizer};
//!
//! let font = FontFace::from_file(std::path::Path::new("DejaVuSans.ttf"))?;
//! let mut atlas = AtlasCache::new(SwashRasterizer::new(font, 16.0), AtlasConfig::default());
//!
//! atlas.preload_range(0x20, 0x7E);
//! let glyph = atlas.get_glyph('A' as u32);
//! let uv = glyph.uv_bounds(atlas.dimensions().0, atlas.dimensions().1);
//! # let _ = uv;
//! # Ok::<(), glyph_atlas::AtlasError>(())
//! ```

pub mod cache;
pub mod config;
pub mod font;
pub mod glyph;
pub mod page;
pub mod prebaked;
pub mod rasterizer;
pub mod shelf;
pub mod store;
pub mod texture;

pub use cache::{AtlasCache, AtlasStats};
pub use config::AtlasConfig;
pub use font::{FontFace, FontMetrics, SwashRasterizer};
pub use glyph::{AtlasRect, Glyph, GlyphFlags, KerningEntry, FALLBACK_CODEPOINT};
pub use page::PixelPage;
pub use prebaked::PrebakedFont;
pub use rasterizer::{RasterizedGlyph, Rasterizer};
pub use shelf::ShelfAllocator;
pub use store::{GlyphStore, DENSE_TABLE_SIZE};
pub use texture::{AtlasTexture, DeferredDestroyQueue, TextureSink};

use thiserror::Error;

/// Glyph atlas errors
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Failed to load font: {0}")]
    FontLoadError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid prebaked font: {0}")]
    InvalidPrebaked(String),

    #[error("Atlas would need {width}x{height} pixels, above the {max} texture limit")]
    AtlasExhausted { width: u32, height: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, AtlasError>;
