//! Glyph rasterizer interface
//!
//! The atlas never renders outlines itself. It asks a [`Rasterizer`] for an
//! 8-bit coverage bitmap whenever a codepoint is requested for the first time.

use crate::glyph::KerningEntry;

/// Rasterized glyph bitmap with metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterizedGlyph {
    /// Bitmap pixel data (single channel, row-major, no row padding)
    pub bitmap: Vec<u8>,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Horizontal offset from the cell's top-left corner to the bitmap
    pub offset_x: i16,
    /// Vertical offset from the cell's top-left corner to the bitmap
    pub offset_y: i16,
    /// Horizontal advance to next glyph position
    pub advance_x: i16,
}

/// Source of glyph bitmaps for one font at one size
///
/// Implementations must render their missing-glyph ("notdef") shape when
/// asked for [`FALLBACK_CODEPOINT`](crate::FALLBACK_CODEPOINT); that is how the
/// atlas obtains the glyph it shows for anything the font cannot provide.
pub trait Rasterizer {
    /// Render a codepoint, or `None` if the font has no glyph for it
    fn rasterize(&mut self, codepoint: u32) -> Option<RasterizedGlyph>;

    /// Whether the font maps the codepoint to a real glyph
    fn has_glyph(&self, codepoint: u32) -> bool;

    /// Number of distinct codepoints with glyph data
    fn glyph_count(&self) -> u32;

    /// Highest codepoint with glyph data; everything above is absent
    fn highest_codepoint(&self) -> u32;

    /// Kerning pairs to preload into the atlas
    fn kerning_pairs(&self) -> Vec<KerningEntry> {
        Vec::new()
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn rasterize(&mut self, codepoint: u32) -> Option<RasterizedGlyph> {
        (**self).rasterize(codepoint)
    }

    fn has_glyph(&self, codepoint: u32) -> bool {
        (**self).has_glyph(codepoint)
    }

    fn glyph_count(&self) -> u32 {
        (**self).glyph_count()
    }

    fn highest_codepoint(&self) -> u32 {
        (**self).highest_codepoint()
    }

    fn kerning_pairs(&self) -> Vec<KerningEntry> {
        (**self).kerning_pairs()
    }
}
