//! Glyph records and atlas rectangles
//!
//! A [`Glyph`] is the packed result of rasterizing one codepoint: where its
//! bitmap lives in the atlas page and how to position it relative to a
//! character cell.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Codepoint resolved once per atlas to obtain the fallback ("notdef") glyph.
///
/// U+FFFF is a Unicode noncharacter, so no font maps a real glyph to it.
pub const FALLBACK_CODEPOINT: u32 = 0xFFFF;

/// Axis-aligned rectangle in atlas pixel space, `[x, x + width) × [y, y + height)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    /// Create a rectangle from position and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether two rectangles share at least one pixel
    pub fn intersects(&self, other: &AtlasRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrink by `amount` on every side, saturating at an empty rectangle
    pub fn shrink(&self, amount: u32) -> AtlasRect {
        AtlasRect {
            x: self.x + amount,
            y: self.y + amount,
            width: self.width.saturating_sub(amount * 2),
            height: self.height.saturating_sub(amount * 2),
        }
    }
}

/// Placement and metrics of one packed codepoint
///
/// The rectangle includes the per-side padding reserved around the bitmap,
/// and `offset_x`/`offset_y` are already reduced by that padding, so drawing
/// the whole rectangle at `pen + offset` lands the bitmap exactly where the
/// rasterizer placed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Glyph {
    /// X position in atlas (pixels)
    pub x: u16,
    /// Y position in atlas (pixels)
    pub y: u16,
    /// Width in atlas (pixels)
    pub width: u16,
    /// Height in atlas (pixels)
    pub height: u16,
    /// Horizontal offset from the cell's top-left corner
    pub offset_x: i16,
    /// Vertical offset from the cell's top-left corner
    pub offset_y: i16,
    /// Horizontal advance to the next cell
    pub advance_x: i16,
}

impl Glyph {
    /// Region of the atlas covered by this glyph
    pub fn rect(&self) -> AtlasRect {
        AtlasRect::new(
            self.x as u32,
            self.y as u32,
            self.width as u32,
            self.height as u32,
        )
    }

    /// Get UV coordinates for this glyph given atlas dimensions
    pub fn uv_bounds(&self, atlas_width: u32, atlas_height: u32) -> [f32; 4] {
        if atlas_width == 0 || atlas_height == 0 {
            return [0.0; 4];
        }
        let u_min = self.x as f32 / atlas_width as f32;
        let v_min = self.y as f32 / atlas_height as f32;
        let u_max = (self.x as u32 + self.width as u32) as f32 / atlas_width as f32;
        let v_max = (self.y as u32 + self.height as u32) as f32 / atlas_height as f32;
        [u_min, v_min, u_max, v_max]
    }
}

bitflags! {
    /// Per-slot state bits kept by the dense lookup table
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct GlyphFlags: u8 {
        /// The slot holds a packed glyph
        const IS_LOADED = 1 << 0;
        /// At least one kerning pair starts with this codepoint
        const HAS_LEFT_KERN = 1 << 1;
    }
}

/// Horizontal adjustment applied between two consecutive codepoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KerningEntry {
    pub prev: u32,
    pub next: u32,
    pub value: i16,
}

impl KerningEntry {
    pub const fn new(prev: u32, next: u32, value: i16) -> Self {
        Self { prev, next, value }
    }
}
