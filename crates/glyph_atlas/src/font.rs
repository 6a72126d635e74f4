//! Font loading and glyph rasterization
//!
//! [`FontFace`] parses the font with ttf-parser to extract metrics, cmap
//! coverage and legacy kerning. [`SwashRasterizer`] renders coverage masks
//! with swash at a fixed pixel size.

use crate::glyph::{KerningEntry, FALLBACK_CODEPOINT};
use crate::rasterizer::{RasterizedGlyph, Rasterizer};
use crate::{AtlasError, Result};
use rustc_hash::FxHashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Left-hand codepoints checked when extracting kerning pairs
const KERNING_RANGE: RangeInclusive<u32> = 0x20..=0x24F;

/// Font metrics in font units
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    /// Units per em (typically 1000 or 2048)
    pub units_per_em: u16,
    /// Ascender (distance from baseline to top of tallest glyph)
    pub ascender: i16,
    /// Descender (distance from baseline to bottom, typically negative)
    pub descender: i16,
    /// Line gap (additional spacing between lines)
    pub line_gap: i16,
}

impl FontMetrics {
    /// Scale a value from font units to pixels
    pub fn scale(&self, value: i16, font_size: f32) -> f32 {
        value as f32 * font_size / self.units_per_em as f32
    }

    /// Get ascender in pixels
    pub fn ascender_px(&self, font_size: f32) -> f32 {
        self.scale(self.ascender, font_size)
    }

    /// Get line height in pixels
    pub fn line_height_px(&self, font_size: f32) -> f32 {
        self.scale(self.ascender - self.descender + self.line_gap, font_size)
    }
}

/// Unicode codepoint to glyph id mapping, resolved once at load time
#[derive(Debug, Default)]
struct CharacterMap {
    glyphs: FxHashMap<u32, u16>,
    highest_codepoint: u32,
}

impl CharacterMap {
    /// Record a mapping; notdef is ignored and earlier subtables win
    fn insert(&mut self, codepoint: u32, glyph_id: u16) {
        if glyph_id == 0 {
            return;
        }
        self.glyphs.entry(codepoint).or_insert(glyph_id);
        self.highest_codepoint = self.highest_codepoint.max(codepoint);
    }

    fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.glyphs.get(&codepoint).copied()
    }

    fn len(&self) -> u32 {
        self.glyphs.len() as u32
    }
}

/// A parsed font face
pub struct FontFace {
    /// Raw font data (kept alive for ttf-parser and swash)
    data: Arc<Vec<u8>>,
    /// Face index within the font file (for TTC files)
    face_index: u32,
    metrics: FontMetrics,
    family_name: String,
    cmap: CharacterMap,
}

impl FontFace {
    /// Load a font from raw TTF/OTF data (uses face index 0)
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    /// Load a font from raw TTF/OTF data with a specific face index
    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let data = Arc::new(data);

        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| AtlasError::FontParseError(format!("{:?}", e)))?;

        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        };

        let family_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        // Union of all Unicode subtables
        let mut covered = CharacterMap::default();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|codepoint| {
                    if let Some(id) = subtable.glyph_index(codepoint) {
                        covered.insert(codepoint, id.0);
                    }
                });
            }
        }

        tracing::debug!(
            "Parsed font '{}': {} codepoints, highest U+{:04X}",
            family_name,
            covered.len(),
            covered.highest_codepoint
        );

        Ok(Self {
            cmap: covered,
            data,
            face_index,
            metrics,
            family_name,
        })
    }

    /// Load a font from a file path
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| AtlasError::FontLoadError(format!("Failed to read file: {}", e)))?;
        Self::from_data(data)
    }

    /// Get font metrics
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Get font family name
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Get raw font data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get face index within the font file
    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Number of Unicode codepoints with a real glyph
    pub fn codepoint_count(&self) -> u32 {
        self.cmap.len()
    }

    /// Highest Unicode codepoint with a real glyph
    pub fn highest_codepoint(&self) -> u32 {
        self.cmap.highest_codepoint
    }

    fn as_ttf_face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }

    /// Get glyph ID for a codepoint; unmapped codepoints return `None`
    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.cmap.glyph_id(codepoint)
    }

    /// Horizontal kerning pairs from the `kern` table, scaled to `font_size` pixels
    ///
    /// Only pairs whose left codepoint is in the Latin range are checked; the
    /// right side covers the same range.
    pub fn kerning_pairs(&self, font_size: f32) -> Vec<KerningEntry> {
        let Some(face) = self.as_ttf_face() else {
            return Vec::new();
        };
        let Some(kern) = face.tables().kern else {
            return Vec::new();
        };

        let mapped: Vec<(u32, ttf_parser::GlyphId)> = KERNING_RANGE
            .filter_map(|cp| Some((cp, ttf_parser::GlyphId(self.glyph_id(cp)?))))
            .collect();

        let mut pairs = Vec::new();
        for subtable in kern.subtables {
            if !subtable.horizontal || subtable.variable || subtable.has_cross_stream {
                continue;
            }
            for &(prev, left) in &mapped {
                for &(next, right) in &mapped {
                    let Some(units) = subtable.glyphs_kerning(left, right) else {
                        continue;
                    };
                    let value = self.metrics.scale(units, font_size).round() as i16;
                    if value != 0 {
                        pairs.push(KerningEntry::new(prev, next, value));
                    }
                }
            }
        }
        pairs
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family_name", &self.family_name)
            .field("face_index", &self.face_index)
            .field("codepoint_count", &self.cmap.len())
            .finish()
    }
}

/// Glyph rasterizer using swash at a fixed pixel size
pub struct SwashRasterizer {
    font: FontFace,
    font_size: f32,
    /// Swash scale context (caches scaling state)
    scale_context: ScaleContext,
}

impl SwashRasterizer {
    /// Create a rasterizer for `font` at `font_size` pixels per em
    pub fn new(font: FontFace, font_size: f32) -> Self {
        Self {
            font,
            font_size,
            scale_context: ScaleContext::new(),
        }
    }

    pub fn font(&self) -> &FontFace {
        &self.font
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    fn render(&mut self, glyph_id: u16) -> Option<RasterizedGlyph> {
        let swash_font =
            swash::FontRef::from_index(self.font.data(), self.font.face_index() as usize)?;

        let mut scaler = self
            .scale_context
            .builder(swash_font)
            .size(self.font_size)
            .hint(true)
            .build();

        let metrics = swash_font.metrics(&[]);
        let scale = self.font_size / metrics.units_per_em as f32;
        let advance = swash_font.glyph_metrics(&[]).advance_width(glyph_id) * scale;
        // Offsets are measured from the cell top, which sits on the ascender line
        let ascent = self.font.metrics().ascender_px(self.font_size).round() as i32;

        let mut render = Render::new(&[Source::Outline, Source::Bitmap(StrikeWith::BestFit)]);
        render.format(Format::Alpha);

        match render.render(&mut scaler, glyph_id) {
            Some(img) if matches!(img.content, Content::Mask) => Some(RasterizedGlyph {
                width: img.placement.width,
                height: img.placement.height,
                offset_x: img.placement.left as i16,
                offset_y: (ascent - img.placement.top) as i16,
                advance_x: advance.round() as i16,
                bitmap: img.data,
            }),
            Some(_) => {
                tracing::trace!("Skipping non-mask image for glyph {}", glyph_id);
                None
            }
            // Empty glyph (like space) - no bitmap but has advance
            None => Some(RasterizedGlyph {
                advance_x: advance.round() as i16,
                ..Default::default()
            }),
        }
    }
}

impl Rasterizer for SwashRasterizer {
    fn rasterize(&mut self, codepoint: u32) -> Option<RasterizedGlyph> {
        let glyph_id = if codepoint == FALLBACK_CODEPOINT {
            0
        } else {
            self.font.glyph_id(codepoint)?
        };
        self.render(glyph_id)
    }

    fn has_glyph(&self, codepoint: u32) -> bool {
        self.font.glyph_id(codepoint).is_some()
    }

    fn glyph_count(&self) -> u32 {
        self.font.codepoint_count()
    }

    fn highest_codepoint(&self) -> u32 {
        self.font.highest_codepoint()
    }

    fn kerning_pairs(&self) -> Vec<KerningEntry> {
        self.font.kerning_pairs(self.font_size)
    }
}

impl std::fmt::Debug for SwashRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwashRasterizer")
            .field("font", &self.font)
            .field("font_size", &self.font_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_data_is_rejected() {
        let err = FontFace::from_data(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, AtlasError::FontParseError(_)));
    }

    #[test]
    fn test_missing_font_file() {
        let err = FontFace::from_file(std::path::Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, AtlasError::FontLoadError(_)));
    }

    #[test]
    fn test_character_map_lookup() {
        let mut cmap = CharacterMap::default();
        cmap.insert('A' as u32, 36);
        cmap.insert(0x4E2D, 900);
        // Notdef mappings don't count as coverage
        cmap.insert(0x1F600, 0);
        // A later subtable cannot override an earlier mapping
        cmap.insert('A' as u32, 7);

        assert_eq!(cmap.glyph_id('A' as u32), Some(36));
        assert_eq!(cmap.glyph_id(0x4E2D), Some(900));
        assert_eq!(cmap.glyph_id(0x1F600), None);
        assert_eq!(cmap.glyph_id('B' as u32), None);
        assert_eq!(cmap.len(), 2);
        assert_eq!(cmap.highest_codepoint, 0x4E2D);
    }

    #[test]
    fn test_metrics_scaling() {
        let metrics = FontMetrics {
            units_per_em: 2048,
            ascender: 1536,
            descender: -512,
            line_gap: 0,
        };
        assert_eq!(metrics.ascender_px(16.0), 12.0);
        assert_eq!(metrics.line_height_px(16.0), 16.0);
    }
}
