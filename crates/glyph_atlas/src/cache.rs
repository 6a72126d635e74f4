//! Glyph atlas cache
//!
//! [`AtlasCache`] ties the pieces together: lookups go to the
//! [`GlyphStore`], misses are rasterized on demand, placed by the
//! [`ShelfAllocator`] and blitted into the [`PixelPage`]. Anything that
//! cannot be provided resolves to the font's own missing-glyph shape.

use crate::config::AtlasConfig;
use crate::glyph::{AtlasRect, Glyph, FALLBACK_CODEPOINT};
use crate::page::PixelPage;
use crate::prebaked::PrebakedFont;
use crate::rasterizer::{RasterizedGlyph, Rasterizer};
use crate::shelf::ShelfAllocator;
use crate::store::GlyphStore;
use crate::Result;

/// Snapshot of atlas occupancy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasStats {
    pub width: u32,
    pub height: u32,
    pub glyph_count: u32,
    pub loaded_glyph_count: u32,
    pub shelf_count: usize,
    pub kerning_pairs: usize,
    /// Fraction of the page claimed by shelves
    pub utilization: f32,
}

/// Lazily populated glyph atlas for one font at one size
///
/// Built either around a [`Rasterizer`] (dynamic mode, glyphs are packed on
/// first use) or from a [`PrebakedFont`] (immutable, misses always resolve
/// to the fallback glyph).
pub struct AtlasCache<R = Box<dyn Rasterizer>> {
    /// `None` for prebaked atlases
    rasterizer: Option<R>,
    config: AtlasConfig,
    page: PixelPage,
    allocator: ShelfAllocator,
    store: GlyphStore,
    fallback: Glyph,
}

impl<R: Rasterizer> AtlasCache<R> {
    /// Create a dynamic atlas and resolve its fallback glyph
    pub fn new(rasterizer: R, config: AtlasConfig) -> Self {
        let config = config.normalized();
        let mut cache = Self {
            rasterizer: Some(rasterizer),
            allocator: ShelfAllocator::new(&config),
            config,
            page: PixelPage::new(),
            store: GlyphStore::new(),
            fallback: Glyph::default(),
        };
        cache.initialize();
        cache
    }

    /// Create an immutable atlas from a prebaked glyph table and image
    pub fn from_prebaked(font: PrebakedFont) -> Result<Self> {
        font.validate()?;

        let mut store = GlyphStore::new();
        store.set_bounds(font.glyph_count, font.highest_codepoint);
        for (codepoint, glyph) in &font.glyphs {
            store.insert(*codepoint, *glyph);
        }
        store.bulk_load_kerning(font.kerning.iter().copied());

        tracing::debug!(
            "Loaded prebaked font '{}': {} glyphs, {} kerning pairs, {}x{} image",
            font.name,
            font.glyphs.len(),
            store.kerning_len(),
            font.width,
            font.height
        );

        let config = font.config.normalized();
        Ok(Self {
            rasterizer: None,
            allocator: ShelfAllocator::new(&config),
            config,
            page: PixelPage::from_pixels(font.width, font.height, font.pixels),
            store,
            fallback: font.fallback,
        })
    }

    /// Load font bounds and kerning, then resolve the fallback glyph
    fn initialize(&mut self) {
        let Some(rasterizer) = self.rasterizer.as_ref() else {
            return;
        };
        self.store
            .set_bounds(rasterizer.glyph_count(), rasterizer.highest_codepoint());
        let kerning = rasterizer.kerning_pairs();
        self.store.bulk_load_kerning(kerning);

        self.fallback = Glyph::default();
        self.fallback = self.load(FALLBACK_CODEPOINT).unwrap_or_else(|| {
            tracing::warn!("Rasterizer produced no missing-glyph shape; fallback is empty");
            Glyph::default()
        });
    }

    /// Get the glyph for a codepoint, rasterizing and packing it on first use
    ///
    /// Never fails: codepoints the font lacks, or that no longer fit in the
    /// atlas, return the fallback glyph.
    pub fn get_glyph(&mut self, codepoint: u32) -> Glyph {
        if codepoint > self.store.highest_glyph_codepoint() || codepoint == FALLBACK_CODEPOINT {
            return self.fallback;
        }
        if let Some(glyph) = self.store.lookup(codepoint) {
            return glyph;
        }

        // Misses are not remembered; the rasterizer is asked again next time
        match self.load(codepoint) {
            Some(glyph) => {
                self.store.insert(codepoint, glyph);
                glyph
            }
            None => self.fallback,
        }
    }

    /// Rasterize ahead of a batched draw
    pub fn preload_range(&mut self, first: u32, last: u32) {
        for codepoint in first..=last {
            self.get_glyph(codepoint);
        }
    }

    /// Rasterize every character of `text`
    pub fn preload_string(&mut self, text: &str) {
        for c in text.chars() {
            self.get_glyph(c as u32);
        }
    }

    /// Whether the codepoint resolves to a real glyph rather than the fallback
    pub fn has_glyph(&self, codepoint: u32) -> bool {
        if codepoint > self.store.highest_glyph_codepoint() {
            return false;
        }
        self.store.lookup(codepoint).is_some()
            || self
                .rasterizer
                .as_ref()
                .is_some_and(|r| r.has_glyph(codepoint))
    }

    /// Kerning adjustment between two consecutive codepoints
    pub fn kerning(&self, prev: u32, next: u32) -> i16 {
        self.store.lookup_kerning(prev, next)
    }

    /// Forget every packed glyph and free the page
    ///
    /// Bounds, kerning and the fallback glyph are re-established from the
    /// rasterizer. Prebaked atlases are immutable and ignore this.
    pub fn clear_texture(&mut self) {
        if self.rasterizer.is_none() {
            tracing::debug!("Ignoring clear on prebaked atlas");
            return;
        }
        tracing::debug!(
            "Clearing atlas ({} glyphs loaded, {}x{})",
            self.store.loaded_glyph_count(),
            self.page.dimensions().0,
            self.page.dimensions().1
        );
        self.page.reset();
        self.allocator.reset();
        self.store.reset();
        self.initialize();
    }

    /// Rasterize and pack one codepoint without recording it
    fn load(&mut self, codepoint: u32) -> Option<Glyph> {
        let raster = self.rasterizer.as_mut()?.rasterize(codepoint)?;
        self.pack(codepoint, raster)
    }

    fn pack(&mut self, codepoint: u32, raster: RasterizedGlyph) -> Option<Glyph> {
        if raster.width == 0 || raster.height == 0 {
            return Some(Glyph {
                offset_x: raster.offset_x,
                offset_y: raster.offset_y,
                advance_x: raster.advance_x,
                ..Default::default()
            });
        }

        if raster.bitmap.len() < raster.width as usize * raster.height as usize {
            tracing::warn!(
                "Rasterizer returned {} bytes for a {}x{} glyph U+{:04X}",
                raster.bitmap.len(),
                raster.width,
                raster.height,
                codepoint
            );
            return None;
        }

        let padding = self.config.padding;
        let padded = padding.checked_mul(2).and_then(|border| {
            Some((
                raster.width.checked_add(border)?,
                raster.height.checked_add(border)?,
            ))
        });
        let Some((width, height)) = padded else {
            tracing::warn!(
                "Glyph U+{:04X} is too large to pad: {}x{} with {} px padding",
                codepoint,
                raster.width,
                raster.height,
                padding
            );
            return None;
        };

        let placement = match self.allocator.allocate(&mut self.page, width, height) {
            Ok(rect) => rect,
            Err(err) => {
                tracing::warn!("Cannot place glyph U+{:04X}: {}", codepoint, err);
                return None;
            }
        };

        let inner = AtlasRect::new(
            placement.x + padding,
            placement.y + padding,
            raster.width,
            raster.height,
        );
        self.page.write(inner, &raster.bitmap);

        let padding = i16::try_from(padding).unwrap_or(i16::MAX);
        Some(Glyph {
            x: placement.x as u16,
            y: placement.y as u16,
            width: width as u16,
            height: height as u16,
            offset_x: raster.offset_x.saturating_sub(padding),
            offset_y: raster.offset_y.saturating_sub(padding),
            advance_x: raster.advance_x,
        })
    }

    /// Snapshot the loaded glyphs, kerning and image into a prebaked font
    pub fn bake(&self, name: impl Into<String>) -> PrebakedFont {
        let mut glyphs: Vec<(u32, Glyph)> = self.store.iter().collect();
        glyphs.sort_unstable_by_key(|(codepoint, _)| *codepoint);
        let mut kerning: Vec<_> = self.store.kerning_entries().collect();
        kerning.sort_unstable_by_key(|k| (k.prev, k.next));
        let (width, height) = self.page.dimensions();

        PrebakedFont {
            name: name.into(),
            glyph_count: self.store.glyph_count(),
            highest_codepoint: self.store.highest_glyph_codepoint(),
            fallback: self.fallback,
            config: self.config,
            glyphs,
            kerning,
            width,
            height,
            pixels: self.page.pixels().to_vec(),
        }
    }

    /// Glyph returned for anything the atlas cannot provide
    pub fn fallback(&self) -> Glyph {
        self.fallback
    }

    pub fn is_prebaked(&self) -> bool {
        self.rasterizer.is_none()
    }

    /// The rasterizer backing a dynamic atlas
    pub fn rasterizer(&self) -> Option<&R> {
        self.rasterizer.as_ref()
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The pixel page
    pub fn page(&self) -> &PixelPage {
        &self.page
    }

    /// Get atlas dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.page.dimensions()
    }

    /// Get atlas pixel data for GPU upload
    pub fn pixels(&self) -> &[u8] {
        self.page.pixels()
    }

    /// Check if atlas needs GPU upload
    pub fn is_dirty(&self) -> bool {
        self.page.is_dirty()
    }

    /// Return and clear the page's dirty flag
    pub fn consume_dirty(&mut self) -> bool {
        self.page.consume_dirty()
    }

    pub fn glyph_count(&self) -> u32 {
        self.store.glyph_count()
    }

    pub fn loaded_glyph_count(&self) -> u32 {
        self.store.loaded_glyph_count()
    }

    pub fn highest_glyph_codepoint(&self) -> u32 {
        self.store.highest_glyph_codepoint()
    }

    pub fn stats(&self) -> AtlasStats {
        let (width, height) = self.page.dimensions();
        AtlasStats {
            width,
            height,
            glyph_count: self.store.glyph_count(),
            loaded_glyph_count: self.store.loaded_glyph_count(),
            shelf_count: self.allocator.shelves().len(),
            kerning_pairs: self.store.kerning_len(),
            utilization: self.allocator.utilization(&self.page),
        }
    }
}

impl<R> std::fmt::Debug for AtlasCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasCache")
            .field("prebaked", &self.rasterizer.is_none())
            .field("page", &self.page)
            .field("store", &self.store)
            .field("shelves", &self.allocator.shelves().len())
            .finish()
    }
}
