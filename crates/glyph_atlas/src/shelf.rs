//! Shelf packing for the pixel page
//!
//! Each shelf is one horizontal strip of the page. Requests are appended at
//! the right end of a shelf whose height is within `max_shelf_ratio` of the
//! request, preferring the highest ratio; when no shelf qualifies, a new one
//! is opened below the last. The page grows in powers
//! of two whenever a placement crosses its current edge.

use crate::config::AtlasConfig;
use crate::glyph::AtlasRect;
use crate::page::PixelPage;
use crate::{AtlasError, Result};

/// Row-based allocator for rectangles inside a [`PixelPage`]
#[derive(Debug)]
pub struct ShelfAllocator {
    /// Packed rows, top to bottom. Each spans `[0, right) × [top, bottom)`.
    shelves: Vec<AtlasRect>,
    starting_size: u32,
    /// Tallest shelf (relative to the request) still considered a fit
    max_shelf_ratio: f32,
    /// Extra height given to a new shelf so slightly taller glyphs can join it later
    row_height_factor: f32,
    max_texture_size: u32,
}

impl ShelfAllocator {
    /// Create an allocator with no shelves
    pub fn new(config: &AtlasConfig) -> Self {
        let config = config.normalized();
        Self {
            shelves: Vec::new(),
            starting_size: config.starting_size,
            max_shelf_ratio: config.max_shelf_ratio,
            row_height_factor: config.row_height_factor,
            max_texture_size: config.max_texture_size,
        }
    }

    /// Current shelves, top to bottom
    pub fn shelves(&self) -> &[AtlasRect] {
        &self.shelves
    }

    /// Largest page dimension this allocator will grow to
    pub fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    /// Claim a `width × height` region, growing `page` if needed
    ///
    /// Zero-sized requests are treated as one pixel so every shelf keeps a
    /// nonzero height. Fails only when the page would have to exceed the
    /// maximum texture size. On failure the shelves and the page size are
    /// left unchanged.
    pub fn allocate(&mut self, page: &mut PixelPage, width: u32, height: u32) -> Result<AtlasRect> {
        let width = width.max(1);
        let height = height.max(1);
        if width > self.max_texture_size || height > self.max_texture_size {
            return Err(AtlasError::AtlasExhausted {
                width,
                height,
                max: self.max_texture_size,
            });
        }

        page.ensure_initialized(self.starting_size);
        let (page_width, page_height) = page.dimensions();

        let (index, shelf) = match self.best_shelf(page_width, width, height) {
            Some(index) => (Some(index), self.shelves[index]),
            None => {
                let top = self.shelves.last().map(|s| s.bottom()).unwrap_or(0);
                let shelf_height = ((height as f32 * self.row_height_factor).ceil() as u32)
                    .min(self.max_texture_size);
                (None, AtlasRect::new(0, top, 0, shelf_height.max(height)))
            }
        };

        let mut extended = shelf;
        extended.width += width;

        let new_width = if extended.right() > page_width {
            extended.right().next_power_of_two()
        } else {
            page_width
        };
        let new_height = if extended.bottom() > page_height {
            extended.bottom().next_power_of_two()
        } else {
            page_height
        };

        if new_width > self.max_texture_size || new_height > self.max_texture_size {
            return Err(AtlasError::AtlasExhausted {
                width: new_width,
                height: new_height,
                max: self.max_texture_size,
            });
        }

        if (new_width, new_height) != (page_width, page_height) {
            page.grow_to(new_width, new_height);
        }

        match index {
            Some(index) => self.shelves[index] = extended,
            None => {
                tracing::trace!(
                    "Opened shelf at y={} with height {}",
                    extended.y,
                    extended.height
                );
                self.shelves.push(extended);
            }
        }

        Ok(AtlasRect::new(
            extended.right() - width,
            extended.y,
            width,
            extended.height,
        ))
    }

    /// Pick the existing shelf with the highest height ratio in `[1, max_shelf_ratio]`
    /// that still has room for `width` on its right
    fn best_shelf(&self, page_width: u32, width: u32, height: u32) -> Option<usize> {
        let height = height.max(1) as f32;
        let mut best: Option<(usize, f32)> = None;

        for (i, shelf) in self.shelves.iter().enumerate() {
            let ratio = shelf.height as f32 / height;
            if !(1.0..=self.max_shelf_ratio).contains(&ratio) {
                continue;
            }
            if shelf.right() + width > page_width {
                continue;
            }
            if best.map_or(true, |(_, best_ratio)| ratio > best_ratio) {
                best = Some((i, ratio));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Fraction of the page area claimed by shelves (0.0 to 1.0)
    pub fn utilization(&self, page: &PixelPage) -> f32 {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return 0.0;
        }
        let used: u64 = self
            .shelves
            .iter()
            .map(|s| s.width as u64 * s.height as u64)
            .sum();
        used as f32 / (width as u64 * height as u64) as f32
    }

    /// Forget every shelf
    pub fn reset(&mut self) {
        self.shelves.clear();
    }
}
