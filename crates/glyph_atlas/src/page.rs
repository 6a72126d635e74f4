//! Single-channel pixel storage backing the atlas

use crate::glyph::AtlasRect;

/// Monochrome pixel buffer that grows without moving existing content
///
/// Width and height stay at 0 until the first allocation initializes the
/// page. Every mutation sets the dirty flag so the caller knows to re-upload.
#[derive(Default)]
pub struct PixelPage {
    width: u32,
    height: u32,
    /// Row-major 8-bit coverage, `width * height` bytes
    pixels: Vec<u8>,
    dirty: bool,
}

impl PixelPage {
    /// Create an uninitialized page
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing image (prebaked atlases)
    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
            dirty: true,
        }
    }

    /// Page dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_initialized(&self) -> bool {
        self.width != 0 && self.height != 0
    }

    /// Check if the page has been modified since the last [`consume_dirty`](Self::consume_dirty)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Allocate a zeroed `starting_size × starting_size` buffer if the page is still empty
    pub fn ensure_initialized(&mut self, starting_size: u32) {
        if self.is_initialized() {
            return;
        }
        let size = starting_size.max(1);
        self.width = size;
        self.height = size;
        self.pixels = vec![0; size as usize * size as usize];
        self.dirty = true;
    }

    /// Reallocate to a larger size, keeping the old content in the top-left corner
    pub fn grow_to(&mut self, new_width: u32, new_height: u32) {
        assert!(
            new_width >= self.width && new_height >= self.height,
            "pixel page cannot shrink ({}x{} -> {}x{})",
            self.width,
            self.height,
            new_width,
            new_height
        );

        let old_stride = self.width as usize;
        let new_stride = new_width as usize;
        let mut pixels = vec![0u8; new_stride * new_height as usize];

        if old_stride > 0 {
            for (y, row) in self.pixels.chunks_exact(old_stride).enumerate() {
                let dst = y * new_stride;
                pixels[dst..dst + old_stride].copy_from_slice(row);
            }
        }

        tracing::debug!(
            "Pixel page grew from {}x{} to {}x{}",
            self.width,
            self.height,
            new_width,
            new_height
        );

        self.width = new_width;
        self.height = new_height;
        self.pixels = pixels;
        self.dirty = true;
    }

    /// Copy a `rect.width × rect.height` bitmap into the page at `rect`'s corner
    ///
    /// Panics if the rectangle does not lie inside the page or the bitmap is
    /// too short: the allocator only hands out placements that fit, so either
    /// case is a bug rather than bad input.
    pub fn write(&mut self, rect: AtlasRect, bitmap: &[u8]) {
        assert!(
            rect.right() <= self.width && rect.bottom() <= self.height,
            "blit {:?} outside {}x{} page",
            rect,
            self.width,
            self.height
        );
        let row_len = rect.width as usize;
        assert!(
            bitmap.len() >= row_len * rect.height as usize,
            "bitmap of {} bytes is smaller than {}x{}",
            bitmap.len(),
            rect.width,
            rect.height
        );

        if row_len == 0 {
            return;
        }

        let stride = self.width as usize;
        for (row, src) in bitmap
            .chunks_exact(row_len)
            .take(rect.height as usize)
            .enumerate()
        {
            let dst = (rect.y as usize + row) * stride + rect.x as usize;
            self.pixels[dst..dst + row_len].copy_from_slice(src);
        }
        self.dirty = true;
    }

    /// Return and clear the dirty flag
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Free the buffer and return to the uninitialized state
    pub fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
        self.dirty = true;
    }

    /// Copy out a rectangle of pixels (row-major)
    pub fn read(&self, rect: AtlasRect) -> Vec<u8> {
        let stride = self.width as usize;
        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize);
        for y in rect.y..rect.bottom() {
            let start = y as usize * stride + rect.x as usize;
            out.extend_from_slice(&self.pixels[start..start + rect.width as usize]);
        }
        out
    }
}

impl std::fmt::Debug for PixelPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelPage")
            .field("dimensions", &(self.width, self.height))
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_initialization() {
        let mut page = PixelPage::new();
        assert_eq!(page.dimensions(), (0, 0));
        assert!(!page.is_initialized());

        page.ensure_initialized(128);
        assert_eq!(page.dimensions(), (128, 128));
        assert_eq!(page.pixels().len(), 128 * 128);
        assert!(page.pixels().iter().all(|&p| p == 0));
        assert!(page.consume_dirty());
        assert!(!page.consume_dirty());

        // Second call is a no-op
        page.ensure_initialized(512);
        assert_eq!(page.dimensions(), (128, 128));
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_zero_starting_size_is_clamped() {
        let mut page = PixelPage::new();
        page.ensure_initialized(0);
        assert_eq!(page.dimensions(), (1, 1));
    }

    #[test]
    fn test_write_and_read() {
        let mut page = PixelPage::new();
        page.ensure_initialized(8);
        page.consume_dirty();

        let rect = AtlasRect::new(2, 3, 3, 2);
        page.write(rect, &[1, 2, 3, 4, 5, 6]);
        assert!(page.is_dirty());
        assert_eq!(page.read(rect), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(page.pixels()[3 * 8 + 2], 1);
        assert_eq!(page.pixels()[4 * 8 + 4], 6);
        assert_eq!(page.pixels()[3 * 8 + 1], 0);
    }

    #[test]
    fn test_growth_preserves_content() {
        let mut page = PixelPage::new();
        page.ensure_initialized(4);
        let rect = AtlasRect::new(1, 1, 3, 3);
        let bitmap: Vec<u8> = (1..=9).collect();
        page.write(rect, &bitmap);
        let before = page.pixels().to_vec();

        page.grow_to(8, 16);
        assert_eq!(page.dimensions(), (8, 16));
        assert_eq!(page.read(rect), bitmap);
        assert_eq!(page.read(AtlasRect::new(0, 0, 4, 4)), before);
        // New area is zeroed
        assert!(page.read(AtlasRect::new(4, 0, 4, 16)).iter().all(|&p| p == 0));
        assert!(page.read(AtlasRect::new(0, 4, 8, 12)).iter().all(|&p| p == 0));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_bounds_write_panics() {
        let mut page = PixelPage::new();
        page.ensure_initialized(4);
        page.write(AtlasRect::new(3, 3, 2, 2), &[0; 4]);
    }

    #[test]
    fn test_reset() {
        let mut page = PixelPage::new();
        page.ensure_initialized(16);
        page.consume_dirty();
        page.reset();
        assert_eq!(page.dimensions(), (0, 0));
        assert!(page.pixels().is_empty());
        assert!(page.is_dirty());
    }
}
