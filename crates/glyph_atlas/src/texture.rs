//! GPU mirror of the pixel page
//!
//! The atlas never talks to a graphics API. A [`TextureSink`] creates and
//! fills textures, and [`AtlasTexture`] decides when a new texture is needed.
//! Textures replaced after page growth may still be read by frames in
//! flight, so they go to a [`DeferredDestroyQueue`] instead of being dropped.

use crate::cache::AtlasCache;
use crate::rasterizer::Rasterizer;
use std::collections::VecDeque;

/// Graphics-side texture operations used to mirror the atlas
pub trait TextureSink {
    /// GPU texture handle
    type Texture;

    /// Create a single-channel 8-bit texture
    fn create_texture(&mut self, width: u32, height: u32) -> Self::Texture;

    /// Replace the full contents of `texture`
    fn upload(&mut self, texture: &Self::Texture, pixels: &[u8], width: u32, height: u32);
}

/// Resources waiting for the GPU to finish the frame that last used them
#[derive(Debug)]
pub struct DeferredDestroyQueue<T> {
    /// (frame retired on, resource), oldest first
    pending: VecDeque<(u64, T)>,
}

impl<T> DeferredDestroyQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Hold `resource` until `frame` is known to be complete
    pub fn retire(&mut self, resource: T, frame: u64) {
        self.pending.push_back((frame, resource));
    }

    /// Remove and return everything retired on or before `completed_frame`
    pub fn collect(&mut self, completed_frame: u64) -> Vec<T> {
        let mut released = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|(frame, _)| *frame <= completed_frame)
        {
            if let Some((_, resource)) = self.pending.pop_front() {
                released.push(resource);
            }
        }
        released
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for DeferredDestroyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-owned GPU texture tracking an [`AtlasCache`]'s pixel page
pub struct AtlasTexture<T> {
    texture: Option<T>,
    width: u32,
    height: u32,
}

impl<T> AtlasTexture<T> {
    pub fn new() -> Self {
        Self {
            texture: None,
            width: 0,
            height: 0,
        }
    }

    /// Current texture, if one has been created
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Upload the page if it changed since the last sync
    ///
    /// When the page size differs from the texture, a new texture is created
    /// and the old one is retired into `graveyard` tagged with `frame`.
    /// Returns whether anything was uploaded.
    pub fn sync<R, S>(
        &mut self,
        cache: &mut AtlasCache<R>,
        sink: &mut S,
        graveyard: &mut DeferredDestroyQueue<T>,
        frame: u64,
    ) -> bool
    where
        R: Rasterizer,
        S: TextureSink<Texture = T>,
    {
        if !cache.consume_dirty() {
            return false;
        }

        let (width, height) = cache.dimensions();
        if width == 0 || height == 0 {
            return false;
        }

        if self.texture.is_none() || (width, height) != (self.width, self.height) {
            let texture = sink.create_texture(width, height);
            if let Some(previous) = self.texture.replace(texture) {
                tracing::debug!(
                    "Atlas texture recreated at {}x{}; retiring {}x{} on frame {}",
                    width,
                    height,
                    self.width,
                    self.height,
                    frame
                );
                graveyard.retire(previous, frame);
            }
            self.width = width;
            self.height = height;
        }

        if let Some(texture) = &self.texture {
            sink.upload(texture, cache.pixels(), width, height);
        }
        true
    }
}

impl<T> Default for AtlasTexture<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::ScriptedRasterizer;
    use crate::config::AtlasConfig;

    #[derive(Default)]
    struct RecordingSink {
        next_id: u32,
        uploads: Vec<(u32, u32, u32, usize)>,
    }

    impl TextureSink for RecordingSink {
        type Texture = u32;

        fn create_texture(&mut self, _width: u32, _height: u32) -> u32 {
            self.next_id += 1;
            self.next_id
        }

        fn upload(&mut self, texture: &u32, pixels: &[u8], width: u32, height: u32) {
            self.uploads.push((*texture, width, height, pixels.len()));
        }
    }

    #[test]
    fn test_deferred_queue_releases_in_frame_order() {
        let mut queue = DeferredDestroyQueue::new();
        queue.retire("a", 1);
        queue.retire("b", 3);
        queue.retire("c", 5);

        assert!(queue.collect(0).is_empty());
        assert_eq!(queue.collect(3), vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.collect(10), vec!["c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sync_uploads_only_when_dirty() {
        let mut cache = AtlasCache::new(ScriptedRasterizer::latin(), AtlasConfig::default());
        let mut texture = AtlasTexture::new();
        let mut sink = RecordingSink::default();
        let mut graveyard = DeferredDestroyQueue::new();

        assert!(texture.sync(&mut cache, &mut sink, &mut graveyard, 0));
        assert_eq!(sink.uploads, vec![(1, 128, 128, 128 * 128)]);
        assert!(!texture.sync(&mut cache, &mut sink, &mut graveyard, 1));

        cache.get_glyph('A' as u32);
        assert!(texture.sync(&mut cache, &mut sink, &mut graveyard, 2));
        assert_eq!(sink.uploads.len(), 2);
        assert_eq!(texture.texture(), Some(&1));
        assert!(graveyard.is_empty());
    }

    #[test]
    fn test_growth_retires_previous_texture() {
        let mut cache = AtlasCache::new(ScriptedRasterizer::latin(), AtlasConfig::default());
        let mut texture = AtlasTexture::new();
        let mut sink = RecordingSink::default();
        let mut graveyard = DeferredDestroyQueue::new();
        texture.sync(&mut cache, &mut sink, &mut graveyard, 0);

        cache.get_glyph(ScriptedRasterizer::TALL);
        assert!(cache.dimensions().1 > 128);
        assert!(texture.sync(&mut cache, &mut sink, &mut graveyard, 7));

        assert_eq!(texture.texture(), Some(&2));
        assert_eq!(texture.dimensions(), cache.dimensions());
        assert_eq!(graveyard.len(), 1);
        assert!(graveyard.collect(6).is_empty());
        assert_eq!(graveyard.collect(7), vec![1]);
    }
}
