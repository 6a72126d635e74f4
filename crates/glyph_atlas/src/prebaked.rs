//! Prebaked atlases
//!
//! A [`PrebakedFont`] is a complete glyph table plus the atlas image it
//! refers to, rasterized ahead of time. It is produced by
//! [`AtlasCache::bake`](crate::AtlasCache::bake) and consumed by
//! [`AtlasCache::from_prebaked`](crate::AtlasCache::from_prebaked). Byte
//! layout on disk is left to whatever serde format the caller picks.

use crate::config::AtlasConfig;
use crate::glyph::{Glyph, KerningEntry};
use crate::{AtlasError, Result};
use serde::{Deserialize, Serialize};

/// Immutable glyph set with its atlas image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrebakedFont {
    /// Human-readable font name
    pub name: String,
    /// Distinct codepoints the source font covered
    pub glyph_count: u32,
    /// Codepoints above this resolve to the fallback without a lookup
    pub highest_codepoint: u32,
    /// Glyph shown for anything missing from `glyphs`
    pub fallback: Glyph,
    /// Settings the glyphs were packed with, padding in particular
    #[serde(default)]
    pub config: AtlasConfig,
    /// Flat `(codepoint, glyph)` table
    pub glyphs: Vec<(u32, Glyph)>,
    /// Flat `(prev, next, value)` kerning triples
    pub kerning: Vec<KerningEntry>,
    /// Atlas image width in pixels
    pub width: u32,
    /// Atlas image height in pixels
    pub height: u32,
    /// Single-channel atlas pixels, row-major
    pub pixels: Vec<u8>,
}

impl PrebakedFont {
    /// Check that the image and every glyph rectangle are consistent
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if self.pixels.len() != expected {
            return Err(AtlasError::InvalidPrebaked(format!(
                "image is {} bytes, expected {}x{} = {}",
                self.pixels.len(),
                self.width,
                self.height,
                expected
            )));
        }

        let out_of_bounds = self
            .glyphs
            .iter()
            .map(|(codepoint, glyph)| (*codepoint, *glyph))
            .chain(std::iter::once((crate::FALLBACK_CODEPOINT, self.fallback)))
            .find(|(_, glyph)| {
                let rect = glyph.rect();
                !rect.is_empty() && (rect.right() > self.width || rect.bottom() > self.height)
            });

        if let Some((codepoint, glyph)) = out_of_bounds {
            return Err(AtlasError::InvalidPrebaked(format!(
                "glyph U+{:04X} at {:?} lies outside the {}x{} image",
                codepoint,
                glyph.rect(),
                self.width,
                self.height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prebaked() -> PrebakedFont {
        PrebakedFont {
            name: "Test".to_string(),
            glyph_count: 1,
            highest_codepoint: 'A' as u32,
            fallback: Glyph::default(),
            config: AtlasConfig::default(),
            glyphs: vec![(
                'A' as u32,
                Glyph {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                    ..Default::default()
                },
            )],
            kerning: Vec::new(),
            width: 4,
            height: 4,
            pixels: vec![0; 16],
        }
    }

    #[test]
    fn test_valid_image() {
        assert!(prebaked().validate().is_ok());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let mut value = serde_json::to_value(prebaked()).unwrap();
        value.as_object_mut().unwrap().remove("config");
        let font: PrebakedFont = serde_json::from_value(value).unwrap();
        assert_eq!(font.config, AtlasConfig::default());
    }

    #[test]
    fn test_image_size_mismatch() {
        let mut font = prebaked();
        font.pixels.pop();
        assert!(matches!(font.validate(), Err(AtlasError::InvalidPrebaked(_))));
    }

    #[test]
    fn test_glyph_outside_image() {
        let mut font = prebaked();
        font.glyphs[0].1.x = 1;
        assert!(matches!(font.validate(), Err(AtlasError::InvalidPrebaked(_))));
    }
}
