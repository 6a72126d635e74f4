//! Atlas tuning parameters

use serde::{Deserialize, Serialize};

/// Largest page side whose coordinates and sizes all fit in a glyph's `u16` fields
pub const MAX_PAGE_SIZE: u32 = 32768;

/// Largest padding for which a padded glyph can still fit a page and the
/// reduced bearing still fits an `i16`
pub const MAX_PADDING: u32 = MAX_PAGE_SIZE / 2;

/// Construction-time settings for an [`AtlasCache`](crate::AtlasCache)
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Side length of the page created on first allocation
    pub starting_size: u32,
    /// Empty pixels reserved on every side of each glyph
    pub padding: u32,
    /// Tallest shelf, relative to a request's height, that may take it
    pub max_shelf_ratio: f32,
    /// Height multiplier applied when opening a new shelf
    pub row_height_factor: f32,
    /// Largest texture dimension supported by the graphics device
    pub max_texture_size: u32,
}

impl AtlasConfig {
    /// Clamp degenerate values instead of rejecting them
    ///
    /// The starting size is rounded up to a power of two so that every page
    /// the allocator grows stays a power of two in both dimensions.
    pub fn normalized(&self) -> Self {
        let starting_size = self.starting_size.clamp(1, MAX_PAGE_SIZE).next_power_of_two();
        Self {
            starting_size,
            padding: self.padding.clamp(1, MAX_PADDING),
            max_shelf_ratio: self.max_shelf_ratio.max(1.0),
            row_height_factor: self.row_height_factor.max(1.0),
            max_texture_size: self.max_texture_size.clamp(starting_size, MAX_PAGE_SIZE),
        }
    }

    /// Builder-style override of the device texture limit
    pub fn with_max_texture_size(mut self, max_texture_size: u32) -> Self {
        self.max_texture_size = max_texture_size;
        self
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            starting_size: 128,
            padding: 1,
            max_shelf_ratio: 1.3,
            row_height_factor: 1.1,
            // Guaranteed minimum for 2D textures on desktop-class adapters
            max_texture_size: 8192,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_clamps_degenerate_values() {
        let config = AtlasConfig {
            starting_size: 0,
            padding: 0,
            max_shelf_ratio: 0.5,
            row_height_factor: f32::NAN,
            max_texture_size: 0,
        }
        .normalized();

        assert_eq!(config.starting_size, 1);
        assert_eq!(config.padding, 1);
        assert_eq!(config.max_shelf_ratio, 1.0);
        assert_eq!(config.row_height_factor, 1.0);
        assert_eq!(config.max_texture_size, 1);
    }

    #[test]
    fn test_texture_size_is_capped() {
        let config = AtlasConfig::default()
            .with_max_texture_size(1 << 20)
            .normalized();
        assert_eq!(config.max_texture_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_starting_size_rounds_up_to_power_of_two() {
        let config = AtlasConfig {
            starting_size: 100,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.starting_size, 128);

        let config = AtlasConfig {
            starting_size: u32::MAX,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.starting_size, MAX_PAGE_SIZE);
        assert_eq!(config.max_texture_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_padding_is_capped() {
        let config = AtlasConfig {
            padding: u32::MAX / 2 + 1,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.padding, MAX_PADDING);
        assert!(i16::try_from(config.padding).is_ok());
    }

    #[test]
    fn test_defaults_survive_normalization() {
        let config = AtlasConfig::default();
        assert_eq!(config.normalized(), config);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: AtlasConfig =
            serde_json::from_str(r#"{ "starting_size": 256, "max_texture_size": 2048 }"#).unwrap();
        assert_eq!(config.starting_size, 256);
        assert_eq!(config.max_texture_size, 2048);
        assert_eq!(config.padding, 1);
        assert_eq!(config.max_shelf_ratio, 1.3);
    }
}
