//! Codepoint to glyph lookup
//!
//! Two tiers: a fixed table indexed directly by codepoint covers Latin and
//! Latin Extended, and a hash map holds everything above it. A parallel map
//! keyed by the packed codepoint pair stores kerning.

use crate::glyph::{Glyph, GlyphFlags, KerningEntry};
use rustc_hash::FxHashMap;

/// Codepoints below this value live in the dense table
pub const DENSE_TABLE_SIZE: usize = 592;

#[derive(Debug, Clone, Copy, Default)]
struct DenseSlot {
    glyph: Glyph,
    flags: GlyphFlags,
}

fn kerning_key(prev: u32, next: u32) -> u64 {
    ((prev as u64) << 32) | next as u64
}

/// Two-tier glyph and kerning storage
pub struct GlyphStore {
    dense: Box<[DenseSlot; DENSE_TABLE_SIZE]>,
    /// Loaded glyphs at or above [`DENSE_TABLE_SIZE`]; membership means loaded
    sparse: FxHashMap<u32, Glyph>,
    kerning: FxHashMap<u64, i16>,
    /// Distinct codepoints the font can provide
    glyph_count: u32,
    loaded_glyph_count: u32,
    /// Codepoints above this are known to be absent
    highest_glyph_codepoint: u32,
    highest_left_kern_codepoint: u32,
}

impl GlyphStore {
    /// Create an empty store; nothing is considered present until bounds are set
    pub fn new() -> Self {
        Self {
            dense: Box::new([DenseSlot::default(); DENSE_TABLE_SIZE]),
            sparse: FxHashMap::default(),
            kerning: FxHashMap::default(),
            glyph_count: 0,
            loaded_glyph_count: 0,
            highest_glyph_codepoint: 0,
            highest_left_kern_codepoint: 0,
        }
    }

    /// Record how many codepoints the font covers and the highest of them
    pub fn set_bounds(&mut self, glyph_count: u32, highest_glyph_codepoint: u32) {
        self.glyph_count = glyph_count;
        self.highest_glyph_codepoint = highest_glyph_codepoint;
    }

    pub fn glyph_count(&self) -> u32 {
        self.glyph_count
    }

    pub fn loaded_glyph_count(&self) -> u32 {
        self.loaded_glyph_count
    }

    pub fn highest_glyph_codepoint(&self) -> u32 {
        self.highest_glyph_codepoint
    }

    pub fn highest_left_kern_codepoint(&self) -> u32 {
        self.highest_left_kern_codepoint
    }

    /// Number of stored kerning pairs
    pub fn kerning_len(&self) -> usize {
        self.kerning.len()
    }

    /// Look up a loaded glyph
    pub fn lookup(&self, codepoint: u32) -> Option<Glyph> {
        if codepoint > self.highest_glyph_codepoint {
            return None;
        }
        match self.dense.get(codepoint as usize) {
            Some(slot) => slot
                .flags
                .contains(GlyphFlags::IS_LOADED)
                .then_some(slot.glyph),
            None => self.sparse.get(&codepoint).copied(),
        }
    }

    /// Store a packed glyph, replacing any previous record for the codepoint
    pub fn insert(&mut self, codepoint: u32, glyph: Glyph) {
        let newly_loaded = match self.dense.get_mut(codepoint as usize) {
            Some(slot) => {
                let was_loaded = slot.flags.contains(GlyphFlags::IS_LOADED);
                slot.glyph = glyph;
                slot.flags |= GlyphFlags::IS_LOADED;
                !was_loaded
            }
            None => self.sparse.insert(codepoint, glyph).is_none(),
        };
        if newly_loaded {
            self.loaded_glyph_count += 1;
        }
    }

    /// Kerning adjustment between two codepoints, 0 if none
    pub fn lookup_kerning(&self, prev: u32, next: u32) -> i16 {
        if let Some(slot) = self.dense.get(prev as usize) {
            if !slot.flags.contains(GlyphFlags::HAS_LEFT_KERN) {
                return 0;
            }
        }
        if prev > self.highest_left_kern_codepoint {
            return 0;
        }
        self.kerning
            .get(&kerning_key(prev, next))
            .copied()
            .unwrap_or(0)
    }

    /// Record kerning pairs, dropping zero adjustments
    pub fn bulk_load_kerning(&mut self, entries: impl IntoIterator<Item = KerningEntry>) {
        for entry in entries {
            if entry.value == 0 {
                continue;
            }
            self.kerning
                .insert(kerning_key(entry.prev, entry.next), entry.value);
            if let Some(slot) = self.dense.get_mut(entry.prev as usize) {
                slot.flags |= GlyphFlags::HAS_LEFT_KERN;
            }
            self.highest_left_kern_codepoint = self.highest_left_kern_codepoint.max(entry.prev);
        }
    }

    /// All loaded glyphs, dense tier first then the sparse tier in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (u32, Glyph)> + '_ {
        let dense = self
            .dense
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.flags.contains(GlyphFlags::IS_LOADED))
            .map(|(codepoint, slot)| (codepoint as u32, slot.glyph));
        let sparse = self.sparse.iter().map(|(&codepoint, &glyph)| (codepoint, glyph));
        dense.chain(sparse)
    }

    /// All stored kerning pairs in arbitrary order
    pub fn kerning_entries(&self) -> impl Iterator<Item = KerningEntry> + '_ {
        self.kerning
            .iter()
            .map(|(&key, &value)| KerningEntry::new((key >> 32) as u32, key as u32, value))
    }

    /// Forget every glyph, kerning pair and counter
    pub fn reset(&mut self) {
        self.dense.fill(DenseSlot::default());
        self.sparse.clear();
        self.kerning.clear();
        self.glyph_count = 0;
        self.loaded_glyph_count = 0;
        self.highest_glyph_codepoint = 0;
        self.highest_left_kern_codepoint = 0;
    }
}

impl Default for GlyphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GlyphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphStore")
            .field("glyph_count", &self.glyph_count)
            .field("loaded_glyph_count", &self.loaded_glyph_count)
            .field("highest_glyph_codepoint", &self.highest_glyph_codepoint)
            .field("kerning_pairs", &self.kerning.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(x: u16) -> Glyph {
        Glyph {
            x,
            y: 0,
            width: 4,
            height: 6,
            offset_x: -1,
            offset_y: 2,
            advance_x: 5,
        }
    }

    fn store() -> GlyphStore {
        let mut store = GlyphStore::new();
        store.set_bounds(1000, 0x1F600);
        store
    }

    #[test]
    fn test_dense_and_sparse_tiers() {
        let mut store = store();
        assert_eq!(store.lookup('A' as u32), None);

        store.insert('A' as u32, glyph(1));
        store.insert(0x4E2D, glyph(2));
        store.insert(DENSE_TABLE_SIZE as u32, glyph(3));

        assert_eq!(store.lookup('A' as u32), Some(glyph(1)));
        assert_eq!(store.lookup(0x4E2D), Some(glyph(2)));
        assert_eq!(store.lookup(DENSE_TABLE_SIZE as u32), Some(glyph(3)));
        assert_eq!(store.lookup('B' as u32), None);
        assert_eq!(store.lookup(0x4E2E), None);
        assert_eq!(store.loaded_glyph_count(), 3);
    }

    #[test]
    fn test_reinsert_does_not_double_count() {
        let mut store = store();
        store.insert(65, glyph(1));
        store.insert(65, glyph(9));
        store.insert(0x3000, glyph(1));
        store.insert(0x3000, glyph(9));

        assert_eq!(store.loaded_glyph_count(), 2);
        assert_eq!(store.lookup(65), Some(glyph(9)));
        assert_eq!(store.lookup(0x3000), Some(glyph(9)));
    }

    #[test]
    fn test_codepoints_above_highest_are_absent() {
        let mut store = GlyphStore::new();
        store.set_bounds(10, 200);
        store.insert(150, glyph(1));
        store.insert(300, glyph(2));

        assert_eq!(store.lookup(150), Some(glyph(1)));
        assert_eq!(store.lookup(300), None);
    }

    #[test]
    fn test_kerning_lookup() {
        let mut store = store();
        store.bulk_load_kerning([
            KerningEntry::new('A' as u32, 'T' as u32, -2),
            KerningEntry::new('A' as u32, 'V' as u32, 0),
            KerningEntry::new(0x0410, 0x0422, -3),
        ]);

        assert_eq!(store.lookup_kerning('A' as u32, 'T' as u32), -2);
        assert_eq!(store.lookup_kerning('A' as u32, 'V' as u32), 0);
        assert_eq!(store.lookup_kerning('A' as u32, 'W' as u32), 0);
        assert_eq!(store.lookup_kerning('T' as u32, 'A' as u32), 0);
        assert_eq!(store.lookup_kerning(0x0410, 0x0422), -3);
        assert_eq!(store.kerning_len(), 2);
        assert_eq!(store.highest_left_kern_codepoint(), 0x0410);
    }

    #[test]
    fn test_kerning_flag_is_preserved_across_insert() {
        let mut store = store();
        store.bulk_load_kerning([KerningEntry::new(70, 46, -4)]);
        store.insert(70, glyph(1));

        assert_eq!(store.lookup(70), Some(glyph(1)));
        assert_eq!(store.lookup_kerning(70, 46), -4);
    }

    #[test]
    fn test_sparse_left_side_uses_highest_bound() {
        let mut store = store();
        store.bulk_load_kerning([KerningEntry::new(0x1000, 0x1001, 7)]);

        assert_eq!(store.lookup_kerning(0x1000, 0x1001), 7);
        assert_eq!(store.lookup_kerning(0x2000, 0x1001), 0);
    }

    #[test]
    fn test_reset() {
        let mut store = store();
        store.insert(65, glyph(1));
        store.insert(0x5000, glyph(2));
        store.bulk_load_kerning([KerningEntry::new(65, 66, 1)]);
        store.reset();

        assert_eq!(store.loaded_glyph_count(), 0);
        assert_eq!(store.glyph_count(), 0);
        assert_eq!(store.kerning_len(), 0);
        assert_eq!(store.iter().count(), 0);
        assert_eq!(store.lookup_kerning(65, 66), 0);

        store.set_bounds(1000, 0x1F600);
        assert_eq!(store.lookup(65), None);
        assert_eq!(store.lookup(0x5000), None);
    }

    #[test]
    fn test_iteration_covers_both_tiers() {
        let mut store = store();
        store.insert(32, glyph(1));
        store.insert(0x10000, glyph(2));
        store.bulk_load_kerning([KerningEntry::new(32, 33, 2)]);

        let mut loaded: Vec<_> = store.iter().map(|(c, _)| c).collect();
        loaded.sort_unstable();
        assert_eq!(loaded, vec![32, 0x10000]);

        let kerning: Vec<_> = store.kerning_entries().collect();
        assert_eq!(kerning, vec![KerningEntry::new(32, 33, 2)]);
    }
}
