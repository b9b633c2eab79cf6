use std::collections::{BTreeMap, BTreeSet};

use foundation::tile::TileId;

use crate::tile::MapTile;

/// Cache policy: visible tiles are never evicted; off-screen tiles are
/// retained most-recently-used-first up to this bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileCacheConfig {
    pub max_offscreen_tiles: usize,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            max_offscreen_tiles: 24,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    tile: MapTile,
    last_visible_tick: u64,
}

/// Tile-keyed cache with deterministic traversal and eviction.
///
/// Keyed in a `BTreeMap` so iteration (and therefore draw order) is stable.
/// Eviction ties break by key ordering, as in the rest of the engine.
#[derive(Debug)]
pub struct TileCache {
    config: TileCacheConfig,
    tick: u64,
    entries: BTreeMap<TileId, CacheEntry>,
}

impl TileCache {
    pub fn new(config: TileCacheConfig) -> Self {
        Self {
            config,
            tick: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &TileId) -> Option<&MapTile> {
        self.entries.get(id).map(|e| &e.tile)
    }

    /// Insert a built tile. Re-insertion replaces the entry and returns the
    /// previous tile so the caller can release its meshes.
    pub fn insert(&mut self, tile: MapTile) -> Option<MapTile> {
        self.tick += 1;
        self.entries
            .insert(
                tile.id(),
                CacheEntry {
                    tile,
                    last_visible_tick: self.tick,
                },
            )
            .map(|e| e.tile)
    }

    /// Record that these tiles are in the current visible set.
    pub fn touch_visible(&mut self, visible: &BTreeSet<TileId>) {
        self.tick += 1;
        for id in visible {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.last_visible_tick = self.tick;
            }
        }
    }

    /// Evict off-screen tiles beyond the retention bound, least recently
    /// visible first. Returns the evicted tiles for mesh release.
    pub fn evict_offscreen(&mut self, visible: &BTreeSet<TileId>) -> Vec<MapTile> {
        let mut offscreen: Vec<(u64, TileId)> = self
            .entries
            .iter()
            .filter(|(id, _)| !visible.contains(id))
            .map(|(id, e)| (e.last_visible_tick, *id))
            .collect();

        if offscreen.len() <= self.config.max_offscreen_tiles {
            return Vec::new();
        }

        // Oldest ticks first; key order breaks ties deterministically.
        offscreen.sort();
        let excess = offscreen.len() - self.config.max_offscreen_tiles;
        offscreen
            .into_iter()
            .take(excess)
            .filter_map(|(_, id)| self.entries.remove(&id).map(|e| e.tile))
            .collect()
    }

    /// Cached tiles intersecting the visible set, ascending `TileId` order.
    /// Yielded entries borrow only the cache, not the query set.
    pub fn visible<'a, 'b>(
        &'a self,
        visible: &'b BTreeSet<TileId>,
    ) -> impl Iterator<Item = (&'a TileId, &'a MapTile)> + use<'a, 'b> {
        self.entries
            .iter()
            .filter(move |(id, _)| visible.contains(id))
            .map(|(id, e)| (id, &e.tile))
    }

    /// Remove everything (teardown). Returns the tiles for mesh release.
    pub fn drain(&mut self) -> Vec<MapTile> {
        std::mem::take(&mut self.entries)
            .into_values()
            .map(|e| e.tile)
            .collect()
    }
}
