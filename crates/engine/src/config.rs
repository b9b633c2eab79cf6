use serde::{Deserialize, Serialize};

use tiles::cache::TileCacheConfig;
use tiles::manager::TileManagerConfig;

/// Host-facing engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial camera position in geographic degrees.
    #[serde(default = "default_lon")]
    pub start_lon: f64,
    #[serde(default = "default_lat")]
    pub start_lat: f64,

    #[serde(default = "default_max_pending")]
    pub max_pending_fetches: usize,
    #[serde(default = "default_launches")]
    pub fetch_launches_per_frame: usize,
    #[serde(default = "default_builds")]
    pub tile_builds_per_frame: u32,
    #[serde(default = "default_offscreen")]
    pub max_offscreen_tiles: usize,
}

// Lower Manhattan, so a fresh engine has something interesting on screen.
fn default_lon() -> f64 {
    -74.00796
}

fn default_lat() -> f64 {
    40.70361
}

fn default_max_pending() -> usize {
    64
}

fn default_launches() -> usize {
    8
}

fn default_builds() -> u32 {
    4
}

fn default_offscreen() -> usize {
    24
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_lon: default_lon(),
            start_lat: default_lat(),
            max_pending_fetches: default_max_pending(),
            fetch_launches_per_frame: default_launches(),
            tile_builds_per_frame: default_builds(),
            max_offscreen_tiles: default_offscreen(),
        }
    }
}

impl EngineConfig {
    pub fn tile_manager_config(&self) -> TileManagerConfig {
        TileManagerConfig {
            max_pending_fetches: self.max_pending_fetches,
            launches_per_frame: self.fetch_launches_per_frame,
            builds_per_frame: self.tile_builds_per_frame,
            cache: TileCacheConfig {
                max_offscreen_tiles: self.max_offscreen_tiles,
            },
        }
    }
}
