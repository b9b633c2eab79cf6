use crate::math::{Rect, Vec2};
use crate::mercator::{HALF_CIRCUMFERENCE_M, MercatorProjection};

/// Size of one tile in screen pixels, the usual slippy-map convention.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Identifies one map tile: a fixed cell of the Mercator plane at a zoom
/// level. Derived `Ord` gives the `(z, x, y)` ordering every tile container
/// in the engine relies on for deterministic traversal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Tiles per axis at this zoom (2^z).
    pub fn tiles_per_axis(z: u8) -> u32 {
        1u32 << z
    }

    /// Projected-meter extent of this tile. `y` counts from the north edge
    /// of the world, per the XYZ tiling scheme.
    pub fn bounds_meters(&self) -> Rect {
        let side = MercatorProjection.meters_per_tile(self.z);
        let min_x = -HALF_CIRCUMFERENCE_M + self.x as f64 * side;
        let max_y = HALF_CIRCUMFERENCE_M - self.y as f64 * side;
        Rect::new(
            Vec2::new(min_x, max_y - side),
            Vec2::new(min_x + side, max_y),
        )
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// The tile containing a point of the Mercator plane at the given zoom.
pub fn tile_at(point_m: Vec2, zoom: u8) -> TileId {
    let side = MercatorProjection.meters_per_tile(zoom);
    let max_index = TileId::tiles_per_axis(zoom) - 1;
    let clamp = |v: f64| v.floor().clamp(0.0, max_index as f64) as u32;
    TileId::new(
        zoom,
        clamp((point_m.x + HALF_CIRCUMFERENCE_M) / side),
        clamp((HALF_CIRCUMFERENCE_M - point_m.y) / side),
    )
}

/// Most tiles one axis of the visible set may span. Bounds the set for any
/// viewport the host can request (a span of 64 covers a 16k-pixel axis).
pub const MAX_TILE_SPAN: u32 = 64;

/// Compute the visible tile set: every tile at `zoom` whose extent
/// intersects the viewport rectangle centered on `center_m`.
///
/// The result is in ascending `TileId` order. An empty viewport yields an
/// empty set; an oversized one is clamped to `MAX_TILE_SPAN` tiles per
/// axis around the center.
pub fn tiles_in_view(center_m: Vec2, viewport_px: (f64, f64), zoom: u8) -> Vec<TileId> {
    let (w_px, h_px) = viewport_px;
    if w_px <= 0.0 || h_px <= 0.0 {
        return Vec::new();
    }

    let side = MercatorProjection.meters_per_tile(zoom);
    let meters_per_px = side / TILE_SIZE_PX;
    let view = Rect::centered(center_m, w_px * meters_per_px, h_px * meters_per_px);

    let max_index = TileId::tiles_per_axis(zoom) - 1;
    let to_index = |v: f64| -> u32 {
        let idx = (v / side).floor();
        idx.clamp(0.0, max_index as f64) as u32
    };

    // x counts from the west edge, y from the north edge.
    let center = tile_at(center_m, zoom);
    let (x_lo, x_hi) = clamp_span(
        to_index(view.min.x + HALF_CIRCUMFERENCE_M),
        to_index(view.max.x + HALF_CIRCUMFERENCE_M),
        center.x,
    );
    let (y_lo, y_hi) = clamp_span(
        to_index(HALF_CIRCUMFERENCE_M - view.max.y),
        to_index(HALF_CIRCUMFERENCE_M - view.min.y),
        center.y,
    );

    let count = ((x_hi - x_lo) as usize + 1) * ((y_hi - y_lo) as usize + 1);
    let mut out = Vec::with_capacity(count);
    for x in x_lo..=x_hi {
        for y in y_lo..=y_hi {
            out.push(TileId::new(zoom, x, y));
        }
    }
    out
}

/// Shrink an index range wider than `MAX_TILE_SPAN` to a span of that size
/// containing `center`.
fn clamp_span(lo: u32, hi: u32, center: u32) -> (u32, u32) {
    if hi - lo < MAX_TILE_SPAN {
        return (lo, hi);
    }
    let new_lo = center.saturating_sub(MAX_TILE_SPAN / 2).max(lo);
    let new_hi = (new_lo + MAX_TILE_SPAN - 1).min(hi);
    (new_lo, new_hi)
}

#[cfg(test)]
mod tests {
    use super::{TileId, tile_at, tiles_in_view};
    use crate::math::Vec2;
    use crate::mercator::HALF_CIRCUMFERENCE_M;

    #[test]
    fn zoom_zero_is_one_world_tile() {
        let b = TileId::new(0, 0, 0).bounds_meters();
        assert_eq!(b.min, Vec2::new(-HALF_CIRCUMFERENCE_M, -HALF_CIRCUMFERENCE_M));
        assert_eq!(b.max, Vec2::new(HALF_CIRCUMFERENCE_M, HALF_CIRCUMFERENCE_M));
    }

    #[test]
    fn y_counts_from_the_north() {
        // At z=1, tile (0,0) is the north-west quadrant.
        let b = TileId::new(1, 0, 0).bounds_meters();
        assert!(b.min.x < 0.0 && b.max.x.abs() < 1e-6);
        assert!(b.min.y.abs() < 1e-6 && b.max.y > 0.0);
    }

    #[test]
    fn ordering_is_z_then_x_then_y() {
        let mut ids = vec![
            TileId::new(2, 1, 0),
            TileId::new(1, 3, 3),
            TileId::new(2, 0, 1),
            TileId::new(2, 0, 0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                TileId::new(1, 3, 3),
                TileId::new(2, 0, 0),
                TileId::new(2, 0, 1),
                TileId::new(2, 1, 0),
            ]
        );
    }

    #[test]
    fn visible_set_is_sorted_and_centered() {
        let tiles = tiles_in_view(Vec2::new(0.0, 0.0), (512.0, 512.0), 2);
        assert!(!tiles.is_empty());
        let mut sorted = tiles.clone();
        sorted.sort();
        assert_eq!(tiles, sorted);
        // A viewport centered on the origin at z=2 spans the middle tiles.
        assert!(tiles.contains(&TileId::new(2, 1, 1)));
        assert!(tiles.contains(&TileId::new(2, 2, 2)));
    }

    #[test]
    fn visible_set_clamps_at_world_edge() {
        let corner = Vec2::new(-HALF_CIRCUMFERENCE_M, HALF_CIRCUMFERENCE_M);
        let tiles = tiles_in_view(corner, (1024.0, 1024.0), 1);
        for t in &tiles {
            assert!(t.x <= 1 && t.y <= 1);
        }
        assert!(tiles.contains(&TileId::new(1, 0, 0)));
    }

    #[test]
    fn origin_sits_in_the_middle_tile() {
        assert_eq!(tile_at(Vec2::new(0.0, 0.0), 0), TileId::new(0, 0, 0));
        // Just south-east of the origin at z=1 is tile (1,1).
        assert_eq!(tile_at(Vec2::new(1.0, -1.0), 1), TileId::new(1, 1, 1));
        // Just north-west is tile (0,0).
        assert_eq!(tile_at(Vec2::new(-1.0, 1.0), 1), TileId::new(1, 0, 0));
    }

    #[test]
    fn oversized_viewport_clamps_around_the_center() {
        let center = Vec2::new(1_000_000.0, -2_000_000.0);
        let tiles = tiles_in_view(center, (1e9, 1e9), 18);
        assert!(tiles.len() <= (super::MAX_TILE_SPAN as usize).pow(2));
        assert!(tiles.contains(&tile_at(center, 18)));
        let mut sorted = tiles.clone();
        sorted.sort();
        assert_eq!(tiles, sorted);
    }

    #[test]
    fn empty_viewport_sees_nothing() {
        assert!(tiles_in_view(Vec2::new(0.0, 0.0), (0.0, 480.0), 3).is_empty());
    }

    #[test]
    fn every_visible_tile_intersects_the_viewport() {
        let center = Vec2::new(1_000_000.0, -2_000_000.0);
        let side = crate::mercator::MercatorProjection.meters_per_tile(5);
        let view = crate::math::Rect::centered(
            center,
            800.0 * side / super::TILE_SIZE_PX,
            600.0 * side / super::TILE_SIZE_PX,
        );
        for t in tiles_in_view(center, (800.0, 600.0), 5) {
            assert!(t.bounds_meters().intersects(&view), "tile {t} out of view");
        }
    }
}
