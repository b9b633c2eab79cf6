use foundation::math::Vec2;
use foundation::mercator::{HALF_CIRCUMFERENCE_M, LonLat, MercatorProjection};
use foundation::tile::{TileId, tiles_in_view};

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Camera/view state: position in projected meters, zoom, viewport.
///
/// All mutation is synchronous. Gesture handlers and resize write this;
/// tile visibility and draw setup read it.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    position: Vec2,
    zoom: f64,
    viewport: (f64, f64),
    projection: MercatorProjection,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    pub fn new() -> Self {
        Self {
            position: Vec2::new(0.0, 0.0),
            zoom: 16.0,
            viewport: (800.0, 600.0),
            projection: MercatorProjection,
        }
    }

    /// Seed the position from geographic coordinates.
    pub fn at_lon_lat(g: LonLat) -> Self {
        let mut v = Self::new();
        let m = v.projection.lon_lat_to_meters(g);
        v.set_position(m.x, m.y);
        v
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Vec2::new(
            x.clamp(-HALF_CIRCUMFERENCE_M, HALF_CIRCUMFERENCE_M),
            y.clamp(-HALF_CIRCUMFERENCE_M, HALF_CIRCUMFERENCE_M),
        );
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(0.0), height.max(0.0));
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.set_position(self.position.x + dx, self.position.y + dy);
    }

    pub fn zoom_by(&mut self, steps: f64) {
        self.zoom = (self.zoom + steps).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    /// Integer zoom level used for tiling.
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.floor().clamp(MIN_ZOOM, MAX_ZOOM) as u8
    }

    /// Tiles whose extent intersects the current viewport, ascending order.
    pub fn visible_tiles(&self) -> Vec<TileId> {
        tiles_in_view(self.position, self.viewport, self.tile_zoom())
    }
}
