use crate::math::Vec2;

/// Earth radius used by the spherical-Mercator projection (meters).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the circumference of the Mercator world (meters); the projected
/// plane spans `[-HALF_CIRCUMFERENCE, HALF_CIRCUMFERENCE]` on both axes.
pub const HALF_CIRCUMFERENCE_M: f64 = std::f64::consts::PI * EARTH_RADIUS_M;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Spherical Web-Mercator projection.
///
/// This is the coordinate transform seam the view exposes; everything else
/// in the engine works in projected meters.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MercatorProjection;

impl MercatorProjection {
    pub fn lon_lat_to_meters(&self, g: LonLat) -> Vec2 {
        let x = g.lon * HALF_CIRCUMFERENCE_M / 180.0;
        let y = (((90.0 + g.lat) * std::f64::consts::PI / 360.0).tan()).ln()
            / (std::f64::consts::PI / 180.0)
            * (HALF_CIRCUMFERENCE_M / 180.0);
        Vec2::new(x, y)
    }

    pub fn meters_to_lon_lat(&self, m: Vec2) -> LonLat {
        let lon = m.x / HALF_CIRCUMFERENCE_M * 180.0;
        let lat_iso = m.y / HALF_CIRCUMFERENCE_M * 180.0;
        let lat = 180.0 / std::f64::consts::PI
            * (2.0 * ((lat_iso * std::f64::consts::PI / 180.0).exp()).atan()
                - std::f64::consts::PI / 2.0);
        LonLat::new(lon, lat)
    }

    /// Side length of one tile at the given zoom, in projected meters.
    pub fn meters_per_tile(&self, zoom: u8) -> f64 {
        2.0 * HALF_CIRCUMFERENCE_M / (1u64 << zoom) as f64
    }
}
