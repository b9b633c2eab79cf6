use foundation::math::Vec3;
use foundation::time::Time;

pub type Color = [f64; 4];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LightKind {
    Point,
    Directional,
    Spot,
}

/// An illumination source contributing uniforms to shader builds.
///
/// Each variant carries only the fields its kind needs; dispatch is a match,
/// never a downcast.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point {
        position: Vec3,
        diffuse: Color,
        specular: Color,
        /// (constant, linear) attenuation coefficients.
        attenuation: (f64, f64),
    },
    Directional {
        direction: Vec3,
        diffuse: Color,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        specular: Color,
        /// (cone half-angle in radians, edge exponent).
        cutoff: (f64, f64),
        attenuation: (f64, f64),
    },
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Point { .. } => LightKind::Point,
            Light::Directional { .. } => LightKind::Directional,
            Light::Spot { .. } => LightKind::Spot,
        }
    }
}

/// Count lights by kind, the shape shader composition keys on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LightCounts {
    pub point: usize,
    pub directional: usize,
    pub spot: usize,
}

impl LightCounts {
    pub fn of(lights: &[Light]) -> Self {
        let mut c = Self::default();
        for l in lights {
            match l.kind() {
                LightKind::Point => c.point += 1,
                LightKind::Directional => c.directional += 1,
                LightKind::Spot => c.spot += 1,
            }
        }
        c
    }
}

/// Radius of the circular demo light orbit, in projected meters.
const ORBIT_RADIUS_M: f64 = 100.0;
/// Height the animated lights hover above the map plane.
const HOVER_HEIGHT_M: f64 = 100.0;

/// Move lights as a closed-form function of engine time.
///
/// Point lights orbit the view center; spot lights sweep their direction in
/// a circle from above it. Directional lights do not move. `view_z` is the
/// camera height the hover height offsets against.
pub fn animate_lights(lights: &mut [Light], time: Time, view_z: f64) {
    let t = time.0;
    let height = -view_z + HOVER_HEIGHT_M;
    for light in lights {
        match light {
            Light::Point { position, .. } => {
                *position = Vec3::new(ORBIT_RADIUS_M * t.cos(), ORBIT_RADIUS_M * t.sin(), height);
            }
            Light::Spot {
                position,
                direction,
                ..
            } => {
                *direction = Vec3::new(t.cos(), t.sin(), 0.0);
                *position = Vec3::new(0.0, 0.0, height);
            }
            Light::Directional { .. } => {}
        }
    }
}
