use serde::{Deserialize, Serialize};

/// A vertex in projected meters; `z` carries extrusion height for built
/// geometry (0 for flat features).
pub type Position = [f64; 3];

/// Decoded tile feature geometry.
///
/// Full vector-tile decoding is a data-source concern; styles only see this
/// already-decoded form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Point { position: Position },
    Line { vertices: Vec<Position> },
    /// First ring is the outer boundary, the rest are holes.
    Polygon { rings: Vec<Vec<Position>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    /// Extrusion height in meters (buildings); 0 for flat features.
    #[serde(default)]
    pub height: f64,
}

impl Feature {
    pub fn point(position: Position) -> Self {
        Self {
            geometry: Geometry::Point { position },
            height: 0.0,
        }
    }

    pub fn line(vertices: Vec<Position>) -> Self {
        Self {
            geometry: Geometry::Line { vertices },
            height: 0.0,
        }
    }

    pub fn polygon(rings: Vec<Vec<Position>>) -> Self {
        Self {
            geometry: Geometry::Polygon { rings },
            height: 0.0,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }
}
