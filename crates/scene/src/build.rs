use std::collections::BTreeMap;

use earcutr::earcut;
use foundation::math::Vec3;

use crate::feature::{Feature, Geometry, Position};
use crate::style::{Style, StyleKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// `indices` holds triangle triples.
    Triangles,
    /// `indices` holds segment pairs.
    Lines,
}

/// CPU-side geometry built for one (tile, style) pair, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub primitive: Primitive,
}

impl StyleMesh {
    pub fn empty(primitive: Primitive) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            primitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Build a style's mesh from a tile's decoded layers.
///
/// Layers the style does not consume are skipped. Malformed features
/// (degenerate rings, failed tessellation) contribute nothing; geometry
/// building never fails.
pub fn build_style_mesh(style: &Style, layers: &BTreeMap<String, Vec<Feature>>) -> StyleMesh {
    let primitive = match style.kind() {
        StyleKind::Polygon => Primitive::Triangles,
        StyleKind::Polyline => Primitive::Lines,
    };
    let mut mesh = StyleMesh::empty(primitive);

    for (layer, features) in layers {
        if !style.builds_layer(layer) {
            continue;
        }
        for feature in features {
            match (style.kind(), &feature.geometry) {
                (StyleKind::Polygon, Geometry::Polygon { rings }) => {
                    tessellate_rings(rings, feature.height, &mut mesh);
                }
                (StyleKind::Polyline, Geometry::Line { vertices }) => {
                    append_line(vertices, &mut mesh);
                }
                _ => {}
            }
        }
    }

    mesh
}

fn tessellate_rings(rings: &[Vec<Position>], height: f64, mesh: &mut StyleMesh) {
    // Coordinates are already planar Mercator meters, so rings tessellate
    // directly on (x, y); z carries the extrusion cap height.
    let mut coords_2d: Vec<f64> = Vec::new();
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for (ring_i, ring) in rings.iter().enumerate() {
        let mut pts: Vec<Position> = ring.clone();
        drop_closing_duplicate(&mut pts);
        if pts.len() < 3 {
            continue;
        }

        if ring_i > 0 {
            hole_indices.push(vertices.len());
        }

        for p in pts {
            coords_2d.push(p[0]);
            coords_2d.push(p[1]);
            vertices.push(Vec3::new(p[0], p[1], height));
        }
    }

    if vertices.len() < 3 {
        return;
    }

    let Ok(indices) = earcut(&coords_2d, &hole_indices, 2) else {
        return;
    };

    let base = mesh.vertices.len() as u32;
    mesh.vertices.extend_from_slice(&vertices);
    mesh.indices
        .extend(indices.into_iter().map(|i| base + i as u32));
}

fn append_line(vertices: &[Position], mesh: &mut StyleMesh) {
    if vertices.len() < 2 {
        return;
    }
    let base = mesh.vertices.len() as u32;
    mesh.vertices
        .extend(vertices.iter().map(|p| Vec3::new(p[0], p[1], p[2])));
    for i in 0..(vertices.len() as u32 - 1) {
        mesh.indices.push(base + i);
        mesh.indices.push(base + i + 1);
    }
}

fn drop_closing_duplicate(points: &mut Vec<Position>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = *points.last().unwrap();
        if (first[0] - last[0]).abs() < 1e-9 && (first[1] - last[1]).abs() < 1e-9 {
            points.pop();
        }
    }
}
