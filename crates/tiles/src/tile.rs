use std::collections::BTreeMap;

use foundation::handles::MeshHandle;
use foundation::tile::TileId;
use gpu::backend::RenderBackend;
use gpu::tracker::{GpuResourceTracker, TrackerError};
use scene::build::build_style_mesh;
use scene::scene::Scene;
use scene::style::Style;

use crate::source::TileData;

/// One tile's built geometry: a mesh handle per style that produced any
/// geometry for it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTile {
    id: TileId,
    meshes: BTreeMap<String, MeshHandle>,
}

impl MapTile {
    /// Build per-style geometry from decoded tile data and register the
    /// meshes with the tracker. Styles with nothing to draw in this tile
    /// get no mesh.
    pub fn build(
        id: TileId,
        data: &TileData,
        scene: &Scene,
        tracker: &mut GpuResourceTracker,
    ) -> Self {
        let mut meshes = BTreeMap::new();
        for style in scene.styles() {
            let mesh = build_style_mesh(style, &data.layers);
            if !mesh.is_empty() {
                meshes.insert(style.name().to_string(), tracker.register_mesh(mesh));
            }
        }
        Self { id, meshes }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn mesh_for(&self, style_name: &str) -> Option<MeshHandle> {
        self.meshes.get(style_name).copied()
    }

    /// Issue this tile's draw under an already-bound style. A tile with no
    /// geometry for the style, or a style with no program yet, is a no-op.
    pub fn draw(
        &self,
        style: &Style,
        tracker: &mut GpuResourceTracker,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), TrackerError> {
        let Some(program) = style.program() else {
            return Ok(());
        };
        let Some(mesh) = self.mesh_for(style.name()) else {
            return Ok(());
        };
        tracker.draw_mesh(mesh, program, backend)
    }

    /// Release every mesh this tile registered (eviction/teardown).
    pub fn release(&self, tracker: &mut GpuResourceTracker) {
        for handle in self.meshes.values() {
            tracker.release_mesh(*handle);
        }
    }
}
