use std::collections::BTreeMap;

use foundation::handles::{MeshHandle, ShaderHandle};
use scene::build::StyleMesh;
use scene::scene::ProgramDescriptor;

use crate::backend::RenderBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    UnknownProgram(ShaderHandle),
    UnknownMesh(MeshHandle),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::UnknownProgram(h) => write!(f, "unknown shader handle {:?}", h),
            TrackerError::UnknownMesh(h) => write!(f, "unknown mesh handle {:?}", h),
        }
    }
}

impl std::error::Error for TrackerError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ContextEpoch(u64);

#[derive(Debug)]
struct ProgramRecord {
    descriptor: ProgramDescriptor,
    uploaded_in: Option<ContextEpoch>,
}

#[derive(Debug)]
struct MeshRecord {
    mesh: StyleMesh,
    uploaded_in: Option<ContextEpoch>,
}

/// Registry of every live GPU-resident resource, with lazy re-upload after
/// context loss.
///
/// Each record keeps a CPU copy of what the GPU object is built from and the
/// context epoch it was last uploaded in. `invalidate_all` bumps the epoch
/// without touching the (possibly dead) context; the next bind of each
/// resource re-uploads it exactly once.
#[derive(Debug, Default)]
pub struct GpuResourceTracker {
    epoch: u64,
    next_id: u64,
    programs: BTreeMap<ShaderHandle, ProgramRecord>,
    meshes: BTreeMap<MeshHandle, MeshRecord>,
}

impl GpuResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_program(&mut self, descriptor: ProgramDescriptor) -> ShaderHandle {
        self.next_id += 1;
        let handle = ShaderHandle(self.next_id);
        self.programs.insert(
            handle,
            ProgramRecord {
                descriptor,
                uploaded_in: None,
            },
        );
        handle
    }

    pub fn register_mesh(&mut self, mesh: StyleMesh) -> MeshHandle {
        self.next_id += 1;
        let handle = MeshHandle(self.next_id);
        self.meshes.insert(
            handle,
            MeshRecord {
                mesh,
                uploaded_in: None,
            },
        );
        handle
    }

    pub fn release_program(&mut self, handle: ShaderHandle) {
        self.programs.remove(&handle);
    }

    pub fn release_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(&handle);
    }

    /// Bind a program, compiling it first if it has never been uploaded in
    /// the current context epoch.
    pub fn bind_program(
        &mut self,
        handle: ShaderHandle,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), TrackerError> {
        let epoch = ContextEpoch(self.epoch);
        let record = self
            .programs
            .get_mut(&handle)
            .ok_or(TrackerError::UnknownProgram(handle))?;
        if record.uploaded_in != Some(epoch) {
            backend.compile_program(handle, &record.descriptor);
            record.uploaded_in = Some(epoch);
        }
        backend.bind_program(handle);
        Ok(())
    }

    /// Draw a mesh under an already-bound program, uploading the mesh first
    /// if its buffers are not valid in the current epoch.
    pub fn draw_mesh(
        &mut self,
        mesh: MeshHandle,
        program: ShaderHandle,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), TrackerError> {
        let epoch = ContextEpoch(self.epoch);
        let record = self
            .meshes
            .get_mut(&mesh)
            .ok_or(TrackerError::UnknownMesh(mesh))?;
        if record.uploaded_in != Some(epoch) {
            backend.upload_mesh(mesh, &record.mesh);
            record.uploaded_in = Some(epoch);
        }
        backend.draw_mesh(mesh, program);
        Ok(())
    }

    /// Mark every live resource invalid. Touches no GPU state, so it is
    /// callable while the context is destroyed.
    pub fn invalidate_all(&mut self) {
        self.epoch += 1;
    }

    /// Drop every record (teardown).
    pub fn clear(&mut self) {
        self.programs.clear();
        self.meshes.clear();
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the resource's GPU object is valid in the current epoch.
    pub fn is_program_uploaded(&self, handle: ShaderHandle) -> bool {
        self.programs
            .get(&handle)
            .is_some_and(|r| r.uploaded_in == Some(ContextEpoch(self.epoch)))
    }

    pub fn is_mesh_uploaded(&self, handle: MeshHandle) -> bool {
        self.meshes
            .get(&handle)
            .is_some_and(|r| r.uploaded_in == Some(ContextEpoch(self.epoch)))
    }
}
