use foundation::handles::{MeshHandle, ShaderHandle};
use scene::build::{Primitive, StyleMesh};
use scene::scene::ProgramDescriptor;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DepthFunc {
    Less,
    LessEqual,
}

/// Fixed pipeline state the engine configures once at initialize.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PipelineState {
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    pub blend: bool,
    pub cull_back_faces: bool,
    pub front_face_ccw: bool,
    pub clear_color: [f32; 4],
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_func: DepthFunc::LessEqual,
            blend: false,
            cull_back_faces: true,
            front_face_ccw: true,
            clear_color: [0.3, 0.3, 0.3, 1.0],
        }
    }
}

/// An error drained from the GPU after a risky operation.
///
/// These are logged and absorbed; rendering continues degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuError(pub String);

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gpu error: {}", self.0)
    }
}

impl std::error::Error for GpuError {}

/// The seam between the engine and the context-owning host.
///
/// Every call here must happen on the thread owning the GPU context; the
/// engine guarantees that by only touching the backend from its own entry
/// points.
pub trait RenderBackend {
    fn apply_pipeline_state(&mut self, state: &PipelineState);
    fn set_viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: bool, depth: bool);
    fn compile_program(&mut self, handle: ShaderHandle, descriptor: &ProgramDescriptor);
    fn upload_mesh(&mut self, handle: MeshHandle, mesh: &StyleMesh);
    fn bind_program(&mut self, handle: ShaderHandle);
    fn draw_mesh(&mut self, mesh: MeshHandle, program: ShaderHandle);
    /// Poll and clear accumulated error state.
    fn drain_errors(&mut self) -> Vec<GpuError>;
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    ApplyPipelineState(PipelineState),
    SetViewport {
        width: u32,
        height: u32,
    },
    Clear {
        color: bool,
        depth: bool,
    },
    CompileProgram {
        handle: ShaderHandle,
        descriptor: ProgramDescriptor,
    },
    UploadMesh {
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
        primitive: Primitive,
    },
    BindProgram(ShaderHandle),
    DrawMesh {
        mesh: MeshHandle,
        program: ShaderHandle,
    },
}

/// A backend that records commands instead of driving a real context.
///
/// Tests and the headless app compare command streams; two renders that
/// record the same stream are the same picture.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<GpuCommand>,
    queued_errors: Vec<GpuError>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Queue an error for the next `drain_errors` call (tests use this to
    /// simulate driver error state).
    pub fn inject_error(&mut self, message: impl Into<String>) {
        self.queued_errors.push(GpuError(message.into()));
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawMesh { .. }))
            .count()
    }
}

impl RenderBackend for CommandRecorder {
    fn apply_pipeline_state(&mut self, state: &PipelineState) {
        self.commands.push(GpuCommand::ApplyPipelineState(*state));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(GpuCommand::SetViewport { width, height });
    }

    fn clear(&mut self, color: bool, depth: bool) {
        self.commands.push(GpuCommand::Clear { color, depth });
    }

    fn compile_program(&mut self, handle: ShaderHandle, descriptor: &ProgramDescriptor) {
        self.commands.push(GpuCommand::CompileProgram {
            handle,
            descriptor: descriptor.clone(),
        });
    }

    fn upload_mesh(&mut self, handle: MeshHandle, mesh: &StyleMesh) {
        self.commands.push(GpuCommand::UploadMesh {
            handle,
            vertex_count: mesh.vertices.len(),
            index_count: mesh.indices.len(),
            primitive: mesh.primitive,
        });
    }

    fn bind_program(&mut self, handle: ShaderHandle) {
        self.commands.push(GpuCommand::BindProgram(handle));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, program: ShaderHandle) {
        self.commands.push(GpuCommand::DrawMesh { mesh, program });
    }

    fn drain_errors(&mut self) -> Vec<GpuError> {
        std::mem::take(&mut self.queued_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandRecorder, GpuCommand, PipelineState, RenderBackend};
    use foundation::handles::{MeshHandle, ShaderHandle};

    #[test]
    fn default_pipeline_state_matches_the_fixed_setup() {
        let s = PipelineState::default();
        assert!(s.depth_test);
        assert!(!s.blend);
        assert!(s.cull_back_faces);
        assert_eq!(s.clear_color, [0.3, 0.3, 0.3, 1.0]);
    }

    #[test]
    fn recorder_preserves_call_order() {
        let mut r = CommandRecorder::new();
        r.bind_program(ShaderHandle(1));
        r.draw_mesh(MeshHandle(2), ShaderHandle(1));
        assert_eq!(
            r.commands(),
            &[
                GpuCommand::BindProgram(ShaderHandle(1)),
                GpuCommand::DrawMesh {
                    mesh: MeshHandle(2),
                    program: ShaderHandle(1)
                },
            ]
        );
        assert_eq!(r.draw_count(), 1);
    }

    #[test]
    fn injected_errors_drain_once() {
        let mut r = CommandRecorder::new();
        r.inject_error("invalid enum");
        assert_eq!(r.drain_errors().len(), 1);
        assert!(r.drain_errors().is_empty());
    }
}
