/// Small copyable ids for GPU-resident resources.
///
/// Handles are stable for the lifetime of the owning tracker; whether the
/// underlying GPU object is currently valid is the tracker's concern, not
/// the handle's.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderHandle(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshHandle(pub u64);
