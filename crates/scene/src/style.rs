use foundation::handles::ShaderHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Polygon,
    Polyline,
}

/// A rule set mapping named source layers to one rendering technique and
/// (once shaders are built) its program.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    name: String,
    kind: StyleKind,
    layers: Vec<String>,
    program: Option<ShaderHandle>,
}

impl Style {
    pub fn polygon(name: impl Into<String>) -> Self {
        Self::new(name, StyleKind::Polygon)
    }

    pub fn polyline(name: impl Into<String>) -> Self {
        Self::new(name, StyleKind::Polyline)
    }

    fn new(name: impl Into<String>, kind: StyleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            layers: Vec::new(),
            program: None,
        }
    }

    /// Declare which source layers this style consumes.
    pub fn add_layers<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers.extend(names.into_iter().map(Into::into));
    }

    pub fn builds_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l == name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StyleKind {
        self.kind
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn program(&self) -> Option<ShaderHandle> {
        self.program
    }

    /// Record the program handle produced by a shader build.
    pub fn set_program(&mut self, handle: ShaderHandle) {
        self.program = Some(handle);
    }
}
