use crate::light::{Light, LightCounts};
use crate::style::{Style, StyleKind};

/// Everything a shader build needs to know about one style × light-set
/// combination. The GPU layer compiles these; composing them is pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub style_name: String,
    pub style_kind: StyleKind,
    /// Preprocessor-style defines, sorted by name for stable comparison.
    pub defines: Vec<(String, String)>,
}

/// The styled scene: an ordered style list (insertion order is draw order)
/// and an unordered light set.
///
/// Shader programs must be rebuilt after any style or light mutation; see
/// `program_descriptors` and the GPU layer's scene-program builder.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scene {
    styles: Vec<Style>,
    lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut [Style] {
        &mut self.styles
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Compose one program descriptor per style from the current light set,
    /// in draw order.
    pub fn program_descriptors(&self) -> Vec<ProgramDescriptor> {
        let counts = LightCounts::of(&self.lights);
        let defines = vec![
            ("NUM_DIRECTIONAL_LIGHTS".to_string(), counts.directional.to_string()),
            ("NUM_POINT_LIGHTS".to_string(), counts.point.to_string()),
            ("NUM_SPOT_LIGHTS".to_string(), counts.spot.to_string()),
        ];

        self.styles
            .iter()
            .map(|s| ProgramDescriptor {
                style_name: s.name().to_string(),
                style_kind: s.kind(),
                defines: defines.clone(),
            })
            .collect()
    }
}
