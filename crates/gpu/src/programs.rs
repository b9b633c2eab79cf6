use scene::scene::Scene;

use crate::tracker::GpuResourceTracker;

/// Build (or rebuild) every style's shader program from the scene's current
/// style × light composition.
///
/// Safe to call repeatedly: a style's previous program is released before
/// the fresh descriptor is registered, so no stale program can outlive a
/// composition change. Must be re-invoked after any style or light
/// mutation; compilation itself happens lazily at first bind.
pub fn build_scene_programs(scene: &mut Scene, tracker: &mut GpuResourceTracker) {
    let descriptors = scene.program_descriptors();
    for (style, descriptor) in scene.styles_mut().iter_mut().zip(descriptors) {
        if let Some(old) = style.program() {
            tracker.release_program(old);
        }
        style.set_program(tracker.register_program(descriptor));
    }
}

#[cfg(test)]
mod tests {
    use super::build_scene_programs;
    use crate::tracker::GpuResourceTracker;
    use foundation::math::Vec3;
    use scene::light::Light;
    use scene::scene::Scene;
    use scene::style::Style;

    fn scene_with_styles() -> Scene {
        let mut scene = Scene::new();
        let mut fill = Style::polygon("fill");
        fill.add_layers(["water"]);
        scene.add_style(fill);
        scene.add_style(Style::polyline("roads"));
        scene
    }

    #[test]
    fn every_style_gets_a_program() {
        let mut scene = scene_with_styles();
        let mut tracker = GpuResourceTracker::new();
        build_scene_programs(&mut scene, &mut tracker);
        assert!(scene.styles().iter().all(|s| s.program().is_some()));
        assert_eq!(tracker.program_count(), 2);
    }

    #[test]
    fn rebuild_after_light_change_replaces_programs_without_leaking() {
        let mut scene = scene_with_styles();
        let mut tracker = GpuResourceTracker::new();
        build_scene_programs(&mut scene, &mut tracker);
        let first: Vec<_> = scene.styles().iter().map(|s| s.program()).collect();

        scene.add_light(Light::Directional {
            direction: Vec3::new(-1.0, -1.0, 1.0),
            diffuse: [1.0; 4],
        });
        build_scene_programs(&mut scene, &mut tracker);
        let second: Vec<_> = scene.styles().iter().map(|s| s.program()).collect();

        assert_ne!(first, second);
        assert_eq!(tracker.program_count(), 2, "old programs were released");
    }
}
