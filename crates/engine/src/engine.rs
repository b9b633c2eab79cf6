use foundation::math::Vec3;
use foundation::mercator::LonLat;
use gpu::backend::{PipelineState, RenderBackend};
use gpu::programs::build_scene_programs;
use gpu::tracker::GpuResourceTracker;
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use scene::light::{Light, animate_lights};
use scene::scene::Scene;
use scene::style::Style;
use tiles::manager::TileManager;
use tiles::source::DataSource;
use view::View;

use crate::config::EngineConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running,
    Torndown,
}

/// The engine instance: owns the view, scene, tile manager, and GPU
/// resource tracker, and exposes the entire host-callable surface.
///
/// Single-threaded by contract: the host calls every method here on the
/// thread that owns the GPU context, and `update` completes before
/// `render` within a frame. Nothing here raises to the host; failures are
/// absorbed and reported through the event bus.
pub struct Engine {
    config: EngineConfig,
    state: EngineState,
    frame: Frame,
    bus: EventBus,
    tracker: GpuResourceTracker,
    view: Option<View>,
    scene: Option<Scene>,
    tiles: Option<TileManager>,
    pending_sources: Vec<Box<dyn DataSource>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::Uninitialized,
            frame: Frame::start(),
            bus: EventBus::new(),
            tracker: GpuResourceTracker::new(),
            view: None,
            scene: None,
            tiles: None,
            pending_sources: Vec::new(),
        }
    }

    /// Register a tile provider. Usable before or after `initialize`;
    /// sources registered before are wired in when it runs.
    pub fn add_source(&mut self, source: Box<dyn DataSource>) {
        match &mut self.tiles {
            Some(manager) => manager.add_source(source),
            None => self.pending_sources.push(source),
        }
    }

    /// Create the view, scene, and tile manager exactly once and apply the
    /// fixed pipeline state. Calling again is a no-op; a torn-down engine
    /// stays torn down.
    pub fn initialize(&mut self, backend: &mut dyn RenderBackend) {
        if self.state != EngineState::Uninitialized {
            self.bus
                .trace(self.frame, "engine", "initialize called again; ignoring");
            return;
        }

        if self.view.is_none() {
            self.view = Some(View::at_lon_lat(LonLat::new(
                self.config.start_lon,
                self.config.start_lat,
            )));
        }

        if self.scene.is_none() {
            let mut scene = default_scene();
            build_scene_programs(&mut scene, &mut self.tracker);
            self.scene = Some(scene);
        }

        if self.tiles.is_none() {
            let mut manager = TileManager::new(self.config.tile_manager_config());
            for source in self.pending_sources.drain(..) {
                manager.add_source(source);
            }
            self.tiles = Some(manager);
        }

        backend.apply_pipeline_state(&PipelineState::default());
        self.drain_gpu_errors(backend, "initialize");

        self.state = EngineState::Running;
        self.bus.trace(self.frame, "engine", "initialized");
    }

    pub fn resize(&mut self, width: u32, height: u32, backend: &mut dyn RenderBackend) {
        let Some(view) = &mut self.view else {
            return;
        };
        backend.set_viewport(width, height);
        view.set_size(width as f64, height as f64);
        self.drain_gpu_errors(backend, "resize");
    }

    /// Advance one frame: stream tiles, then animate lights off the
    /// monotonic engine clock (not the raw delta).
    pub fn update(&mut self, dt_s: f64) {
        if self.state != EngineState::Running {
            return;
        }
        self.frame = self.frame.advanced(dt_s);

        if let (Some(view), Some(scene), Some(tiles)) =
            (&self.view, &self.scene, &mut self.tiles)
        {
            tiles.update_tile_set(view, scene, &mut self.tracker, self.frame, &mut self.bus);
        }

        if let Some(scene) = &mut self.scene {
            animate_lights(scene.lights_mut(), self.frame.time, 0.0);
        }
    }

    /// Draw the frame: clear, then scene styles in order over the visible
    /// tiles. Zero styles or zero tiles still clears and draws nothing.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) {
        if self.state != EngineState::Running {
            return;
        }
        backend.clear(true, true);

        if let (Some(view), Some(scene), Some(tiles)) = (&self.view, &self.scene, &self.tiles) {
            let visible = tiles.visible_tiles(view);
            for style in scene.styles() {
                let Some(program) = style.program() else {
                    self.bus.warn(
                        self.frame,
                        "render",
                        format!("style {} has no program; skipped", style.name()),
                    );
                    continue;
                };
                if let Err(e) = self.tracker.bind_program(program, backend) {
                    self.bus.error(self.frame, "render", e.to_string());
                    continue;
                }
                for (_, tile) in &visible {
                    if let Err(e) = tile.draw(style, &mut self.tracker, backend) {
                        self.bus.error(self.frame, "render", e.to_string());
                    }
                }
            }
        }

        self.drain_gpu_errors(backend, "render");
    }

    pub fn handle_tap(&mut self, pos_x: f64, pos_y: f64) {
        let Some(view) = &mut self.view else {
            return;
        };
        view.translate(pos_x, pos_y);
        self.bus
            .trace(self.frame, "gesture", format!("tap ({pos_x}, {pos_y})"));
    }

    pub fn handle_double_tap(&mut self, pos_x: f64, pos_y: f64) {
        self.bus.trace(
            self.frame,
            "gesture",
            format!("double tap ({pos_x}, {pos_y})"),
        );
    }

    /// Pan velocity scales with zoom so screen-space motion feels constant:
    /// one step out doubles the translation per velocity unit.
    pub fn handle_pan(&mut self, vel_x: f64, vel_y: f64) {
        let Some(view) = &mut self.view else {
            return;
        };
        let scale = 0.1 * (16.0 - view.zoom()).exp2();
        view.translate(-vel_x * scale, vel_y * scale);
    }

    /// Pinch steps zoom discretely: in for scale >= 1, out otherwise.
    pub fn handle_pinch(&mut self, _pos_x: f64, _pos_y: f64, scale: f64) {
        let Some(view) = &mut self.view else {
            return;
        };
        view.zoom_by(if scale < 1.0 { -1.0 } else { 1.0 });
    }

    /// Release everything owned by this engine. Terminal.
    pub fn teardown(&mut self) {
        if let Some(mut tiles) = self.tiles.take() {
            tiles.teardown(&mut self.tracker);
        }
        self.scene = None;
        self.view = None;
        self.tracker.clear();
        self.state = EngineState::Torndown;
        self.bus.trace(self.frame, "engine", "torn down");
    }

    /// The GPU context was destroyed: mark every live GPU resource invalid.
    /// Touches no GPU state, so it is safe at any point after initialize;
    /// resources rebuild lazily at their next bind.
    pub fn on_context_destroyed(&mut self) {
        self.tracker.invalidate_all();
        self.bus
            .trace(self.frame, "engine", "context lost; resources invalidated");
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn tile_manager(&self) -> Option<&TileManager> {
        self.tiles.as_ref()
    }

    /// Rebuild shader programs after a host-side scene mutation.
    pub fn rebuild_shaders(&mut self) {
        if let Some(scene) = &mut self.scene {
            build_scene_programs(scene, &mut self.tracker);
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    fn drain_gpu_errors(&mut self, backend: &mut dyn RenderBackend, stage: &'static str) {
        for error in backend.drain_errors() {
            self.bus.error(self.frame, stage, error.to_string());
        }
    }
}

/// The hard-coded default composition: filled polygons over the base
/// layers, lines over roads, one orbiting point light and one sweeping
/// spot.
fn default_scene() -> Scene {
    let mut scene = Scene::new();

    let mut polygons = Style::polygon("Polygon");
    polygons.add_layers(["buildings", "water", "earth", "landuse"]);
    scene.add_style(polygons);

    let mut lines = Style::polyline("Polyline");
    lines.add_layers(["roads"]);
    scene.add_style(lines);

    scene.add_light(Light::Point {
        position: Vec3::zero(),
        diffuse: [0.0, 1.0, 0.0, 1.0],
        specular: [0.5, 0.0, 1.0, 1.0],
        attenuation: (0.0, 0.01),
    });
    scene.add_light(Light::Spot {
        position: Vec3::zero(),
        direction: Vec3::new(0.0, std::f64::consts::PI * 0.25, 0.0),
        specular: [0.5, 0.5, 0.0, 1.0],
        cutoff: (std::f64::consts::PI * 0.1, 0.2),
        attenuation: (0.0, 0.02),
    });

    scene
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Engine, EngineState};
    use crate::config::EngineConfig;
    use foundation::tile::TileId;
    use gpu::backend::{CommandRecorder, GpuCommand};
    use runtime::event_bus::Severity;
    use tiles::source::{FixtureSource, TileData};
    use scene::feature::Feature;

    fn engine() -> (Engine, CommandRecorder) {
        (Engine::new(EngineConfig::default()), CommandRecorder::new())
    }

    /// An engine over a one-tile viewport with fixture data covering it.
    fn streaming_engine() -> (Engine, CommandRecorder) {
        let mut config = EngineConfig::default();
        config.start_lon = 0.0;
        config.start_lat = 0.0;
        let mut e = Engine::new(config);
        let mut backend = CommandRecorder::new();
        e.initialize(&mut backend);
        e.resize(16, 16, &mut backend);
        // Zoom out to 2 so a handful of tiles covers the viewport.
        for _ in 0..14 {
            e.handle_pinch(0.0, 0.0, 0.5);
        }

        let mut source = FixtureSource::new("fixture");
        for id in e.view().unwrap().visible_tiles() {
            source.insert(
                id,
                TileData::new().with_layer(
                    "water",
                    vec![Feature::polygon(vec![vec![
                        [0.0, 0.0, 0.0],
                        [10.0, 0.0, 0.0],
                        [10.0, 10.0, 0.0],
                        [0.0, 10.0, 0.0],
                    ]])],
                ),
            );
        }
        e.add_source(Box::new(source));
        backend.take_commands();
        (e, backend)
    }

    #[test]
    fn initialize_is_idempotent() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        assert_eq!(e.state(), EngineState::Running);
        let styles_before = e.scene().unwrap().styles().len();
        let position = e.view().unwrap().position();

        e.handle_pan(10.0, 0.0);
        let moved = e.view().unwrap().position();
        assert_ne!(moved, position);

        e.initialize(&mut backend);
        assert_eq!(e.view().unwrap().position(), moved, "view not recreated");
        assert_eq!(e.scene().unwrap().styles().len(), styles_before);
    }

    #[test]
    fn default_scene_matches_the_built_in_composition() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        let scene = e.scene().unwrap();
        let names: Vec<_> = scene.styles().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Polygon", "Polyline"]);
        assert_eq!(scene.lights().len(), 2);
        assert!(scene.styles().iter().all(|s| s.program().is_some()));
    }

    #[test]
    fn pan_scale_doubles_per_zoom_step_out() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        assert_eq!(e.view().unwrap().zoom(), 16.0);

        let start = e.view().unwrap().position();
        e.handle_pan(30.0, 50.0);
        let after = e.view().unwrap().position();
        assert!((after.x - (start.x - 3.0)).abs() < 1e-9);
        assert!((after.y - (start.y + 5.0)).abs() < 1e-9);

        // One step out: the same velocity moves twice as far.
        e.handle_pinch(0.0, 0.0, 0.5);
        let start = e.view().unwrap().position();
        e.handle_pan(30.0, 50.0);
        let after = e.view().unwrap().position();
        assert!((after.x - (start.x - 6.0)).abs() < 1e-9);
        assert!((after.y - (start.y + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn pinch_steps_zoom_by_one() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        e.handle_pinch(0.0, 0.0, 0.5);
        assert_eq!(e.view().unwrap().zoom(), 15.0);
        e.handle_pinch(0.0, 0.0, 2.0);
        assert_eq!(e.view().unwrap().zoom(), 16.0);
        e.handle_pinch(0.0, 0.0, 1.0);
        assert_eq!(e.view().unwrap().zoom(), 17.0, "scale 1.0 zooms in");
    }

    #[test]
    fn gestures_before_initialize_are_noops() {
        let (mut e, _) = engine();
        e.handle_pan(10.0, 10.0);
        e.handle_pinch(0.0, 0.0, 2.0);
        e.handle_tap(1.0, 1.0);
        assert!(e.view().is_none());
    }

    #[test]
    fn render_with_no_tiles_clears_and_draws_nothing() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        backend.take_commands();

        e.render(&mut backend);
        let commands = backend.take_commands();
        assert!(matches!(commands[0], GpuCommand::Clear { color: true, depth: true }));
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, GpuCommand::DrawMesh { .. }))
                .count(),
            0
        );
    }

    #[test]
    fn streaming_produces_draw_calls() {
        let (mut e, mut backend) = streaming_engine();
        // First update launches fetches, second drains and builds.
        e.update(0.016);
        e.update(0.016);
        e.render(&mut backend);
        assert!(backend.draw_count() > 0);
    }

    #[test]
    fn context_loss_rebuilds_once_and_repaints_identically() {
        let (mut e, mut backend) = streaming_engine();
        e.update(0.016);
        e.update(0.016);

        e.render(&mut backend);
        let before: Vec<GpuCommand> = backend
            .take_commands()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    GpuCommand::DrawMesh { .. } | GpuCommand::BindProgram(_) | GpuCommand::Clear { .. }
                )
            })
            .collect();

        e.on_context_destroyed();
        e.render(&mut backend);
        let after_all = backend.take_commands();

        let compiles = after_all
            .iter()
            .filter(|c| matches!(c, GpuCommand::CompileProgram { .. }))
            .count();
        let uploads = after_all
            .iter()
            .filter(|c| matches!(c, GpuCommand::UploadMesh { .. }))
            .count();
        assert!(compiles >= 1, "programs rebuilt after loss");
        assert!(uploads >= 1, "meshes re-uploaded after loss");

        // Rebuilt exactly once: a second post-loss render recompiles nothing.
        e.render(&mut backend);
        let again = backend.take_commands();
        assert_eq!(
            again
                .iter()
                .filter(|c| matches!(
                    c,
                    GpuCommand::CompileProgram { .. } | GpuCommand::UploadMesh { .. }
                ))
                .count(),
            0
        );

        // Same picture: the draw stream matches the pre-loss one.
        let after: Vec<GpuCommand> = after_all
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    GpuCommand::DrawMesh { .. } | GpuCommand::BindProgram(_) | GpuCommand::Clear { .. }
                )
            })
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn gpu_errors_are_drained_and_logged_not_raised() {
        let (mut e, mut backend) = engine();
        backend.inject_error("out of memory");
        e.initialize(&mut backend);
        assert_eq!(e.state(), EngineState::Running);
        let events = e.drain_events();
        assert!(
            events
                .iter()
                .any(|ev| ev.severity == Severity::Error && ev.kind == "initialize")
        );
    }

    #[test]
    fn resize_forwards_to_the_view() {
        let (mut e, mut backend) = engine();
        // Before initialize: guarded no-op.
        e.resize(100, 100, &mut backend);
        assert!(backend.commands().is_empty());

        e.initialize(&mut backend);
        e.resize(1024, 768, &mut backend);
        assert_eq!(e.view().unwrap().viewport(), (1024.0, 768.0));
    }

    #[test]
    fn teardown_is_terminal_and_releases_resources() {
        let (mut e, mut backend) = streaming_engine();
        e.update(0.016);
        e.update(0.016);
        e.teardown();
        assert_eq!(e.state(), EngineState::Torndown);
        assert!(e.view().is_none());

        // Subsequent calls are harmless no-ops.
        e.update(0.016);
        e.render(&mut backend);
        e.initialize(&mut backend);
        assert_eq!(e.state(), EngineState::Torndown);
    }

    #[test]
    fn update_before_initialize_is_a_noop() {
        let (mut e, _) = engine();
        e.update(0.5);
        assert!(e.tile_manager().is_none());
    }

    #[test]
    fn lights_move_with_engine_time() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        e.update(1.0);
        e.update(1.0); // light animation sees time = 1.0 here
        let lights = e.scene().unwrap().lights().to_vec();
        e.update(1.0); // time = 2.0
        assert_ne!(e.scene().unwrap().lights().to_vec(), lights);
    }

    #[test]
    fn double_tap_only_logs() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        let pos = e.view().unwrap().position();
        e.handle_double_tap(5.0, 5.0);
        assert_eq!(e.view().unwrap().position(), pos);
    }

    #[test]
    fn tap_translates_the_view() {
        let (mut e, mut backend) = engine();
        e.initialize(&mut backend);
        let pos = e.view().unwrap().position();
        e.handle_tap(10.0, -4.0);
        let after = e.view().unwrap().position();
        assert!((after.x - (pos.x + 10.0)).abs() < 1e-9);
        assert!((after.y - (pos.y - 4.0)).abs() < 1e-9);
    }

    #[test]
    fn visible_set_respects_a_smaller_viewport() {
        let (mut e, mut backend) = streaming_engine();
        let wide: Vec<TileId> = e.view().unwrap().visible_tiles();
        e.resize(8, 8, &mut backend);
        let narrow: Vec<TileId> = e.view().unwrap().visible_tiles();
        assert!(narrow.len() <= wide.len());
        for id in &narrow {
            assert!(wide.contains(id));
        }
    }
}
