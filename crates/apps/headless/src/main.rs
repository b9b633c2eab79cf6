use std::env;
use std::fs;

use engine::{Engine, EngineConfig};
use gpu::backend::{CommandRecorder, GpuCommand};
use runtime::event_bus::Severity;
use scene::feature::Feature;
use tiles::source::{FixtureSource, HttpSource, TileData};

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut frames: u64 = 120;
    let mut config_path: Option<String> = None;
    let mut url_template: Option<String> = None;
    let mut verbose = false;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => {
                i += 1;
                frames = args
                    .get(i)
                    .ok_or("--frames requires a value")?
                    .parse()
                    .map_err(|e| format!("--frames: {e}"))?;
            }
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).ok_or("--config requires a path")?.clone());
            }
            "--url" => {
                i += 1;
                url_template = Some(args.get(i).ok_or("--url requires a template")?.clone());
            }
            "--verbose" => verbose = true,
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    let config: EngineConfig = match config_path {
        Some(path) => {
            let bytes = fs::read(&path).map_err(|e| format!("read {path}: {e}"))?;
            serde_json::from_slice(&bytes).map_err(|e| format!("parse {path}: {e}"))?
        }
        None => EngineConfig::default(),
    };

    let mut backend = CommandRecorder::new();
    let mut engine = Engine::new(config);
    engine.initialize(&mut backend);
    engine.resize(800, 600, &mut backend);

    match url_template {
        Some(template) => {
            engine.add_source(Box::new(HttpSource::new("osm", template)));
        }
        None => {
            engine.add_source(Box::new(fixture_source(&engine)));
        }
    }

    let dt = 1.0 / 60.0;
    for frame in 0..frames {
        engine.update(dt);
        engine.render(&mut backend);

        // Light gesture traffic so the loop exercises the view.
        if frame % 30 == 10 {
            engine.handle_pan(4.0, 2.0);
        }
        // Halfway through, simulate a destroyed context to show recovery.
        if frame == frames / 2 {
            engine.on_context_destroyed();
        }

        for event in engine.drain_events() {
            if verbose || event.severity != Severity::Trace {
                println!(
                    "[frame {:>4}] {:?} {}: {}",
                    event.frame_index, event.severity, event.kind, event.message
                );
            }
        }
    }

    print_summary(&backend);
    engine.teardown();
    Ok(())
}

/// A synthetic downtown block covering every tile the start view can see:
/// one extruded building, a water polygon, and a road.
fn fixture_source(engine: &Engine) -> FixtureSource {
    let mut source = FixtureSource::new("fixture");
    let view = engine.view().expect("engine initialized");
    for id in view.visible_tiles() {
        let bounds = id.bounds_meters();
        let c = bounds.min;
        let w = bounds.max.x - bounds.min.x;
        let h = bounds.max.y - bounds.min.y;
        let data = TileData::new()
            .with_layer(
                "buildings",
                vec![
                    Feature::polygon(vec![vec![
                        [c.x + 0.2 * w, c.y + 0.2 * h, 0.0],
                        [c.x + 0.4 * w, c.y + 0.2 * h, 0.0],
                        [c.x + 0.4 * w, c.y + 0.4 * h, 0.0],
                        [c.x + 0.2 * w, c.y + 0.4 * h, 0.0],
                    ]])
                    .with_height(30.0),
                ],
            )
            .with_layer(
                "water",
                vec![Feature::polygon(vec![vec![
                    [c.x + 0.6 * w, c.y + 0.6 * h, 0.0],
                    [c.x + 0.9 * w, c.y + 0.6 * h, 0.0],
                    [c.x + 0.9 * w, c.y + 0.9 * h, 0.0],
                    [c.x + 0.6 * w, c.y + 0.9 * h, 0.0],
                ]])],
            )
            .with_layer(
                "roads",
                vec![Feature::line(vec![
                    [c.x, c.y + 0.5 * h, 0.0],
                    [c.x + w, c.y + 0.5 * h, 0.0],
                ])],
            );
        source.insert(id, data);
    }
    source
}

fn print_summary(backend: &CommandRecorder) {
    let mut pipeline = 0usize;
    let mut viewport = 0usize;
    let mut clears = 0usize;
    let mut compiles = 0usize;
    let mut uploads = 0usize;
    let mut binds = 0usize;
    let mut draws = 0usize;
    for c in backend.commands() {
        match c {
            GpuCommand::ApplyPipelineState(_) => pipeline += 1,
            GpuCommand::SetViewport { .. } => viewport += 1,
            GpuCommand::Clear { .. } => clears += 1,
            GpuCommand::CompileProgram { .. } => compiles += 1,
            GpuCommand::UploadMesh { .. } => uploads += 1,
            GpuCommand::BindProgram(_) => binds += 1,
            GpuCommand::DrawMesh { .. } => draws += 1,
        }
    }
    println!("commands: {} total", backend.commands().len());
    println!(
        "  pipeline {pipeline}  viewport {viewport}  clear {clears}  \
         compile {compiles}  upload {uploads}  bind {binds}  draw {draws}"
    );
}

fn usage() -> String {
    "usage: headless [--frames N] [--config engine.json] [--url https://.../{z}/{x}/{y}.json] [--verbose]"
        .to_string()
}
