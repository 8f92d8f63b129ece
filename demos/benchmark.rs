//! Scene complexity benchmark
//!
//! Renders grids of 1 to 500 cubes offscreen and writes one JSON file per run
//! plus a summary to `benchmarks/results/`.

use std::path::Path;

use spatial_render::{
    logging::{init_logging, LoggingConfig},
    prelude::*,
};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;
const OBJECT_COUNTS: [usize; 5] = [1, 10, 50, 100, 500];
const WARMUP_FRAMES: usize = 10;
const MEASURED_FRAMES: usize = 100;
const GRID_WIDTH: usize = 10;
const GRID_SPACING: f32 = 0.5;

fn build_scene(object_count: usize, material: &SharedMaterial) -> Scene {
    let mut scene = Scene::new();
    for i in 0..object_count {
        let x = (i % GRID_WIDTH) as f32 * GRID_SPACING - 2.5;
        let y = (i / GRID_WIDTH) as f32 * GRID_SPACING - 2.5;
        scene.add_object(
            Some(shared(cube())),
            Some(material.clone()),
            Matrix4::from_translation(Vector3::new(x, y, 0.0)),
            Vector3::new(0.8, 0.2, 0.2),
        );
    }
    scene
}

fn render_frame(renderer: &mut Renderer, scene: &Scene, camera: &Camera) -> (f64, f64) {
    let mut timer = FrameTimer::start();

    renderer.begin_frame();
    renderer.clear(Renderer::DEFAULT_CLEAR_COLOR);

    timer.begin_render();
    renderer.render_scene(scene, camera);
    timer.end_render();

    renderer.end_frame();
    renderer.wait_idle();

    timer.finish()
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let results_dir = Path::new("benchmarks/results");
    let mut renderer = Renderer::new(
        RendererConfig::default()
            .with_size(WIDTH, HEIGHT)
            .with_label("Benchmark"),
    )?;

    let mut material = renderer.create_material().with_label("basic");
    material.load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)?;
    let material = shared(material);

    let mut camera = Camera::default();
    camera.set_perspective(45.0, WIDTH as f32 / HEIGHT as f32, 0.1, 100.0);
    camera.set_position(Vector3::new(0.0, 0.0, 5.0));

    let mut harness = PerformanceHarness::new();

    for object_count in OBJECT_COUNTS {
        log::info!("Benchmarking scene with {} objects...", object_count);
        let scene = build_scene(object_count, &material);

        for _ in 0..WARMUP_FRAMES {
            render_frame(&mut renderer, &scene, &camera);
        }

        harness.start_benchmark(
            object_count,
            Resolution {
                width: WIDTH,
                height: HEIGHT,
            },
        );
        for _ in 0..MEASURED_FRAMES {
            let (frame_us, render_us) = render_frame(&mut renderer, &scene, &camera);
            harness.record_frame(frame_us, render_us);
        }

        if let Some(result) = harness.end_benchmark() {
            println!("{} objects", result.scene_complexity);
            println!("  FPS: {:.1}", result.avg_fps);
            println!("  Avg Frame Time: {:.1} us", result.avg_frame_time_us);
            println!("  Avg Render Time: {:.1} us", result.avg_render_time_us);
            println!("  Frame Variance: {:.1}", result.frame_variance);
            PerformanceHarness::save_result(results_dir, result)?;
        }
    }

    harness.save_summary(results_dir.join("summary.json"))?;
    Ok(())
}
