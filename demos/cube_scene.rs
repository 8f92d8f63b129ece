//! Renders a tinted cube offscreen and writes `cube_scene.png`
//!
//! Usage: cargo run --example cube_scene [output.png]

use spatial_render::{
    logging::{init_logging, LoggingConfig},
    prelude::*,
};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "cube_scene.png".to_string());

    let mut renderer = Renderer::new(RendererConfig::default().with_size(WIDTH, HEIGHT))?;

    let mut material = renderer.create_material().with_label("basic");
    material.load_from_files("shaders/basic.vert.wgsl", "shaders/basic.frag.wgsl")?;

    let mut scene = Scene::new();
    let mut object = SceneObject::new(
        Some(shared(cube_with_face_normals())),
        Some(shared(material)),
        Matrix4::identity(),
        Vector3::new(0.8, 0.2, 0.2),
    );
    object.set_transform_trs(Vector3::new(0.0, 0.0, 0.0), Deg(30.0), 1.0);
    scene.push(object);

    let mut camera = Camera::new(
        Vector3::new(1.5, 1.5, 3.0),
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    camera.set_perspective(45.0, WIDTH as f32 / HEIGHT as f32, 0.1, 100.0);

    renderer.begin_frame();
    renderer.clear(wgpu::Color {
        r: 0.1,
        g: 0.1,
        b: 0.15,
        a: 1.0,
    });
    renderer.render_scene(&scene, &camera);
    renderer.end_frame();

    let stats = renderer.frame_stats();
    log::info!(
        "Drew {} objects: {} draw calls, {} indices",
        scene.object_count(),
        stats.draw_calls,
        stats.indices
    );

    renderer.save_framebuffer_to_file(&output)?;
    Ok(())
}
