mod common;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use spatial_render::{
    gfx::{
        camera::Camera,
        geometry::{cube, sphere, UploadState},
        rendering::{capture, Renderer},
        scene::Scene,
    },
    shaders, shared,
};

const WIDTH: u32 = 128;
const HEIGHT: u32 = 96;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.15,
    a: 1.0,
};

fn to_u8(c: f64) -> u8 {
    (c * 255.0).round() as u8
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * WIDTH + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn near(actual: [u8; 4], expected: [u8; 4], tolerance: u8) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| a.abs_diff(*e) <= tolerance)
}

fn cube_scene(renderer: &Renderer) -> Scene {
    let mut material = renderer.create_material();
    material
        .load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)
        .unwrap();

    let mut scene = Scene::new();
    scene.add_object(
        Some(shared(cube())),
        Some(shared(material)),
        Matrix4::identity(),
        Vector3::new(0.8, 0.2, 0.2),
    );
    scene
}

#[test]
fn cube_scene_keeps_clear_color_in_corner() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let scene = cube_scene(&renderer);
    let camera = Camera::default();

    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.render_scene(&scene, &camera);
    renderer.end_frame();

    let stats = renderer.frame_stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.indices, 36);

    let pixels = renderer.capture_framebuffer().unwrap();
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);

    let clear = [to_u8(CLEAR.r), to_u8(CLEAR.g), to_u8(CLEAR.b), 255];
    assert!(near(pixel(&pixels, 0, 0), clear, 2));

    // The cube covers the center and is tinted red
    let center = pixel(&pixels, WIDTH / 2, HEIGHT / 2);
    assert!(!near(center, clear, 2));
    assert!(center[0] > center[1] && center[0] > center[2]);

    let mesh = scene.get_object(0).unwrap().mesh.as_ref().unwrap();
    assert_eq!(mesh.borrow().upload_state(), UploadState::Uploaded);
}

fn is_clear(pixel: [u8; 4]) -> bool {
    near(pixel, [to_u8(CLEAR.r), to_u8(CLEAR.g), to_u8(CLEAR.b), 255], 2)
}

/// Column and row where a view-space point lands for a 45° camera with the
/// target's aspect, from the pinhole model alone
fn predicted_pixel(x: f32, y: f32, depth: f32) -> (f32, f32) {
    let f = 1.0 / (22.5f32).to_radians().tan();
    let aspect = WIDTH as f32 / HEIGHT as f32;
    let ndc_x = f / aspect * x / depth;
    let ndc_y = f * y / depth;
    (
        (ndc_x + 1.0) * 0.5 * WIDTH as f32,
        (1.0 - ndc_y) * 0.5 * HEIGHT as f32,
    )
}

fn render_single(renderer: &mut Renderer, scene: &Scene) -> Vec<u8> {
    let mut camera = Camera::default();
    camera.resize_projection(WIDTH, HEIGHT);

    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.render_scene(scene, &camera);
    renderer.end_frame();
    renderer.capture_framebuffer().unwrap()
}

#[test]
fn cube_silhouette_matches_pinhole_projection() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let scene = cube_scene(&renderer);
    let pixels = render_single(&mut renderer, &scene);

    // Front face at z = 0.5 is 2.5 units from the camera at (0, 0, 3)
    let (right, top) = predicted_pixel(0.5, 0.5, 2.5);
    let (left, bottom) = predicted_pixel(-0.5, -0.5, 2.5);
    let (cx, cy) = (WIDTH / 2, HEIGHT / 2);

    assert!(!is_clear(pixel(&pixels, (right - 2.0) as u32, cy)));
    assert!(is_clear(pixel(&pixels, (right + 2.0) as u32, cy)));
    assert!(!is_clear(pixel(&pixels, (left + 2.0) as u32, cy)));
    assert!(is_clear(pixel(&pixels, (left - 2.0) as u32, cy)));

    assert!(!is_clear(pixel(&pixels, cx, (top + 2.0) as u32)));
    assert!(is_clear(pixel(&pixels, cx, (top - 2.0) as u32)));
    assert!(!is_clear(pixel(&pixels, cx, (bottom - 2.0) as u32)));
    assert!(is_clear(pixel(&pixels, cx, (bottom + 2.0) as u32)));
}

#[test]
fn green_sphere_scene_renders_round_silhouette() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let mut material = renderer.create_material();
    material
        .load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)
        .unwrap();

    let mut scene = Scene::new();
    scene.add_object(
        Some(shared(sphere(32))),
        Some(shared(material)),
        Matrix4::identity(),
        Vector3::new(0.2, 0.8, 0.2),
    );
    let pixels = render_single(&mut renderer, &scene);

    let center = pixel(&pixels, WIDTH / 2, HEIGHT / 2);
    assert!(center[1] > center[0] && center[1] > center[2]);

    // Tangent from the eye to a 0.5 radius sphere 3 units away
    let tangent = 0.5 / (3.0f32 * 3.0 - 0.25).sqrt();
    let (right, _) = predicted_pixel(tangent, 0.0, 1.0);
    let (_, top) = predicted_pixel(0.0, tangent, 1.0);
    let cy = HEIGHT / 2;
    let cx = WIDTH / 2;

    assert!(!is_clear(pixel(&pixels, (right - 3.0) as u32, cy)));
    assert!(is_clear(pixel(&pixels, (right + 2.0) as u32, cy)));
    assert!(!is_clear(pixel(&pixels, cx, (top + 3.0) as u32)));
    assert!(is_clear(pixel(&pixels, cx, (top - 2.0) as u32)));

    // Corners of the bounding square stay clear on a round shape
    let inset = (right - WIDTH as f32 / 2.0) * 0.9;
    let corner = (
        (WIDTH as f32 / 2.0 + inset) as u32,
        (HEIGHT as f32 / 2.0 - inset) as u32,
    );
    assert!(is_clear(pixel(&pixels, corner.0, corner.1)));
}

#[test]
fn resize_rejects_sizes_beyond_device_limit() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let max = renderer.device().limits().max_texture_dimension_2d;

    let err = renderer.resize(max + 1, 4).unwrap_err();
    assert!(matches!(err, spatial_render::GpuError::InvalidSize { .. }));
    assert_eq!((renderer.width(), renderer.height()), (WIDTH, HEIGHT));

    // Zero sizes are ignored
    renderer.resize(0, 10).unwrap();
    assert_eq!((renderer.width(), renderer.height()), (WIDTH, HEIGHT));

    renderer.resize(32, 16).unwrap();
    assert_eq!((renderer.width(), renderer.height()), (32, 16));

    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.end_frame();
    assert_eq!(renderer.capture_framebuffer().unwrap().len(), 32 * 16 * 4);
}

#[test]
fn clear_without_draws_is_flushed_at_end_frame() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };

    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.end_frame();

    let pixels = renderer.capture_framebuffer().unwrap();
    let clear = [to_u8(CLEAR.r), to_u8(CLEAR.g), to_u8(CLEAR.b), 255];
    assert!(near(pixel(&pixels, WIDTH - 1, HEIGHT - 1), clear, 2));
    assert_eq!(renderer.frame_stats().draw_calls, 0);
}

#[test]
fn objects_without_valid_material_are_skipped() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let mut scene = Scene::new();
    let mesh = shared(cube());
    scene.add_object(Some(mesh.clone()), None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
    scene.add_object_default(mesh.clone(), shared(renderer.create_material()));

    renderer.begin_frame();
    renderer.clear(Renderer::DEFAULT_CLEAR_COLOR);
    renderer.render_scene(&scene, &Camera::default());
    renderer.end_frame();

    assert_eq!(renderer.frame_stats().draw_calls, 0);
    assert_eq!(mesh.borrow().upload_state(), UploadState::Empty);

    let pixels = renderer.capture_framebuffer().unwrap();
    assert!(near(pixel(&pixels, WIDTH / 2, HEIGHT / 2), [0, 0, 0, 255], 0));
}

#[test]
fn many_objects_share_one_material() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let mut material = renderer.create_material();
    material
        .load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)
        .unwrap();
    let material = shared(material);
    let mesh = shared(cube());

    // Enough draws to grow the uniform arena past its initial size
    let mut scene = Scene::new();
    for i in 0..600 {
        let x = (i % 30) as f32 * 0.1 - 1.5;
        scene.add_object(
            Some(mesh.clone()),
            Some(material.clone()),
            Matrix4::from_translation(Vector3::new(x, 0.0, -5.0)) * Matrix4::from_scale(0.05),
            Vector3::new(0.0, 1.0, 0.0),
        );
    }

    for _ in 0..2 {
        renderer.begin_frame();
        renderer.clear(CLEAR);
        renderer.render_scene(&scene, &Camera::default());
        renderer.end_frame();
        assert_eq!(renderer.frame_stats().draw_calls, 600);
    }
}

#[test]
fn framebuffer_is_saved_as_png() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let scene = cube_scene(&renderer);

    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.render_scene(&scene, &Camera::default());
    renderer.end_frame();

    let dir = std::env::temp_dir().join(format!("spatial-render-render-{}", std::process::id()));
    let first = dir.join("first.png");
    let second = dir.join("second.png");
    renderer.save_framebuffer_to_file(&first).unwrap();

    // The same frame rendered again matches its own golden image
    renderer.begin_frame();
    renderer.clear(CLEAR);
    renderer.render_scene(&scene, &Camera::default());
    renderer.end_frame();
    renderer.save_framebuffer_to_file(&second).unwrap();

    let comparison =
        capture::compare_files(&second, &first, capture::DEFAULT_DIFF_THRESHOLD).unwrap();
    assert!(comparison.matches, "difference {}", comparison.difference);

    let image = image::open(&first).unwrap();
    assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn calls_outside_a_frame_are_ignored() {
    let Some(mut renderer) = common::try_renderer(WIDTH, HEIGHT) else {
        return;
    };
    let scene = cube_scene(&renderer);

    renderer.clear(CLEAR);
    renderer.render_scene(&scene, &Camera::default());
    renderer.end_frame();

    assert!(!renderer.is_in_frame());
    assert_eq!(renderer.frame_stats().draw_calls, 0);
}
