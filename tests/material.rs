mod common;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use spatial_render::{gfx::resources::MaterialError, shaders};

#[test]
fn uniforms_on_an_invalid_material_are_ignored() {
    let Some(renderer) = common::try_renderer(64, 64) else {
        return;
    };
    let mut material = renderer.create_material();
    assert!(!material.is_valid());

    material.set_uniform("model", Matrix4::<f32>::identity());
    material.set_uniform("color", Vector3::new(1.0f32, 0.0, 0.0));
    material.set_uniform("time", 1.0f32);
    material.use_program();

    assert!(!material.is_valid());
    assert!(!material.is_active());
    assert!(material.uniform_data().is_empty());
}

#[test]
fn basic_program_links_and_accepts_uniforms() {
    let Some(renderer) = common::try_renderer(64, 64) else {
        return;
    };
    let mut material = renderer.create_material();
    material
        .load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)
        .unwrap();
    assert!(material.is_valid());

    material.set_uniform("color", Vector3::new(0.25f32, 0.5, 0.75));
    let floats: Vec<f32> = material.uniform_data()[128..140]
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(floats, vec![0.25, 0.5, 0.75]);

    // Unknown names and mismatched types leave the block untouched
    let before = material.uniform_data().to_vec();
    material.set_uniform("missing", 1.0f32);
    material.set_uniform("color", 1.0f32);
    assert_eq!(material.uniform_data(), before.as_slice());

    material.release();
    assert!(!material.is_valid());
}

#[test]
fn compile_error_leaves_material_invalid() {
    let Some(renderer) = common::try_renderer(64, 64) else {
        return;
    };
    let mut material = renderer.create_material();

    let err = material
        .load_from_source("this is not wgsl", shaders::BASIC_FRAGMENT)
        .unwrap_err();
    assert!(matches!(err, MaterialError::Compile { .. }));
    assert!(!material.is_valid());

    // A previously linked program is released by a failed reload
    material
        .load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)
        .unwrap();
    assert!(material
        .load_from_source(shaders::BASIC_VERTEX, "@fragment fn fs_main() {")
        .is_err());
    assert!(!material.is_valid());
}

#[test]
fn mismatched_stage_interfaces_fail_to_link() {
    let Some(renderer) = common::try_renderer(64, 64) else {
        return;
    };
    let mut material = renderer.create_material();

    // Fragment declares a different uniform block
    let fragment = r#"
        struct Other { tint: vec4<f32> };
        @group(0) @binding(0) var<uniform> u: Other;

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return u.tint;
        }
    "#;
    let err = material
        .load_from_source(shaders::BASIC_VERTEX, fragment)
        .unwrap_err();
    assert!(matches!(err, MaterialError::Link { .. }));
    assert!(!material.is_valid());
}

#[test]
fn missing_shader_file_is_an_io_error() {
    let Some(renderer) = common::try_renderer(64, 64) else {
        return;
    };
    let mut material = renderer.create_material();
    let err = material
        .load_from_files("does/not/exist.vert.wgsl", "does/not/exist.frag.wgsl")
        .unwrap_err();
    assert!(matches!(err, MaterialError::Io { .. }));
    assert!(!material.is_valid());
}
