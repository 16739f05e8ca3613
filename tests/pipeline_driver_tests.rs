//! Pipeline Driver Tests
//!
//! Tests for:
//! - Multi-camera frames with skipped cameras
//! - Frame counting and per-camera submission
//! - The reference scene visibility driving a full frame

mod common;

use glam::Vec3;

use common::*;
use forward_atlas::PipelineError;
use forward_atlas::renderer::command::{Command, CommandBuffer};
use forward_atlas::renderer::pipeline_driver::PipelineDriver;
use forward_atlas::scene::camera::Camera;
use forward_atlas::scene::light::{LightShadows, VisibleLight};
use forward_atlas::scene::object::{QUEUE_GEOMETRY, VisibleObject};
use forward_atlas::scene::visibility::SceneVisibility;
use forward_atlas::settings::PipelineSettings;

fn broken_camera() -> Camera {
    let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0).with_name("Broken");
    camera.far = camera.near;
    camera
}

// ============================================================================
// Camera Iteration
// ============================================================================

#[test]
fn renders_each_valid_camera_once() {
    init_logger();
    let mut driver = PipelineDriver::<16>::new(PipelineSettings::default()).unwrap();
    let mut visibility = ScriptedVisibility::new()
        .with_light(sun())
        .with_object(opaque(1, 0, 0.0));
    let mut stream = CommandBuffer::new();

    let cameras = [test_camera(), broken_camera(), test_camera().with_name("Second")];
    let stats = driver.render(&cameras, &mut visibility, &mut stream);

    assert_eq!(stats.frame_index, 0);
    assert_eq!(stats.cameras_rendered, 2);
    assert_eq!(stats.cameras_skipped, 1);
    assert_eq!(stats.cameras[0].camera, "Main");
    assert_eq!(stats.cameras[1].camera, "Second");
    assert_eq!(stream.submitted(), 2);
    assert_eq!(visibility.cull_calls, 2);
}

#[test]
fn frame_index_advances_per_render() {
    let mut driver = PipelineDriver::<4>::new(PipelineSettings::default()).unwrap();
    let mut visibility = ScriptedVisibility::new();
    let mut stream = CommandBuffer::new();

    for expected in 0..3 {
        let stats = driver.render(&[test_camera()], &mut visibility, &mut stream);
        assert_eq!(stats.frame_index, expected);
    }
    assert_eq!(driver.frame_index(), 3);

    let empty = driver.render(&[], &mut visibility, &mut stream);
    assert_eq!(empty.cameras_rendered, 0);
    assert_eq!(stream.submitted(), 3);
}

#[test]
fn rejects_unsupported_capacity() {
    let err = PipelineDriver::<32>::new(PipelineSettings::default())
        .err()
        .expect("capacity 32 should be rejected");
    assert!(matches!(err, PipelineError::UnsupportedLightCapacity(32)));
}

#[test]
fn settings_flow_into_draw_flags() {
    let settings = PipelineSettings {
        dynamic_batching: true,
        instancing: true,
        ..PipelineSettings::default()
    };
    let mut driver = PipelineDriver::<16>::new(settings.clone()).unwrap();
    assert_eq!(driver.settings(), &settings);

    let mut visibility = ScriptedVisibility::new().with_object(opaque(1, 0, 0.0));
    let mut stream = CommandBuffer::new();
    driver.render(&[test_camera()], &mut visibility, &mut stream);

    assert!(stream.draw_calls().all(|c| c.flags == settings.draw_flags()));
}

// ============================================================================
// Reference Visibility
// ============================================================================

fn courtyard() -> SceneVisibility {
    let mut scene = SceneVisibility::new();
    scene.add_light(sun());
    for i in 0..3 {
        scene.add_light(
            VisibleLight::spot(
                Vec3::ONE,
                4.0,
                Vec3::new(i as f32 * 4.0 - 4.0, 6.0, 0.0),
                Vec3::NEG_Y,
                12.0,
                45.0,
            )
            .with_shadows(LightShadows::Soft, 1.0),
        );
    }
    // Far outside every camera.
    scene.add_light(VisibleLight::point(Vec3::ONE, 1.0, Vec3::new(500.0, 0.0, 0.0), 2.0));

    scene.add_object(VisibleObject::new(0, QUEUE_GEOMETRY, 0).with_bounds(Vec3::new(0.0, 0.0, 0.0), 4.0));
    scene.add_object(VisibleObject::new(1, QUEUE_GEOMETRY, 1).with_bounds(Vec3::new(-4.0, 1.0, 0.0), 1.0));
    scene
}

#[test]
fn scene_visibility_drives_a_shadowed_frame() {
    let mut scene = courtyard();
    let mut driver = PipelineDriver::<16>::new(PipelineSettings::default()).unwrap();
    let mut stream = CommandBuffer::new();

    let stats = driver.render(&[test_camera()], &mut scene, &mut stream);
    let camera = &stats.cameras[0];

    assert_eq!(camera.visible_lights, 4, "the distant point light is culled");
    assert_eq!(camera.shadow_tile_count, 3);
    assert_eq!(camera.atlas_split, 2);
    assert_eq!(camera.shadow_tiles_rendered, 3);
    assert_eq!(camera.opaque_objects, 2);

    let state = stream.global_state();
    assert!(state.keyword_enabled("_SHADOWS_SOFT"));
    assert!(!state.keyword_enabled("_SHADOWS_HARD"));

    let shadow_draws: Vec<_> = stream
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::DrawShadowCasters { light_index } => Some(*light_index),
            _ => None,
        })
        .collect();
    assert_eq!(shadow_draws, vec![1, 2, 3]);
}

#[test]
fn disabled_lights_are_not_culled_in() {
    let mut scene = courtyard();
    for i in 1..=3 {
        scene.set_light_enabled(i, false);
    }
    let mut driver = PipelineDriver::<16>::new(PipelineSettings::default()).unwrap();
    let mut stream = CommandBuffer::new();

    let stats = driver.render(&[test_camera()], &mut scene, &mut stream);
    assert_eq!(stats.cameras[0].visible_lights, 1);
    assert_eq!(stats.cameras[0].shadow_tile_count, 0);
}

#[test]
fn scene_visibility_skips_degenerate_camera() {
    let mut scene = courtyard();
    let mut driver = PipelineDriver::<16>::new(PipelineSettings::default()).unwrap();
    let mut stream = CommandBuffer::new();

    let stats = driver.render(&[broken_camera()], &mut scene, &mut stream);
    assert_eq!(stats.cameras_skipped, 1);
    assert!(stream.commands().is_empty());
}
