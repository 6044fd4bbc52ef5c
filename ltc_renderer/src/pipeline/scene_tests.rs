//! Unit tests for scene.rs

use std::rc::Rc;

use glam::{Quat, Vec3};

use super::*;
use crate::error::Error;
use crate::test_support::CountingGeometry;

fn geometry() -> Rc<dyn Geometry> {
    Rc::new(CountingGeometry::default())
}

fn scene() -> Scene {
    Scene::new(
        vec![SceneObject::new(geometry(), Mat4::IDENTITY)],
        vec![LightInstance::new(Vec3::new(0.0, 2.0, 0.0))],
        geometry(),
    )
    .unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_scene_requires_objects() {
    let result = Scene::new(Vec::new(), vec![LightInstance::default()], geometry());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_scene_requires_lights() {
    let result = Scene::new(vec![SceneObject::new(geometry(), Mat4::IDENTITY)], Vec::new(), geometry());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_default_parameters() {
    let scene = scene();
    assert_eq!(*scene.params(), SceneParameters::default());
    assert_eq!(scene.params().roughness, 0.25);
    assert!(!scene.params().two_sided);
}

// ============================================================================
// Lights
// ============================================================================

#[test]
fn test_unrotated_light_basis_spans_quad_plane() {
    let light = LightInstance::default();
    let (right, up, direction) = light.basis();
    assert!(right.abs_diff_eq(Vec3::X, 1e-6));
    assert!(up.abs_diff_eq(-Vec3::Z, 1e-6));
    assert!(direction.abs_diff_eq(Vec3::Y, 1e-6));
}

#[test]
fn test_light_basis_is_orthonormal() {
    let light = LightInstance {
        rotation: Quat::from_euler(glam::EulerRot::YXZ, 0.7, -0.3, 0.2),
        ..Default::default()
    };
    let (right, up, direction) = light.basis();
    assert!((right.length() - 1.0).abs() < 1e-5);
    assert!(right.dot(up).abs() < 1e-5);
    assert!(right.cross(up).abs_diff_eq(direction, 1e-5));
}

#[test]
fn test_model_matrix_scales_unit_quad() {
    let light = LightInstance {
        position: Vec3::new(1.0, 2.0, 3.0),
        width: 4.0,
        height: 2.0,
        ..Default::default()
    };
    let corner = light.model_matrix().transform_point3(Vec3::new(0.5, 0.0, 0.5));
    assert!(corner.abs_diff_eq(Vec3::new(3.0, 2.0, 4.0), 1e-6));
}

#[test]
fn test_light_block_layout() {
    assert_eq!(LightBlock::SIZE, 96);
    let light = LightInstance {
        position: Vec3::new(1.0, 2.0, 3.0),
        width: 3.0,
        height: 1.5,
        intensity: 2.0,
        color: Vec3::new(1.0, 0.5, 0.25),
        ..Default::default()
    };

    let block = LightBlock::new(&light, true, false);
    assert_eq!(block.position, Vec4::new(1.0, 2.0, 3.0, 1.0));
    assert_eq!(block.color, Vec4::new(2.0, 1.0, 0.5, 1.0));
    assert_eq!(block.params, Vec4::new(3.0, 1.5, 1.0, 0.0));
    assert_eq!(block.right.w, 0.0);
    assert_eq!(block.as_bytes().len(), LightBlock::SIZE);
}

// ============================================================================
// Snapshot
// ============================================================================

#[test]
fn test_snapshot_tracks_edits() {
    let mut scene = scene();
    let before = scene.snapshot();
    assert_eq!(before, scene.snapshot());

    scene.lights_mut()[0].rotation = Quat::from_rotation_y(0.1);
    let rotated = scene.snapshot();
    assert_ne!(before, rotated);

    scene.params_mut().albedo = Vec3::new(0.5, 0.5, 0.5);
    assert_ne!(rotated, scene.snapshot());
}

#[test]
fn test_snapshot_ignores_unchanged_writes() {
    let mut scene = scene();
    let before = scene.snapshot();
    let roughness = scene.params().roughness;
    scene.params_mut().roughness = roughness;
    scene.lights_mut()[0].width = 5.0;
    assert_eq!(before, scene.snapshot());
}
