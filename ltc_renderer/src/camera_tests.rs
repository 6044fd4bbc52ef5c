use glam::{Mat4, Vec3};
use super::*;

fn projection() -> Mat4 {
    Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_camera_new() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let camera = Camera::new(view, projection());

    assert_eq!(*camera.view_matrix(), view);
    assert_eq!(*camera.projection_matrix(), projection());
}

#[test]
fn test_look_at_matches_manual_matrices() {
    let eye = Vec3::new(0.0, 6.0, 0.5);
    let camera = Camera::look_at(eye, Vec3::ZERO, std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);

    assert_eq!(*camera.view_matrix(), Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y));
    assert_eq!(*camera.projection_matrix(), projection());
}

// ============================================================================
// Derived values
// ============================================================================

#[test]
fn test_view_projection_matrix() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let camera = Camera::new(view, projection());

    assert_eq!(camera.view_projection_matrix(), projection() * view);
}

#[test]
fn test_position_from_view() {
    let eye = Vec3::new(3.0, -2.0, 7.0);
    let camera = Camera::new(Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y), projection());

    assert!(camera.position().abs_diff_eq(eye, 1e-4));
}

// ============================================================================
// Setters
// ============================================================================

#[test]
fn test_setters_store_values() {
    let mut camera = Camera::new(Mat4::IDENTITY, Mat4::IDENTITY);
    let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    camera.set_view(view);
    camera.set_projection(projection());

    assert_eq!(*camera.view_matrix(), view);
    assert_eq!(*camera.projection_matrix(), projection());
}
