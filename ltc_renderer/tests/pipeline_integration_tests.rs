//! Integration tests for the progressive LTC pipeline
//!
//! Drives full frames through the public API on the software GPU and
//! checks the frame state machine, pass structure and presentation.
//!
//! Run with: cargo test --test pipeline_integration_tests

mod test_utils;

use ltc_renderer::glam::Vec3;
use ltc_renderer::ltc::gpu::{CompareOp, GpuCommand, Viewport};
use ltc_renderer::ltc::render::{FrameStage, HeadlessSurface, PipelineConfig, PresentSurface};
use ltc_renderer::ltc::{Camera, DeviceProfile};
use test_utils::{create_test_device, create_test_pipeline, create_test_scene};

fn camera() -> Camera {
    Camera::look_at(Vec3::new(0.0, 8.0, 25.0), Vec3::ZERO, 0.7, 16.0 / 9.0, 0.1, 200.0)
}

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
fn test_integration_static_scene_converges() {
    let (_gpu, device) = create_test_device(DeviceProfile::Core);
    let mut pipeline = create_test_pipeline(&device, PipelineConfig { samples_per_frame: 2, ..Default::default() });
    let (_mesh, _quad, scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(160, 90);
    let viewport = Viewport::from_size(160, 90);

    let mut counts = Vec::new();
    for _ in 0..6 {
        pipeline.update(&camera(), &scene, viewport);
        let report = pipeline.render(&scene, &mut surface).unwrap();
        counts.push(report.sample_count_at(FrameStage::ColorAccumulate).unwrap());
    }

    assert_eq!(counts, vec![0, 2, 4, 6, 8, 10]);
    assert_eq!(surface.presented(), 6);
}

#[test]
fn test_integration_resize_invalidates_history() {
    let (_gpu, device) = create_test_device(DeviceProfile::Compatibility);
    let mut pipeline = create_test_pipeline(&device, PipelineConfig::default());
    let (_mesh, _quad, scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(160, 90);

    for _ in 0..3 {
        let (w, h) = surface.framebuffer_size();
        pipeline.update(&camera(), &scene, Viewport::from_size(w, h));
        pipeline.render(&scene, &mut surface).unwrap();
    }

    surface.resize(320, 180);
    let (w, h) = surface.framebuffer_size();
    pipeline.update(&camera(), &scene, Viewport::from_size(w, h));
    let report = pipeline.render(&scene, &mut surface).unwrap();

    assert!(report.reset);
    assert_eq!(report.sample_count_at(FrameStage::ColorAccumulate), Some(0));
    assert_eq!(pipeline.accumulation_texture().unwrap().width(), 320);
}

#[test]
fn test_integration_light_edit_restarts_accumulation() {
    let (_gpu, device) = create_test_device(DeviceProfile::Core);
    let mut pipeline = create_test_pipeline(&device, PipelineConfig::default());
    let (_mesh, _quad, mut scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(64, 64);
    let viewport = Viewport::from_size(64, 64);

    for _ in 0..4 {
        pipeline.update(&camera(), &scene, viewport);
        pipeline.render(&scene, &mut surface).unwrap();
    }
    assert_eq!(pipeline.frame_state().sample_count, 3);

    scene.lights_mut()[0].position.y += 1.0;
    pipeline.update(&camera(), &scene, viewport);

    assert!(pipeline.frame_state().reset);
    assert_eq!(pipeline.frame_state().sample_count, 0);
}

// ============================================================================
// PASS STRUCTURE
// ============================================================================

#[test]
fn test_integration_one_additive_pass_per_light() {
    let (gpu, device) = create_test_device(DeviceProfile::Core);
    let mut pipeline = create_test_pipeline(&device, PipelineConfig::default());
    let (mesh, quad, scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(64, 64);

    pipeline.update(&camera(), &scene, Viewport::from_size(64, 64));
    let report = pipeline.render(&scene, &mut surface).unwrap();

    // 3 objects, 2 lights
    assert_eq!(report.light_passes, 2);
    assert_eq!(report.depth_draws, 5);
    assert_eq!(report.accumulate_draws, 6);
    assert_eq!(report.emitter_draws, 2);
    assert_eq!(mesh.draws.get(), 3 + 6);
    assert_eq!(quad.draws.get(), 2 + 2);

    let gpu = gpu.borrow();
    let equal_depth_draws = gpu
        .draw_calls()
        .iter()
        .filter(|d| d.depth.test == Some(CompareOp::Equal) && !d.depth.write)
        .count();
    assert_eq!(equal_depth_draws, 6 + 2);
    assert!(gpu.errors().is_empty(), "{:?}", gpu.errors());
}

#[test]
fn test_integration_light_block_uploaded_per_light() {
    let (gpu, device) = create_test_device(DeviceProfile::Core);
    let mut pipeline = create_test_pipeline(&device, PipelineConfig::default());
    let (_mesh, _quad, scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(64, 64);
    gpu.borrow_mut().take_commands();

    pipeline.update(&camera(), &scene, Viewport::from_size(64, 64));
    pipeline.render(&scene, &mut surface).unwrap();

    let light_buffer = pipeline.light_buffer().name();
    let uploads = gpu
        .borrow()
        .commands()
        .iter()
        .filter(|c| matches!(c, GpuCommand::BufferSubData { buffer, .. } if *buffer == light_buffer))
        .count();
    assert_eq!(uploads, 2);
}

#[test]
fn test_integration_profiles_render_the_same_frames() {
    let (core_gpu, core_device) = create_test_device(DeviceProfile::Core);
    let (compat_gpu, compat_device) = create_test_device(DeviceProfile::Compatibility);
    let mut core = create_test_pipeline(&core_device, PipelineConfig::default());
    let mut compat = create_test_pipeline(&compat_device, PipelineConfig::default());
    let (_mesh, _quad, scene) = create_test_scene();
    let mut surface = HeadlessSurface::new(80, 60);
    let viewport = Viewport::from_size(80, 60);

    for _ in 0..3 {
        core.update(&camera(), &scene, viewport);
        compat.update(&camera(), &scene, viewport);
        assert_eq!(core.render(&scene, &mut surface).unwrap(), compat.render(&scene, &mut surface).unwrap());
    }

    let core_draws = core_gpu.borrow().draw_calls().len();
    let compat_draws = compat_gpu.borrow().draw_calls().len();
    assert_eq!(core_draws, compat_draws);
}
