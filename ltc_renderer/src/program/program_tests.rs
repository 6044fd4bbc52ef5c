//! Unit tests for program.rs
//!
//! Programs are compiled on the software GPU, which reports the uniforms
//! declared in the sources as active.

use serial_test::serial;

use crate::buffer::BufferDesc;
use crate::device::{Device, DeviceProfile};
use crate::error::Error;
use crate::format::PixelFormat;
use crate::gpu::{BufferKind, ShaderStage, UniformValue};
use crate::log::{self, LogSeverity};
use crate::program::{Program, ShaderLibrary};
use crate::texture::TextureDesc;
use crate::test_support::{software_device, CaptureLogger};

const EFFECT: &str = "\
-- Vertex
uniform mat4 uModel;
uniform float uScale;
void main() {}
-- Fragment
uniform vec3 uColor;
uniform sampler2D uTexture;
layout(std140) uniform Material
{
    vec4 tint;
};
void main() {}
-- Broken
uniform float uNothing;
";

fn library() -> ShaderLibrary {
    let mut library = ShaderLibrary::new();
    library.add_source("Test", EFFECT);
    library
}

fn linked(device: &Device) -> Program {
    let library = library();
    let mut program = device.create_program("test").unwrap();
    program.add_stage(ShaderStage::Vertex, "Test.Vertex", &library).unwrap();
    program.add_stage(ShaderStage::Fragment, "Test.Fragment", &library).unwrap();
    program.link().unwrap();
    program
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn test_link_records_stages() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);

    assert!(program.is_linked());
    assert_eq!(program.stages(), &[ShaderStage::Vertex, ShaderStage::Fragment]);
    // stage objects are released after a successful link
    assert_eq!(gpu.borrow().live_programs(), 1);
}

#[test]
fn test_missing_tag_is_asset_error() {
    let (_gpu, device) = software_device(DeviceProfile::Core);
    let mut program = device.create_program("missing").unwrap();
    let err = program.add_stage(ShaderStage::Vertex, "Test.Geometry", &library()).unwrap_err();
    assert!(matches!(err, Error::AssetLoadFailed(_)));
}

#[test]
fn test_compile_error_names_the_tag() {
    let (_gpu, device) = software_device(DeviceProfile::Core);
    let mut program = device.create_program("broken").unwrap();
    let err = program.add_stage(ShaderStage::Fragment, "Test.Broken", &library()).unwrap_err();
    assert!(matches!(err, Error::ShaderCompilationFailed(ref m) if m.contains("Test.Broken")));
    assert!(program.stages().is_empty());
}

#[test]
fn test_link_without_fragment_fails() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let mut program = device.create_program("half").unwrap();
    program.add_stage(ShaderStage::Vertex, "Test.Vertex", &library()).unwrap();

    assert!(matches!(program.link(), Err(Error::ProgramLinkFailed(_))));
    assert!(!program.is_linked());

    drop(program);
    assert_eq!(gpu.borrow().live_programs(), 0);
}

// ============================================================================
// Uniforms
// ============================================================================

#[test]
fn test_set_uniform_reaches_program() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);
    program.bind();

    assert!(program.set_uniform("uScale", 2.5f32));
    assert!(program.set_uniform("uColor", glam::Vec3::new(1.0, 0.5, 0.0)));

    let gpu = gpu.borrow();
    assert_eq!(gpu.uniform_value(program.name(), "uScale"), Some(UniformValue::Float(2.5)));
    assert!(gpu.errors().is_empty());
}

#[test]
fn test_locations_are_cached_including_misses() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);
    program.bind();
    let before = gpu.borrow().uniform_lookups();

    for _ in 0..5 {
        program.set_uniform("uScale", 1.0f32);
        program.set_uniform("uMissing", 1.0f32);
    }

    assert_eq!(gpu.borrow().uniform_lookups() - before, 2);
}

#[test]
fn test_uniform_location_reports_missing_name() {
    let (_gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);

    assert!(program.uniform_location("uModel").is_ok());
    assert!(matches!(program.uniform_location("uMissing"), Err(Error::UniformNotFound(_))));
}

#[test]
#[serial]
fn test_missing_uniform_warns_once() {
    let capture = CaptureLogger::install();
    let (_gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);
    program.bind();

    assert!(!program.set_uniform("uMissing", 1i32));
    assert!(!program.set_uniform("uMissing", 2i32));
    assert!(!program.set_uniform("uOther", 2i32));

    assert_eq!(capture.messages_containing("'uMissing' not found"), 1);
    assert_eq!(capture.count_at(LogSeverity::Warn), 2);
    log::reset_logger();
}

// ============================================================================
// Textures and blocks
// ============================================================================

#[test]
fn test_bind_texture_sets_unit() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);
    let texture = device.create_texture(&TextureDesc::d2("t", 2, 2, PixelFormat::Rgba8Unorm)).unwrap();
    program.bind();

    assert!(program.bind_texture("uTexture", &texture, 3));
    assert!(!program.bind_texture("uAbsent", &texture, 4));

    assert_eq!(gpu.borrow().uniform_value(program.name(), "uTexture"), Some(UniformValue::Int(3)));
}

#[test]
fn test_bind_buffer_routes_block() {
    let (gpu, device) = software_device(DeviceProfile::Core);
    let program = linked(&device);
    let buffer = device.create_buffer(&BufferDesc::dynamic_uniform("material", 16)).unwrap();

    assert!(program.bind_buffer("Material", &buffer, 5));
    assert!(!program.bind_buffer("Lights", &buffer, 6));

    let gpu = gpu.borrow();
    assert_eq!(gpu.block_binding(program.name(), "Material"), Some(5));
    assert_eq!(gpu.buffer_binding(BufferKind::Uniform, 5), Some(buffer.name()));
}
