use super::*;

fn rgba8_texture(gpu: &mut SoftwareGpu, width: u32, height: u32, levels: u32) -> TextureName {
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    gpu.texture_storage(texture, TextureTarget::D2, levels, PixelFormat::Rgba8Unorm, Extent3d::d2(width, height))
        .unwrap();
    texture
}

const SHADER_VS: &str = "#version 430 core
uniform mat4 uProjection;
uniform mat4 uView, uModel;
void main() { gl_Position = uProjection * uView * uModel * vec4(0.0); }
";

const SHADER_FS: &str = "#version 430 core
uniform highp float uRoughness;
uniform sampler2D uLtcMatrix;
layout(std140) uniform LightBlock
{
    vec4 position;
};
out vec4 fragColor;
void main() { fragColor = vec4(uRoughness); }
";

fn linked_program(gpu: &mut SoftwareGpu) -> ProgramName {
    let program = gpu.create_program().unwrap();
    let vs = gpu.compile_shader(ShaderStage::Vertex, SHADER_VS).unwrap();
    let fs = gpu.compile_shader(ShaderStage::Fragment, SHADER_FS).unwrap();
    gpu.attach_shader(program, vs);
    gpu.attach_shader(program, fs);
    gpu.link_program(program).unwrap();
    program
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_texture_names_start_at_one() {
    let mut gpu = SoftwareGpu::new();
    assert_eq!(gpu.create_texture(TextureTarget::D2).unwrap(), TextureName(1));
    assert_eq!(gpu.create_texture(TextureTarget::D2).unwrap(), TextureName(2));
    assert_eq!(gpu.live_textures(), 2);
}

#[test]
fn test_sub_image_round_trip() {
    let mut gpu = SoftwareGpu::new();
    let texture = rgba8_texture(&mut gpu, 4, 4, 1);
    let data: Vec<u8> = (0..64).collect();
    gpu.texture_sub_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        Region::whole(Extent3d::d2(4, 4)),
        PixelFormat::Rgba8Unorm,
        &data,
    )
    .unwrap();

    let back = gpu
        .read_texture_image(texture, ImageTarget::Texture(TextureTarget::D2), 0, PixelFormat::Rgba8Unorm)
        .unwrap();
    assert_eq!(back, data);
}

#[test]
fn test_partial_region_upload() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    gpu.texture_storage(texture, TextureTarget::D2, 1, PixelFormat::R8Unorm, Extent3d::d2(4, 2))
        .unwrap();
    let region = Region { offset: [1, 1, 0], extent: Extent3d::d2(2, 1) };
    gpu.texture_sub_image(texture, ImageTarget::Texture(TextureTarget::D2), 0, region, PixelFormat::R8Unorm, &[7, 9])
        .unwrap();

    let back = gpu
        .read_texture_image(texture, ImageTarget::Texture(TextureTarget::D2), 0, PixelFormat::R8Unorm)
        .unwrap();
    assert_eq!(back, vec![0, 0, 0, 0, 0, 7, 9, 0]);
}

#[test]
fn test_storage_is_immutable() {
    let mut gpu = SoftwareGpu::new();
    let texture = rgba8_texture(&mut gpu, 8, 8, 1);
    let again = gpu.texture_storage(texture, TextureTarget::D2, 1, PixelFormat::Rgba8Unorm, Extent3d::d2(8, 8));
    assert!(again.is_err());
    let image = gpu.texture_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        PixelFormat::Rgba8Unorm,
        Extent3d::d2(8, 8),
        None,
    );
    assert!(image.is_err());
    assert_eq!(gpu.errors().len(), 2);
}

#[test]
fn test_storage_rejects_too_many_levels() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    // 8x8 allows 4 levels
    let result = gpu.texture_storage(texture, TextureTarget::D2, 5, PixelFormat::Rgba8Unorm, Extent3d::d2(8, 8));
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_sub_image_size_mismatch_is_error() {
    let mut gpu = SoftwareGpu::new();
    let texture = rgba8_texture(&mut gpu, 4, 4, 1);
    let result = gpu.texture_sub_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        Region::whole(Extent3d::d2(4, 4)),
        PixelFormat::Rgba8Unorm,
        &[0; 12],
    );
    assert!(result.is_err());
}

#[test]
fn test_linear_upload_into_compressed_is_error() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    gpu.texture_storage(texture, TextureTarget::D2, 1, PixelFormat::Bc1RgbaUnorm, Extent3d::d2(4, 4))
        .unwrap();
    let linear = gpu.texture_sub_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        Region::whole(Extent3d::d2(4, 4)),
        PixelFormat::Bc1RgbaUnorm,
        &[0; 8],
    );
    assert!(linear.is_err());
    let compressed = gpu.compressed_texture_sub_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        Region::whole(Extent3d::d2(4, 4)),
        PixelFormat::Bc1RgbaUnorm,
        &[1; 8],
    );
    assert!(compressed.is_ok());
}

#[test]
fn test_cube_storage_allocates_six_faces() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::Cube).unwrap();
    gpu.texture_storage(texture, TextureTarget::Cube, 2, PixelFormat::Rgba16Float, Extent3d::d2(8, 8))
        .unwrap();
    for face in 0..6 {
        let level1 = gpu
            .read_texture_image(texture, ImageTarget::CubeFace(face), 1, PixelFormat::Rgba16Float)
            .unwrap();
        assert_eq!(level1.len(), 4 * 4 * 8);
    }
}

#[test]
fn test_generate_mipmap_box_filters_u8() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    gpu.texture_storage(texture, TextureTarget::D2, 2, PixelFormat::R8Unorm, Extent3d::d2(2, 2))
        .unwrap();
    gpu.texture_sub_image(
        texture,
        ImageTarget::Texture(TextureTarget::D2),
        0,
        Region::whole(Extent3d::d2(2, 2)),
        PixelFormat::R8Unorm,
        &[0, 100, 200, 100],
    )
    .unwrap();
    gpu.generate_mipmap(texture, TextureTarget::D2).unwrap();

    let level1 = gpu
        .read_texture_image(texture, ImageTarget::Texture(TextureTarget::D2), 1, PixelFormat::R8Unorm)
        .unwrap();
    assert_eq!(level1, vec![100]);
}

#[test]
fn test_delete_texture_frees_name() {
    let mut gpu = SoftwareGpu::new();
    let texture = rgba8_texture(&mut gpu, 2, 2, 1);
    gpu.delete_texture(texture);
    assert_eq!(gpu.live_textures(), 0);
    assert!(gpu.commands().contains(&GpuCommand::DeleteTexture(texture)));
}

// ============================================================================
// Framebuffers
// ============================================================================

#[test]
fn test_framebuffer_complete_with_color_and_depth() {
    let mut gpu = SoftwareGpu::new();
    let color = rgba8_texture(&mut gpu, 4, 4, 1);
    let depth = gpu.create_texture(TextureTarget::D2).unwrap();
    gpu.texture_storage(depth, TextureTarget::D2, 1, PixelFormat::Depth24, Extent3d::d2(4, 4))
        .unwrap();
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_texture(fb, AttachmentPoint::Color(0), color, 0);
    gpu.framebuffer_texture(fb, AttachmentPoint::Depth, depth, 0);
    gpu.framebuffer_draw_buffers(fb, &[AttachmentPoint::Color(0)]);

    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::Complete);
}

#[test]
fn test_framebuffer_missing_and_wrong_attachments() {
    let mut gpu = SoftwareGpu::new();
    let fb = gpu.create_framebuffer().unwrap();
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::MissingAttachment);

    // color texture on the depth point
    let color = rgba8_texture(&mut gpu, 4, 4, 1);
    gpu.framebuffer_texture(fb, AttachmentPoint::Depth, color, 0);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::IncompleteAttachment);
}

#[test]
fn test_framebuffer_unallocated_texture_is_incomplete() {
    let mut gpu = SoftwareGpu::new();
    let texture = gpu.create_texture(TextureTarget::D2).unwrap();
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_texture(fb, AttachmentPoint::Color(0), texture, 0);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::IncompleteAttachment);
}

#[test]
fn test_framebuffer_draw_buffer_without_attachment() {
    let mut gpu = SoftwareGpu::new();
    let color = rgba8_texture(&mut gpu, 4, 4, 1);
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_texture(fb, AttachmentPoint::Color(0), color, 0);
    gpu.framebuffer_draw_buffers(fb, &[AttachmentPoint::Color(0), AttachmentPoint::Color(1)]);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::IncompleteDrawBuffer);
}

#[test]
fn test_framebuffer_draw_buffers_reject_depth() {
    let mut gpu = SoftwareGpu::new();
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_draw_buffers(fb, &[AttachmentPoint::Depth]);
    assert_eq!(gpu.errors().len(), 1);
}

#[test]
fn test_uniform_sizes_capability() {
    let mut caps = SoftwareGpu::new().capabilities().clone();
    caps.uniform_attachment_sizes = true;
    let mut gpu = SoftwareGpu::with_capabilities(caps);
    let a = rgba8_texture(&mut gpu, 4, 4, 1);
    let b = rgba8_texture(&mut gpu, 8, 8, 1);
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_texture(fb, AttachmentPoint::Color(0), a, 0);
    gpu.framebuffer_texture(fb, AttachmentPoint::Color(1), b, 0);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::IncompleteDimensions);
}

#[test]
fn test_framebuffer_texture_2d_rejects_non_2d_images() {
    let mut gpu = SoftwareGpu::new();
    let array = gpu.create_texture(TextureTarget::D2Array).unwrap();
    gpu.texture_storage(array, TextureTarget::D2Array, 1, PixelFormat::Rgba8Unorm, Extent3d::new(4, 4, 2))
        .unwrap();
    let plain = rgba8_texture(&mut gpu, 4, 4, 1);
    let fb = gpu.create_framebuffer().unwrap();

    gpu.framebuffer_texture_2d(fb, AttachmentPoint::Color(0), ImageTarget::Texture(TextureTarget::D2Array), array, 0);
    // cube face of a 2D texture
    gpu.framebuffer_texture_2d(fb, AttachmentPoint::Color(0), ImageTarget::CubeFace(0), plain, 0);

    assert_eq!(gpu.errors().len(), 2);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::MissingAttachment);

    gpu.framebuffer_texture_2d(fb, AttachmentPoint::Color(0), ImageTarget::Texture(TextureTarget::D2), plain, 0);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::Complete);
}

#[test]
fn test_layer_attachment_bounds() {
    let mut gpu = SoftwareGpu::new();
    let array = gpu.create_texture(TextureTarget::D2Array).unwrap();
    gpu.texture_storage(array, TextureTarget::D2Array, 1, PixelFormat::Rgba8Unorm, Extent3d::new(4, 4, 2))
        .unwrap();
    let fb = gpu.create_framebuffer().unwrap();
    gpu.framebuffer_texture_layer(fb, AttachmentPoint::Color(0), array, 0, 1);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::Complete);
    gpu.framebuffer_texture_layer(fb, AttachmentPoint::Color(0), array, 0, 2);
    assert_eq!(gpu.check_framebuffer_status(fb), FramebufferStatus::IncompleteAttachment);
}

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn test_immutable_buffer_needs_dynamic_storage_for_updates() {
    let mut gpu = SoftwareGpu::new();
    let fixed = gpu.create_buffer().unwrap();
    gpu.buffer_storage(fixed, BufferKind::Uniform, 16, None, BufferUsage::empty()).unwrap();
    assert!(gpu.buffer_sub_data(fixed, BufferKind::Uniform, 0, &[1; 4]).is_err());

    let dynamic = gpu.create_buffer().unwrap();
    gpu.buffer_storage(dynamic, BufferKind::Uniform, 16, None, BufferUsage::DYNAMIC_STORAGE)
        .unwrap();
    gpu.buffer_sub_data(dynamic, BufferKind::Uniform, 4, &[1, 2, 3, 4]).unwrap();
    let back = gpu.read_buffer(dynamic, BufferKind::Uniform, 0, 8).unwrap();
    assert_eq!(back, vec![0, 0, 0, 0, 1, 2, 3, 4]);
}

#[test]
fn test_mutable_buffer_accepts_updates_and_rejects_overflow() {
    let mut gpu = SoftwareGpu::new();
    let buffer = gpu.create_buffer().unwrap();
    gpu.buffer_data(buffer, BufferKind::ShaderStorage, 8, Some(&[9; 8]), UsageHint::DynamicDraw)
        .unwrap();
    gpu.buffer_sub_data(buffer, BufferKind::ShaderStorage, 0, &[1, 1]).unwrap();
    assert!(gpu.buffer_sub_data(buffer, BufferKind::ShaderStorage, 7, &[1, 1]).is_err());
}

#[test]
fn test_bind_buffer_base_tracks_binding() {
    let mut gpu = SoftwareGpu::new();
    let buffer = gpu.create_buffer().unwrap();
    gpu.bind_buffer_base(BufferKind::Uniform, 3, Some(buffer));
    assert_eq!(gpu.buffer_binding(BufferKind::Uniform, 3), Some(buffer));
    gpu.delete_buffer(buffer);
    assert_eq!(gpu.buffer_binding(BufferKind::Uniform, 3), None);
}

// ============================================================================
// Shaders & programs
// ============================================================================

#[test]
fn test_scan_uniforms() {
    let (uniforms, blocks) = scan_uniforms(SHADER_FS);
    assert_eq!(
        uniforms,
        vec![
            ("uRoughness".to_string(), "float".to_string()),
            ("uLtcMatrix".to_string(), "sampler2D".to_string()),
        ]
    );
    assert_eq!(blocks, vec!["LightBlock".to_string()]);

    let (multi, _) = scan_uniforms("uniform mat4 uView, uModel;\nuniform vec4 uColors[4];");
    let names: Vec<&str> = multi.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["uView", "uModel", "uColors"]);
}

#[test]
fn test_compile_without_main_fails() {
    let mut gpu = SoftwareGpu::new();
    let result = gpu.compile_shader(ShaderStage::Fragment, "#version 430 core\nout vec4 c;");
    assert!(matches!(result, Err(Error::ShaderCompilationFailed(_))));
}

#[test]
fn test_link_requires_vertex_and_fragment() {
    let mut gpu = SoftwareGpu::new();
    let program = gpu.create_program().unwrap();
    let vs = gpu.compile_shader(ShaderStage::Vertex, SHADER_VS).unwrap();
    gpu.attach_shader(program, vs);
    assert!(matches!(gpu.link_program(program), Err(Error::ProgramLinkFailed(_))));
}

#[test]
fn test_linked_program_exposes_uniforms_and_blocks() {
    let mut gpu = SoftwareGpu::new();
    let program = linked_program(&mut gpu);

    assert!(gpu.uniform_location(program, "uModel").is_some());
    assert!(gpu.uniform_location(program, "uLtcMatrix").is_some());
    assert!(gpu.uniform_location(program, "uMissing").is_none());
    assert_eq!(gpu.uniform_lookups(), 3);
    assert_eq!(gpu.uniform_block_index(program, "LightBlock"), Some(0));
}

#[test]
fn test_set_uniform_type_checked() {
    let mut gpu = SoftwareGpu::new();
    let program = linked_program(&mut gpu);
    gpu.use_program(Some(program));
    let roughness = gpu.uniform_location(program, "uRoughness").unwrap();
    let sampler = gpu.uniform_location(program, "uLtcMatrix").unwrap();

    gpu.set_uniform(roughness, UniformValue::Float(0.25));
    gpu.set_uniform(sampler, UniformValue::Int(2));
    assert!(gpu.errors().is_empty());
    assert_eq!(gpu.uniform_value(program, "uRoughness"), Some(UniformValue::Float(0.25)));

    gpu.set_uniform(roughness, UniformValue::Int(1));
    assert_eq!(gpu.errors().len(), 1);
    assert_eq!(gpu.uniform_value(program, "uRoughness"), Some(UniformValue::Float(0.25)));
}

#[test]
fn test_set_uniform_without_program_is_error() {
    let mut gpu = SoftwareGpu::new();
    gpu.set_uniform(UniformLocation(0), UniformValue::Float(1.0));
    assert_eq!(gpu.errors().len(), 1);
}

#[test]
fn test_block_binding_recorded() {
    let mut gpu = SoftwareGpu::new();
    let program = linked_program(&mut gpu);
    gpu.uniform_block_binding(program, 0, 4);
    assert_eq!(gpu.block_binding(program, "LightBlock"), Some(4));
}

// ============================================================================
// Draws
// ============================================================================

#[test]
fn test_draw_snapshots_state() {
    let mut gpu = SoftwareGpu::new();
    let program = linked_program(&mut gpu);
    let texture = rgba8_texture(&mut gpu, 2, 2, 1);
    gpu.use_program(Some(program));
    gpu.set_viewport(Viewport::from_size(64, 32));
    gpu.set_color_write(false);
    gpu.set_depth_state(DepthState { test: Some(CompareOp::LessOrEqual), write: true });
    gpu.bind_texture_unit(1, TextureTarget::D2, Some(texture));
    gpu.draw_arrays(PrimitiveTopology::TriangleList, 0, 3);

    let draws = gpu.draw_calls();
    assert_eq!(draws.len(), 1);
    let draw = draws[0];
    assert_eq!(draw.program, program);
    assert_eq!(draw.count, 3);
    assert!(!draw.color_write);
    assert_eq!(draw.depth.test, Some(CompareOp::LessOrEqual));
    assert_eq!(draw.viewport.width, 64);
    assert_eq!(draw.textures, vec![(1, texture)]);
}

#[test]
fn test_draw_without_program_is_error() {
    let mut gpu = SoftwareGpu::new();
    gpu.draw_arrays(PrimitiveTopology::TriangleList, 0, 3);
    assert!(gpu.draw_calls().is_empty());
    assert_eq!(gpu.errors().len(), 1);
}
