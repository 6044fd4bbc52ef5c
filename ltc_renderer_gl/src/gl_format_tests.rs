//! Unit tests for GL enum translation
//!
//! Pure mappings, no GL context required.

use super::*;

// ============================================================================
// PIXEL FORMATS
// ============================================================================

#[test]
fn test_pixel_format_float_layouts() {
    assert_eq!(
        pixel_format(PixelFormat::Rgba32Float),
        GlPixelFormat { internal: glow::RGBA32F, format: glow::RGBA, ty: glow::FLOAT }
    );
    assert_eq!(
        pixel_format(PixelFormat::Rgba16Float),
        GlPixelFormat { internal: glow::RGBA16F, format: glow::RGBA, ty: glow::HALF_FLOAT }
    );
}

#[test]
fn test_pixel_format_bgra_stored_as_rgba() {
    let gl = pixel_format(PixelFormat::Bgra8Unorm);
    assert_eq!(gl.internal, glow::RGBA8);
    assert_eq!(gl.format, glow::BGRA);
}

#[test]
fn test_pixel_format_depth_stencil() {
    let gl = pixel_format(PixelFormat::Depth24Stencil8);
    assert_eq!(gl.internal, glow::DEPTH24_STENCIL8);
    assert_eq!(gl.format, glow::DEPTH_STENCIL);
    assert_eq!(gl.ty, glow::UNSIGNED_INT_24_8);
}

#[test]
fn test_pixel_format_compressed_has_no_client_layout() {
    assert_eq!(pixel_format(PixelFormat::Bc1RgbaUnorm).internal, 0x83F1);
    assert_eq!(pixel_format(PixelFormat::Bc3RgbaUnorm).internal, 0x83F3);
    assert_eq!(pixel_format(PixelFormat::Bc5RgUnorm).format, 0);
}

// ============================================================================
// TEXTURE TARGETS
// ============================================================================

#[test]
fn test_cube_faces_follow_positive_x() {
    assert_eq!(image_target(ImageTarget::CubeFace(0)), glow::TEXTURE_CUBE_MAP_POSITIVE_X);
    assert_eq!(image_target(ImageTarget::CubeFace(5)), glow::TEXTURE_CUBE_MAP_NEGATIVE_Z);
    assert_eq!(image_target(ImageTarget::Texture(TextureTarget::D2Array)), glow::TEXTURE_2D_ARRAY);
}

#[test]
fn test_sampler_enums() {
    assert_eq!(wrap_mode(WrapMode::ClampToEdge), glow::CLAMP_TO_EDGE as i32);
    assert_eq!(min_filter(MinFilter::LinearMipmapLinear), glow::LINEAR_MIPMAP_LINEAR as i32);
    assert_eq!(mag_filter(MagFilter::Nearest), glow::NEAREST as i32);
    assert_eq!(swizzle(Swizzle::One), glow::ONE as i32);
}

// ============================================================================
// FRAMEBUFFERS AND BUFFERS
// ============================================================================

#[test]
fn test_attachment_points() {
    assert_eq!(attachment(AttachmentPoint::Color(3)), glow::COLOR_ATTACHMENT3);
    assert_eq!(attachment(AttachmentPoint::DepthStencil), glow::DEPTH_STENCIL_ATTACHMENT);
}

#[test]
fn test_framebuffer_status_codes() {
    assert_eq!(framebuffer_status(glow::FRAMEBUFFER_COMPLETE), FramebufferStatus::Complete);
    assert_eq!(
        framebuffer_status(glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT),
        FramebufferStatus::IncompleteAttachment
    );
    assert_eq!(framebuffer_status(0x1234), FramebufferStatus::Unknown(0x1234));
}

#[test]
fn test_buffer_storage_flags() {
    assert_eq!(buffer_storage_flags(BufferUsage::empty()), 0);
    assert_eq!(
        buffer_storage_flags(BufferUsage::DYNAMIC_STORAGE | BufferUsage::MAP_READ),
        glow::DYNAMIC_STORAGE_BIT | glow::MAP_READ_BIT
    );
}

// ============================================================================
// STATE
// ============================================================================

#[test]
fn test_render_state_enums() {
    assert_eq!(compare_op(CompareOp::LessOrEqual), glow::LEQUAL);
    assert_eq!(compare_op(CompareOp::Equal), glow::EQUAL);
    assert_eq!(blend_factor(BlendFactor::One), glow::ONE);
    assert_eq!(blend_op(BlendOp::Add), glow::FUNC_ADD);
    assert_eq!(topology(PrimitiveTopology::TriangleList), glow::TRIANGLES);
    assert_eq!(index_type(IndexType::U16), glow::UNSIGNED_SHORT);
}

#[test]
fn test_error_names() {
    assert_eq!(error_name(glow::INVALID_OPERATION), "GL_INVALID_OPERATION");
    assert_eq!(error_name(0xDEAD), "unknown GL error");
}
