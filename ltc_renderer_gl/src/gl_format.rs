//! Translation of renderer enums to OpenGL constants
//!
//! Pure functions, no context required.

use ltc_renderer::ltc::gpu::{
    AttachmentPoint, BlendFactor, BlendOp, BufferKind, BufferUsage, CompareOp, FramebufferStatus,
    ImageTarget, IndexType, MagFilter, MinFilter, PixelFormat, PrimitiveTopology, ShaderStage, Swizzle,
    TextureTarget, UsageHint, WrapMode,
};

// S3TC, RGTC and BPTC internal formats
const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;
const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
const COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: u32 = 0x8E8F;
const COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;

/// Internal format, client format and client type of a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlPixelFormat {
    pub internal: u32,
    pub format: u32,
    pub ty: u32,
}

pub fn pixel_format(format: PixelFormat) -> GlPixelFormat {
    let f = |internal, format, ty| GlPixelFormat { internal, format, ty };
    // Compressed formats carry no client layout
    let c = |internal| GlPixelFormat { internal, format: 0, ty: 0 };
    match format {
        PixelFormat::R8Unorm => f(glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        PixelFormat::Rg8Unorm => f(glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
        PixelFormat::Rgb8Unorm => f(glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba8Unorm => f(glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba8Srgb => f(glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Bgra8Unorm => f(glow::RGBA8, glow::BGRA, glow::UNSIGNED_BYTE),
        PixelFormat::R16Float => f(glow::R16F, glow::RED, glow::HALF_FLOAT),
        PixelFormat::Rg16Float => f(glow::RG16F, glow::RG, glow::HALF_FLOAT),
        PixelFormat::Rgb16Float => f(glow::RGB16F, glow::RGB, glow::HALF_FLOAT),
        PixelFormat::Rgba16Float => f(glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        PixelFormat::R32Float => f(glow::R32F, glow::RED, glow::FLOAT),
        PixelFormat::Rg32Float => f(glow::RG32F, glow::RG, glow::FLOAT),
        PixelFormat::Rgb32Float => f(glow::RGB32F, glow::RGB, glow::FLOAT),
        PixelFormat::Rgba32Float => f(glow::RGBA32F, glow::RGBA, glow::FLOAT),
        PixelFormat::Depth16 => f(glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT),
        PixelFormat::Depth24 => f(glow::DEPTH_COMPONENT24, glow::DEPTH_COMPONENT, glow::UNSIGNED_INT),
        PixelFormat::Depth32Float => f(glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
        PixelFormat::Depth24Stencil8 => f(glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8),
        PixelFormat::Bc1RgbaUnorm => c(COMPRESSED_RGBA_S3TC_DXT1),
        PixelFormat::Bc2RgbaUnorm => c(COMPRESSED_RGBA_S3TC_DXT3),
        PixelFormat::Bc3RgbaUnorm => c(COMPRESSED_RGBA_S3TC_DXT5),
        PixelFormat::Bc4RUnorm => c(COMPRESSED_RED_RGTC1),
        PixelFormat::Bc5RgUnorm => c(COMPRESSED_RG_RGTC2),
        PixelFormat::Bc6hRgbUfloat => c(COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT),
        PixelFormat::Bc7RgbaUnorm => c(COMPRESSED_RGBA_BPTC_UNORM),
    }
}

pub fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::D1 => glow::TEXTURE_1D,
        TextureTarget::D1Array => glow::TEXTURE_1D_ARRAY,
        TextureTarget::D2 => glow::TEXTURE_2D,
        TextureTarget::D2Array => glow::TEXTURE_2D_ARRAY,
        TextureTarget::D3 => glow::TEXTURE_3D,
        TextureTarget::Rectangle => glow::TEXTURE_RECTANGLE,
        TextureTarget::Cube => glow::TEXTURE_CUBE_MAP,
        TextureTarget::CubeArray => glow::TEXTURE_CUBE_MAP_ARRAY,
    }
}

/// Target passed to per-image calls (cube faces get their own target)
pub fn image_target(image: ImageTarget) -> u32 {
    match image {
        ImageTarget::Texture(target) => texture_target(target),
        ImageTarget::CubeFace(face) => glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
    }
}

pub fn wrap_mode(mode: WrapMode) -> i32 {
    let value = match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
    };
    value as i32
}

pub fn min_filter(filter: MinFilter) -> i32 {
    let value = match filter {
        MinFilter::Nearest => glow::NEAREST,
        MinFilter::Linear => glow::LINEAR,
        MinFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        MinFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        MinFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        MinFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    };
    value as i32
}

pub fn mag_filter(filter: MagFilter) -> i32 {
    let value = match filter {
        MagFilter::Nearest => glow::NEAREST,
        MagFilter::Linear => glow::LINEAR,
    };
    value as i32
}

pub fn swizzle(source: Swizzle) -> i32 {
    let value = match source {
        Swizzle::Red => glow::RED,
        Swizzle::Green => glow::GREEN,
        Swizzle::Blue => glow::BLUE,
        Swizzle::Alpha => glow::ALPHA,
        Swizzle::Zero => glow::ZERO,
        Swizzle::One => glow::ONE,
    };
    value as i32
}

pub fn attachment(point: AttachmentPoint) -> u32 {
    match point {
        AttachmentPoint::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        AttachmentPoint::Depth => glow::DEPTH_ATTACHMENT,
        AttachmentPoint::Stencil => glow::STENCIL_ATTACHMENT,
        AttachmentPoint::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

pub fn framebuffer_status(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        // GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS from ES 2 / EXT_framebuffer_object
        0x8CD9 => FramebufferStatus::IncompleteDimensions,
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => FramebufferStatus::IncompleteLayerTargets,
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        other => FramebufferStatus::Unknown(other),
    }
}

pub fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Vertex => glow::ARRAY_BUFFER,
        BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        BufferKind::Uniform => glow::UNIFORM_BUFFER,
        BufferKind::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
    }
}

pub fn buffer_storage_flags(usage: BufferUsage) -> u32 {
    let mut flags = 0;
    for (flag, bit) in [
        (BufferUsage::MAP_READ, glow::MAP_READ_BIT),
        (BufferUsage::MAP_WRITE, glow::MAP_WRITE_BIT),
        (BufferUsage::PERSISTENT, glow::MAP_PERSISTENT_BIT),
        (BufferUsage::COHERENT, glow::MAP_COHERENT_BIT),
        (BufferUsage::FLUSH_EXPLICIT, glow::MAP_FLUSH_EXPLICIT_BIT),
        (BufferUsage::DYNAMIC_STORAGE, glow::DYNAMIC_STORAGE_BIT),
        (BufferUsage::CLIENT_STORAGE, glow::CLIENT_STORAGE_BIT),
    ] {
        if usage.contains(flag) {
            flags |= bit;
        }
    }
    flags
}

pub fn usage_hint(hint: UsageHint) -> u32 {
    match hint {
        UsageHint::StaticDraw => glow::STATIC_DRAW,
        UsageHint::DynamicDraw => glow::DYNAMIC_DRAW,
        UsageHint::StreamDraw => glow::STREAM_DRAW,
        UsageHint::StaticRead => glow::STATIC_READ,
        UsageHint::DynamicRead => glow::DYNAMIC_READ,
    }
}

pub fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        ShaderStage::Compute => glow::COMPUTE_SHADER,
    }
}

pub fn compare_op(op: CompareOp) -> u32 {
    match op {
        CompareOp::Never => glow::NEVER,
        CompareOp::Less => glow::LESS,
        CompareOp::Equal => glow::EQUAL,
        CompareOp::LessOrEqual => glow::LEQUAL,
        CompareOp::Greater => glow::GREATER,
        CompareOp::NotEqual => glow::NOTEQUAL,
        CompareOp::GreaterOrEqual => glow::GEQUAL,
        CompareOp::Always => glow::ALWAYS,
    }
}

pub fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
    }
}

pub fn blend_op(op: BlendOp) -> u32 {
    match op {
        BlendOp::Add => glow::FUNC_ADD,
        BlendOp::Subtract => glow::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => glow::MIN,
        BlendOp::Max => glow::MAX,
    }
}

pub fn topology(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::TriangleList => glow::TRIANGLES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => glow::LINES,
        PrimitiveTopology::PointList => glow::POINTS,
    }
}

pub fn index_type(ty: IndexType) -> u32 {
    match ty {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

/// Human-readable name of a glGetError code
pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
