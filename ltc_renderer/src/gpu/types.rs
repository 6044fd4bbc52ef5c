/// Plain data types shared by every `GpuApi` implementation
///
/// Object names, texture targets, sampler enums, render state and uniform
/// values. Backends translate these to their native enums.

use std::fmt;
use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::format::Extent3d;

// ============================================================================
// Object names
// ============================================================================

/// GPU texture object name (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureName(pub u32);

/// GPU framebuffer object name (never 0; 0 is the default framebuffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferName(pub u32);

/// GPU buffer object name (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferName(pub u32);

/// Compiled shader stage object name (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderName(pub u32);

/// Program object name (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramName(pub u32);

/// Vertex array object name (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayName(pub u32);

/// Location of an active uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

// ============================================================================
// Capabilities
// ============================================================================

/// What the underlying context reports about itself
#[derive(Debug, Clone, PartialEq)]
pub struct GpuCapabilities {
    pub vendor: String,
    pub renderer: String,
    /// (major, minor) context version
    pub version: (u32, u32),
    pub max_texture_size: u32,
    pub max_color_attachments: u32,
    pub max_anisotropy: f32,
    /// Framebuffer attachments must all share one size
    pub uniform_attachment_sizes: bool,
}

impl GpuCapabilities {
    pub fn supports_version(&self, major: u32, minor: u32) -> bool {
        self.version >= (major, minor)
    }
}

// ============================================================================
// Textures
// ============================================================================

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    D1,
    D1Array,
    D2,
    D2Array,
    D3,
    /// Rectangle texture (single level, unnormalized coordinates)
    Rectangle,
    Cube,
    CubeArray,
}

impl TextureTarget {
    pub fn is_array(&self) -> bool {
        matches!(self, TextureTarget::D1Array | TextureTarget::D2Array | TextureTarget::CubeArray)
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, TextureTarget::Cube | TextureTarget::CubeArray)
    }

    /// Targets whose images have more than one layer or slice
    pub fn is_layered(&self) -> bool {
        self.is_array() || self.is_cube() || *self == TextureTarget::D3
    }

    /// Number of separately addressed face images (6 for cube maps)
    pub fn face_count(&self) -> u32 {
        if *self == TextureTarget::Cube { 6 } else { 1 }
    }

    /// Extent of `level` given the level-0 extent.
    ///
    /// Layer counts never shrink; only 3D textures halve their depth.
    pub fn level_extent(&self, base: Extent3d, level: u32) -> Extent3d {
        let shrink = |v: u32| (v >> level).max(1);
        match self {
            TextureTarget::D1 | TextureTarget::D1Array => {
                Extent3d::new(shrink(base.width), 1, base.depth)
            }
            TextureTarget::D3 => {
                Extent3d::new(shrink(base.width), shrink(base.height), shrink(base.depth))
            }
            _ => Extent3d::new(shrink(base.width), shrink(base.height), base.depth),
        }
    }

    /// Number of mip levels of a full chain for the level-0 extent
    pub fn max_levels(&self, base: Extent3d) -> u32 {
        if *self == TextureTarget::Rectangle {
            return 1;
        }
        let largest = match self {
            TextureTarget::D1 | TextureTarget::D1Array => base.width,
            TextureTarget::D3 => base.width.max(base.height).max(base.depth),
            _ => base.width.max(base.height),
        };
        32 - largest.max(1).leading_zeros()
    }
}

/// One addressable image set of a texture: the whole texture, or a single
/// face of a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Texture(TextureTarget),
    /// Cube map face index in +X, -X, +Y, -Y, +Z, -Z order
    CubeFace(u32),
}

impl ImageTarget {
    /// The texture target this image belongs to
    pub fn texture_target(&self) -> TextureTarget {
        match self {
            ImageTarget::Texture(target) => *target,
            ImageTarget::CubeFace(_) => TextureTarget::Cube,
        }
    }

    pub fn face(&self) -> u32 {
        match self {
            ImageTarget::Texture(_) => 0,
            ImageTarget::CubeFace(face) => *face,
        }
    }
}

/// Sub-region of a level, in texels (z = first layer or slice)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: [u32; 3],
    pub extent: Extent3d,
}

impl Region {
    /// Region covering a whole level
    pub fn whole(extent: Extent3d) -> Self {
        Self { offset: [0, 0, 0], extent }
    }

    /// Region covering `count` layers starting at `first`
    pub fn layers(extent: Extent3d, first: u32, count: u32) -> Self {
        Self {
            offset: [0, 0, first],
            extent: Extent3d::new(extent.width, extent.height, count),
        }
    }
}

/// Texture coordinate wrap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Minification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

/// Channel source for texture swizzling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swizzle {
    Red,
    Green,
    Blue,
    Alpha,
    Zero,
    One,
}

impl Swizzle {
    pub const IDENTITY: [Swizzle; 4] = [Swizzle::Red, Swizzle::Green, Swizzle::Blue, Swizzle::Alpha];
}

/// A single texture parameter write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureParameter {
    WrapS(WrapMode),
    WrapT(WrapMode),
    WrapR(WrapMode),
    MinFilter(MinFilter),
    MagFilter(MagFilter),
    MaxAnisotropy(f32),
    BaseLevel(u32),
    MaxLevel(u32),
    Swizzle([Swizzle; 4]),
}

// ============================================================================
// Framebuffers
// ============================================================================

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    /// Depth, stencil or combined depth-stencil point
    pub fn is_depth_like(&self) -> bool {
        !matches!(self, AttachmentPoint::Color(_))
    }
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDimensions,
    IncompleteDrawBuffer,
    IncompleteLayerTargets,
    IncompleteMultisample,
    Unsupported,
    Unknown(u32),
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferStatus::Complete => write!(f, "FRAMEBUFFER_COMPLETE"),
            FramebufferStatus::Undefined => write!(f, "FRAMEBUFFER_UNDEFINED"),
            FramebufferStatus::IncompleteAttachment => write!(f, "FRAMEBUFFER_INCOMPLETE_ATTACHMENT"),
            FramebufferStatus::MissingAttachment => write!(f, "FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT"),
            FramebufferStatus::IncompleteDimensions => write!(f, "FRAMEBUFFER_INCOMPLETE_DIMENSIONS"),
            FramebufferStatus::IncompleteDrawBuffer => write!(f, "FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER"),
            FramebufferStatus::IncompleteLayerTargets => write!(f, "FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS"),
            FramebufferStatus::IncompleteMultisample => write!(f, "FRAMEBUFFER_INCOMPLETE_MULTISAMPLE"),
            FramebufferStatus::Unsupported => write!(f, "FRAMEBUFFER_UNSUPPORTED"),
            FramebufferStatus::Unknown(code) => write!(f, "unknown framebuffer status 0x{:04X}", code),
        }
    }
}

// ============================================================================
// Buffers
// ============================================================================

/// Binding point family of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
    ShaderStorage,
}

bitflags! {
    /// Immutable-storage usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const MAP_READ = 1 << 0;
        const MAP_WRITE = 1 << 1;
        const PERSISTENT = 1 << 2;
        const COHERENT = 1 << 3;
        const FLUSH_EXPLICIT = 1 << 4;
        /// Contents may be updated after creation
        const DYNAMIC_STORAGE = 1 << 5;
        const CLIENT_STORAGE = 1 << 6;
    }
}

/// Mutable data-store usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageHint {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
}

impl UsageHint {
    /// Closest hint for a set of immutable-storage flags
    pub fn from_usage(usage: BufferUsage) -> Self {
        if usage.contains(BufferUsage::MAP_READ) {
            if usage.contains(BufferUsage::DYNAMIC_STORAGE) {
                UsageHint::DynamicRead
            } else {
                UsageHint::StaticRead
            }
        } else if usage.contains(BufferUsage::PERSISTENT) {
            UsageHint::StreamDraw
        } else if usage.contains(BufferUsage::DYNAMIC_STORAGE) {
            UsageHint::DynamicDraw
        } else {
            UsageHint::StaticDraw
        }
    }
}

// ============================================================================
// Shaders
// ============================================================================

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Section name used in tagged shader sources
    pub fn section_name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::TessControl => "TessControl",
            ShaderStage::TessEvaluation => "TessEval",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::Fragment => "Fragment",
            ShaderStage::Compute => "Compute",
        }
    }
}

/// Typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Shading-language type keyword of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Int(_) => "int",
            UniformValue::UInt(_) => "uint",
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self { UniformValue::Int(v) }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self { UniformValue::UInt(v) }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self { UniformValue::Int(v as i32) }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self { UniformValue::Float(v) }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self { UniformValue::Vec2(v) }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self { UniformValue::Vec3(v) }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self { UniformValue::Vec4(v) }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self { UniformValue::Mat3(v) }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self { UniformValue::Mat4(v) }
}

// ============================================================================
// Render state
// ============================================================================

/// Viewport rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Depth test/write configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// `None` disables the depth test
    pub test: Option<CompareOp>,
    pub write: bool,
}

impl DepthState {
    pub const DISABLED: DepthState = DepthState { test: None, write: false };
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Color blend configuration (applied to every draw buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub op: BlendOp,
}

impl BlendState {
    /// dst = src + dst
    pub const ADDITIVE: BlendState = BlendState {
        src: BlendFactor::One,
        dst: BlendFactor::One,
        op: BlendOp::Add,
    };
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}
