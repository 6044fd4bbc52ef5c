/// Pixel formats and texel-size arithmetic
///
/// Every upload in the renderer uses the natural client layout of the
/// format: 8-bit unorm components, IEEE half/single floats, packed depth
/// words, or 4x4 BCn blocks for compressed formats.

/// Width/height/depth of a texture level.
///
/// For array textures `depth` holds the layer count (cube arrays: layers * 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent3d {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// 2D extent with a single layer
    pub const fn d2(width: u32, height: u32) -> Self {
        Self { width, height, depth: 1 }
    }
}

/// Texel storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // ===== 8-bit unorm =====
    R8Unorm,
    Rg8Unorm,
    Rgb8Unorm,
    Rgba8Unorm,
    Rgba8Srgb,
    /// BGRA byte order in client memory, stored as RGBA8
    Bgra8Unorm,

    // ===== Float =====
    R16Float,
    Rg16Float,
    Rgb16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgb32Float,
    Rgba32Float,

    // ===== Depth/stencil =====
    Depth16,
    /// 24-bit depth, uploaded as 32-bit words
    Depth24,
    Depth32Float,
    Depth24Stencil8,

    // ===== Block compressed (4x4 blocks) =====
    /// DXT1
    Bc1RgbaUnorm,
    /// DXT3
    Bc2RgbaUnorm,
    /// DXT5
    Bc3RgbaUnorm,
    /// RGTC1 / ATI1
    Bc4RUnorm,
    /// RGTC2 / ATI2
    Bc5RgUnorm,
    Bc6hRgbUfloat,
    Bc7RgbaUnorm,
}

/// Size of the smallest addressable unit of a format.
///
/// Uncompressed formats use 1x1 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub width: u32,
    pub height: u32,
    pub bytes: u32,
}

impl PixelFormat {
    /// Block dimensions and byte size
    pub fn block_info(&self) -> BlockInfo {
        let texel = |bytes| BlockInfo { width: 1, height: 1, bytes };
        let block = |bytes| BlockInfo { width: 4, height: 4, bytes };
        match self {
            PixelFormat::R8Unorm => texel(1),
            PixelFormat::Rg8Unorm => texel(2),
            PixelFormat::Rgb8Unorm => texel(3),
            PixelFormat::Rgba8Unorm | PixelFormat::Rgba8Srgb | PixelFormat::Bgra8Unorm => texel(4),
            PixelFormat::R16Float => texel(2),
            PixelFormat::Rg16Float => texel(4),
            PixelFormat::Rgb16Float => texel(6),
            PixelFormat::Rgba16Float => texel(8),
            PixelFormat::R32Float => texel(4),
            PixelFormat::Rg32Float => texel(8),
            PixelFormat::Rgb32Float => texel(12),
            PixelFormat::Rgba32Float => texel(16),
            PixelFormat::Depth16 => texel(2),
            PixelFormat::Depth24 | PixelFormat::Depth32Float | PixelFormat::Depth24Stencil8 => texel(4),
            PixelFormat::Bc1RgbaUnorm | PixelFormat::Bc4RUnorm => block(8),
            PixelFormat::Bc2RgbaUnorm
            | PixelFormat::Bc3RgbaUnorm
            | PixelFormat::Bc5RgUnorm
            | PixelFormat::Bc6hRgbUfloat
            | PixelFormat::Bc7RgbaUnorm => block(16),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.block_info().width > 1
    }

    /// Depth or depth-stencil format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            PixelFormat::Depth16
                | PixelFormat::Depth24
                | PixelFormat::Depth32Float
                | PixelFormat::Depth24Stencil8
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, PixelFormat::Depth24Stencil8)
    }

    /// Float components (half or single precision)
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            PixelFormat::R16Float
                | PixelFormat::Rg16Float
                | PixelFormat::Rgb16Float
                | PixelFormat::Rgba16Float
                | PixelFormat::R32Float
                | PixelFormat::Rg32Float
                | PixelFormat::Rgb32Float
                | PixelFormat::Rgba32Float
                | PixelFormat::Bc6hRgbUfloat
        )
    }

    /// Number of color channels (depth formats report 1)
    pub fn channel_count(&self) -> u32 {
        match self {
            PixelFormat::R8Unorm
            | PixelFormat::R16Float
            | PixelFormat::R32Float
            | PixelFormat::Bc4RUnorm
            | PixelFormat::Depth16
            | PixelFormat::Depth24
            | PixelFormat::Depth32Float
            | PixelFormat::Depth24Stencil8 => 1,
            PixelFormat::Rg8Unorm
            | PixelFormat::Rg16Float
            | PixelFormat::Rg32Float
            | PixelFormat::Bc5RgUnorm => 2,
            PixelFormat::Rgb8Unorm
            | PixelFormat::Rgb16Float
            | PixelFormat::Rgb32Float
            | PixelFormat::Bc6hRgbUfloat => 3,
            _ => 4,
        }
    }

    /// Bytes of one row of blocks for a level of the given width
    pub fn row_pitch(&self, width: u32) -> usize {
        let info = self.block_info();
        width.div_ceil(info.width) as usize * info.bytes as usize
    }

    /// Number of block rows for a level of the given height
    pub fn block_rows(&self, height: u32) -> usize {
        height.div_ceil(self.block_info().height) as usize
    }

    /// Bytes of one 2D slice (one layer or one depth slice)
    pub fn slice_size(&self, width: u32, height: u32) -> usize {
        self.row_pitch(width) * self.block_rows(height)
    }

    /// Bytes of a whole level (all layers / depth slices)
    pub fn level_size(&self, extent: Extent3d) -> usize {
        self.slice_size(extent.width, extent.height) * extent.depth as usize
    }

    /// `slice_size`, or None when the byte count does not fit in a usize
    pub fn checked_slice_size(&self, width: u32, height: u32) -> Option<usize> {
        let info = self.block_info();
        (width.div_ceil(info.width) as usize)
            .checked_mul(info.bytes as usize)?
            .checked_mul(height.div_ceil(info.height) as usize)
    }

    /// `level_size`, or None when the byte count does not fit in a usize
    pub fn checked_level_size(&self, extent: Extent3d) -> Option<usize> {
        self.checked_slice_size(extent.width, extent.height)?
            .checked_mul(extent.depth as usize)
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
