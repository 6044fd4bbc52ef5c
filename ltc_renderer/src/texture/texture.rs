/// Texture descriptors and the reference-counted texture resource

use std::path::PathBuf;
use std::rc::Rc;

use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use crate::gpu::{
    ImageTarget, MagFilter, MinFilter, SharedGpu, TextureName, TextureParameter, TextureTarget,
    WrapMode,
};

/// Shared texture handle; the GPU object is deleted when the last handle drops
pub type TextureHandle = Rc<Texture>;

/// Sampler state stored on the texture object
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDesc {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub wrap_r: WrapMode,
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub anisotropy: f32,
}

impl Default for SamplerDesc {
    /// The context defaults for a freshly created texture
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            wrap_r: WrapMode::Repeat,
            min_filter: MinFilter::LinearMipmapLinear,
            mag_filter: MagFilter::Linear,
            anisotropy: 1.0,
        }
    }
}

impl SamplerDesc {
    /// Clamp-to-edge bilinear sampling without mipmaps (lookup tables, render targets)
    pub fn clamped_linear() -> Self {
        Self {
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            wrap_r: WrapMode::ClampToEdge,
            min_filter: MinFilter::Linear,
            mag_filter: MagFilter::Linear,
            anisotropy: 1.0,
        }
    }

    /// Parameter writes needed to move a fresh texture to this state.
    ///
    /// Values equal to the context default are skipped.
    pub fn non_default_parameters(&self) -> Vec<TextureParameter> {
        let default = SamplerDesc::default();
        let mut params = Vec::new();
        if self.wrap_s != default.wrap_s {
            params.push(TextureParameter::WrapS(self.wrap_s));
        }
        if self.wrap_t != default.wrap_t {
            params.push(TextureParameter::WrapT(self.wrap_t));
        }
        if self.wrap_r != default.wrap_r {
            params.push(TextureParameter::WrapR(self.wrap_r));
        }
        if self.min_filter != default.min_filter {
            params.push(TextureParameter::MinFilter(self.min_filter));
        }
        if self.mag_filter != default.mag_filter {
            params.push(TextureParameter::MagFilter(self.mag_filter));
        }
        if self.anisotropy != default.anisotropy {
            params.push(TextureParameter::MaxAnisotropy(self.anisotropy));
        }
        params
    }
}

/// Descriptor for creating a texture
///
/// Either procedural (`filename` is `None`, optional level-0 `data`) or
/// file-backed (`filename` set; target, size, format and levels come from
/// the file).
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub label: String,
    pub target: TextureTarget,
    pub width: u32,
    /// Ignored for 1D targets
    pub height: u32,
    /// Depth for 3D textures, layer count for arrays (cube arrays: cube count)
    pub depth: u32,
    pub format: PixelFormat,
    pub levels: u32,
    /// Level-0 payload covering every layer (and face) in the format's client layout
    pub data: Option<Vec<u8>>,
    pub filename: Option<PathBuf>,
    pub sampler: SamplerDesc,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            label: String::new(),
            target: TextureTarget::D2,
            width: 1,
            height: 1,
            depth: 1,
            format: PixelFormat::Rgba8Unorm,
            levels: 1,
            data: None,
            filename: None,
            sampler: SamplerDesc::default(),
        }
    }
}

impl TextureDesc {
    /// Single-level 2D texture
    pub fn d2(label: impl Into<String>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// Texture loaded from an image or texture-container file
    pub fn from_file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            filename: Some(path.into()),
            ..Default::default()
        }
    }

    /// Level-0 extent in storage terms (layers in `depth`, cube arrays count faces)
    pub fn extent(&self) -> Extent3d {
        let height = match self.target {
            TextureTarget::D1 | TextureTarget::D1Array => 1,
            _ => self.height,
        };
        let depth = match self.target {
            TextureTarget::D1Array | TextureTarget::D2Array | TextureTarget::D3 => self.depth,
            TextureTarget::CubeArray => self.depth * 6,
            _ => 1,
        };
        Extent3d::new(self.width, height, depth)
    }
}

/// What a created texture is
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub label: String,
    pub target: TextureTarget,
    /// Level-0 extent in storage terms
    pub extent: Extent3d,
    pub format: PixelFormat,
    pub levels: u32,
}

impl TextureInfo {
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Extent of a mip level
    pub fn level_extent(&self, level: u32) -> Extent3d {
        self.target.level_extent(self.extent, level)
    }
}

/// GPU texture object plus its cached descriptor
pub struct Texture {
    gpu: SharedGpu,
    name: TextureName,
    info: TextureInfo,
}

impl Texture {
    /// Take ownership of an existing GPU texture object
    pub(crate) fn from_raw(gpu: SharedGpu, name: TextureName, info: TextureInfo) -> Self {
        Self { gpu, name, info }
    }

    pub fn name(&self) -> TextureName {
        self.name
    }

    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// Bind to a texture unit
    pub fn bind(&self, unit: u32) {
        self.gpu.borrow_mut().bind_texture_unit(unit, self.info.target, Some(self.name));
    }

    /// Clear a texture unit
    pub fn unbind(&self, unit: u32) {
        self.gpu.borrow_mut().bind_texture_unit(unit, self.info.target, None);
    }

    pub fn set_parameter(&self, parameter: TextureParameter) {
        self.gpu.borrow_mut().texture_parameter(self.name, self.info.target, parameter);
    }

    /// Fill levels 1.. from level 0
    pub fn generate_mipmap(&self) -> Result<()> {
        if self.info.format.is_compressed() {
            crate::ltc_bail!(
                "ltc::Texture",
                InvalidResource,
                "Cannot generate mipmaps for compressed texture '{}' ({:?})",
                self.info.label,
                self.info.format
            );
        }
        self.gpu.borrow_mut().generate_mipmap(self.name, self.info.target)
    }

    /// Read back a level of a non-cube texture (all layers)
    pub fn read_level(&self, level: u32) -> Result<Vec<u8>> {
        self.read_image(ImageTarget::Texture(self.info.target), level)
    }

    /// Read back a level of one image (a cube face, or the whole texture)
    pub fn read_image(&self, image: ImageTarget, level: u32) -> Result<Vec<u8>> {
        if level >= self.info.levels {
            crate::ltc_bail!(
                "ltc::Texture",
                InvalidResource,
                "Level {} out of range for '{}' ({} levels)",
                level,
                self.info.label,
                self.info.levels
            );
        }
        self.gpu
            .borrow_mut()
            .read_texture_image(self.name, image, level, self.info.format)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        match self.gpu.try_borrow_mut() {
            Ok(mut gpu) => gpu.delete_texture(self.name),
            Err(_) => crate::ltc_warn!(
                "ltc::Texture",
                "GPU busy while dropping '{}', texture {} leaked",
                self.info.label,
                self.name.0
            ),
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("info", &self.info)
            .finish()
    }
}
