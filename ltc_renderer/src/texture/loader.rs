/// Texture creation shared by both device profiles.
///
/// The profile-specific part is storage allocation, supplied through
/// `TextureAllocator`. Everything else (validation, file dispatch, flipping,
/// uploads, sampler parameters) is identical for every backend.

use std::path::Path;
use std::rc::Rc;

use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use crate::gpu::{GpuApi, ImageTarget, Region, SharedGpu, Swizzle, TextureName, TextureParameter, TextureTarget};
use super::decoded::DecodedTexture;
use super::texture::{Texture, TextureDesc, TextureHandle, TextureInfo};
use super::{container, raster};

const SOURCE: &str = "ltc::TextureLoader";

/// Allocates texture storage for a device profile
pub(crate) trait TextureAllocator {
    /// Allocate every level (and every cube face) of an empty texture
    fn allocate(
        &self,
        gpu: &mut dyn GpuApi,
        texture: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()>;
}

/// Create a texture from a descriptor, procedural or file-backed
pub(crate) fn create_texture(
    gpu: &SharedGpu,
    allocator: &dyn TextureAllocator,
    desc: &TextureDesc,
) -> Result<TextureHandle> {
    match &desc.filename {
        Some(path) => create_from_file(gpu, allocator, desc, path),
        None => create_procedural(gpu, allocator, desc),
    }
}

/// Container files are parsed in-crate, everything else goes through `image`
fn is_container(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "dds" | "ddx" | "ktx"))
        .unwrap_or(false)
}

// ===== VALIDATION =====

fn validate(desc: &TextureDesc, target: TextureTarget, extent: Extent3d, levels: u32, max_size: u32) -> Result<()> {
    if extent.width == 0 || extent.height == 0 || extent.depth == 0 {
        crate::ltc_bail!(SOURCE, InvalidResource, "Texture '{}' has a zero dimension ({:?})", desc.label, extent);
    }
    if extent.width > max_size || extent.height > max_size {
        crate::ltc_bail!(
            SOURCE,
            InvalidResource,
            "Texture '{}' is {}x{}, the device limit is {}",
            desc.label,
            extent.width,
            extent.height,
            max_size
        );
    }
    if target.is_cube() && extent.width != extent.height {
        crate::ltc_bail!(
            SOURCE,
            InvalidResource,
            "Cube texture '{}' faces must be square, got {}x{}",
            desc.label,
            extent.width,
            extent.height
        );
    }
    let max_levels = target.max_levels(extent);
    if levels == 0 || levels > max_levels {
        crate::ltc_bail!(
            SOURCE,
            InvalidResource,
            "Texture '{}' requests {} levels, {:?} {}x{} allows 1..={}",
            desc.label,
            levels,
            target,
            extent.width,
            extent.height,
            max_levels
        );
    }
    Ok(())
}

// ===== UPLOAD =====

fn upload(
    gpu: &mut dyn GpuApi,
    texture: TextureName,
    image: ImageTarget,
    level: u32,
    extent: Extent3d,
    format: PixelFormat,
    data: &[u8],
) -> Result<()> {
    let region = Region::whole(extent);
    if format.is_compressed() {
        gpu.compressed_texture_sub_image(texture, image, level, region, format, data)
    } else {
        gpu.texture_sub_image(texture, image, level, region, format, data)
    }
}

fn image_target(target: TextureTarget, face: u32) -> ImageTarget {
    if target == TextureTarget::Cube {
        ImageTarget::CubeFace(face)
    } else {
        ImageTarget::Texture(target)
    }
}

fn apply_sampler(texture: &Texture, desc: &TextureDesc) {
    for parameter in desc.sampler.non_default_parameters() {
        texture.set_parameter(parameter);
    }
}

// ===== PROCEDURAL =====

fn create_procedural(gpu: &SharedGpu, allocator: &dyn TextureAllocator, desc: &TextureDesc) -> Result<TextureHandle> {
    let extent = desc.extent();
    let max_size = gpu.borrow().capabilities().max_texture_size;
    validate(desc, desc.target, extent, desc.levels, max_size)?;

    let face_size = desc.format.level_size(extent);
    if let Some(data) = &desc.data {
        let expected = face_size * desc.target.face_count() as usize;
        if data.len() != expected {
            crate::ltc_bail!(
                SOURCE,
                InvalidResource,
                "Texture '{}': payload is {} bytes, {:?} {}x{}x{} needs {}",
                desc.label,
                data.len(),
                desc.format,
                extent.width,
                extent.height,
                extent.depth,
                expected
            );
        }
    }

    let name = gpu.borrow_mut().create_texture(desc.target)?;
    let texture = Texture::from_raw(
        gpu.clone(),
        name,
        TextureInfo {
            label: desc.label.clone(),
            target: desc.target,
            extent,
            format: desc.format,
            levels: desc.levels,
        },
    );

    {
        let mut gpu = gpu.borrow_mut();
        allocator.allocate(&mut *gpu, name, desc.target, desc.levels, desc.format, extent)?;
        if let Some(data) = &desc.data {
            for (face, chunk) in data.chunks_exact(face_size).enumerate() {
                upload(&mut *gpu, name, image_target(desc.target, face as u32), 0, extent, desc.format, chunk)?;
            }
        }
    }
    apply_sampler(&texture, desc);

    crate::ltc_debug!(
        SOURCE,
        "Created {:?} texture '{}' {}x{}x{} {:?}, {} levels",
        desc.target,
        desc.label,
        extent.width,
        extent.height,
        extent.depth,
        desc.format,
        desc.levels
    );
    Ok(Rc::new(texture))
}

// ===== FILE =====

fn create_from_file(
    gpu: &SharedGpu,
    allocator: &dyn TextureAllocator,
    desc: &TextureDesc,
    path: &Path,
) -> Result<TextureHandle> {
    let from_container = is_container(path);
    let mut decoded = if from_container {
        container::load(path)?
    } else {
        raster::load(path)?
    };

    if !decoded.flip_vertical() {
        crate::ltc_warn!(
            SOURCE,
            "'{}': {:?} data cannot be flipped, uploaded upside down",
            path.display(),
            decoded.format
        );
    }

    // raster images may reserve room for generated mipmaps
    let levels = if from_container {
        decoded.levels
    } else {
        desc.levels.clamp(1, decoded.target.max_levels(decoded.extent))
    };
    let max_size = gpu.borrow().capabilities().max_texture_size;
    validate(desc, decoded.target, decoded.extent, levels, max_size)?;

    let name = gpu.borrow_mut().create_texture(decoded.target)?;
    let texture = Texture::from_raw(
        gpu.clone(),
        name,
        TextureInfo {
            label: desc.label.clone(),
            target: decoded.target,
            extent: decoded.extent,
            format: decoded.format,
            levels,
        },
    );

    upload_decoded(gpu, allocator, name, &decoded, levels)?;

    if from_container {
        texture.set_parameter(TextureParameter::BaseLevel(0));
        texture.set_parameter(TextureParameter::MaxLevel(decoded.levels - 1));
        texture.set_parameter(TextureParameter::Swizzle(decoded.swizzle));
    } else if decoded.swizzle != Swizzle::IDENTITY {
        texture.set_parameter(TextureParameter::Swizzle(decoded.swizzle));
    }
    apply_sampler(&texture, desc);

    crate::ltc_info!(
        SOURCE,
        "Loaded '{}' as {:?} {}x{} {:?}, {} levels",
        path.display(),
        decoded.target,
        decoded.extent.width,
        decoded.extent.height,
        decoded.format,
        levels
    );
    Ok(Rc::new(texture))
}

fn upload_decoded(
    gpu: &SharedGpu,
    allocator: &dyn TextureAllocator,
    name: TextureName,
    decoded: &DecodedTexture,
    levels: u32,
) -> Result<()> {
    let mut gpu = gpu.borrow_mut();
    allocator.allocate(&mut *gpu, name, decoded.target, levels, decoded.format, decoded.extent)?;
    for image in &decoded.images {
        let extent = decoded.level_extent(image.level);
        let expected = decoded.format.level_size(extent);
        if image.data.len() != expected {
            crate::ltc_bail!(
                SOURCE,
                AssetLoadFailed,
                "Face {} level {} holds {} bytes, expected {}",
                image.face,
                image.level,
                image.data.len(),
                expected
            );
        }
        upload(
            &mut *gpu,
            name,
            image_target(decoded.target, image.face),
            image.level,
            extent,
            decoded.format,
            &image.data,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
