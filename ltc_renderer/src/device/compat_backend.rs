/// Compatibility-profile backend: per-level allocation, explicit 2D attachment
/// where the target allows it

use crate::buffer::{Buffer, BufferDesc, BufferHandle};
use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use crate::framebuffer::{Framebuffer, FramebufferDesc, FramebufferHandle};
use crate::gpu::{GpuApi, ImageTarget, SharedGpu, TextureName, TextureTarget, UsageHint};
use crate::texture::loader::{self, TextureAllocator};
use crate::texture::{TextureDesc, TextureHandle};
use super::device::{DeviceBackend, DeviceProfile};

/// Backend for contexts without immutable storage
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatBackend;

impl TextureAllocator for CompatBackend {
    /// One mutable allocation per level, per face for cube maps
    fn allocate(
        &self,
        gpu: &mut dyn GpuApi,
        texture: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()> {
        for level in 0..levels {
            let level_extent = target.level_extent(extent, level);
            if target == TextureTarget::Cube {
                for face in 0..6 {
                    gpu.texture_image(texture, ImageTarget::CubeFace(face), level, format, level_extent, None)?;
                }
            } else {
                gpu.texture_image(texture, ImageTarget::Texture(target), level, format, level_extent, None)?;
            }
        }
        Ok(())
    }
}

impl DeviceBackend for CompatBackend {
    fn profile(&self) -> DeviceProfile {
        DeviceProfile::Compatibility
    }

    fn create_texture(&self, gpu: &SharedGpu, desc: &TextureDesc) -> Result<TextureHandle> {
        loader::create_texture(gpu, self, desc)
    }

    fn create_framebuffer(&self, gpu: &SharedGpu, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        Framebuffer::create(gpu, desc, |gpu, framebuffer, binding| {
            let texture = binding.texture.name();
            let target = binding.texture.info().target;
            match (binding.layer, target) {
                (Some(face), TextureTarget::Cube) => gpu.framebuffer_texture_2d(
                    framebuffer,
                    binding.attachment,
                    ImageTarget::CubeFace(face),
                    texture,
                    binding.mip_level,
                ),
                (Some(layer), _) => {
                    gpu.framebuffer_texture_layer(framebuffer, binding.attachment, texture, binding.mip_level, layer)
                }
                (None, TextureTarget::D2 | TextureTarget::Rectangle) => gpu.framebuffer_texture_2d(
                    framebuffer,
                    binding.attachment,
                    ImageTarget::Texture(target),
                    texture,
                    binding.mip_level,
                ),
                // every layer or face at once
                (None, _) => gpu.framebuffer_texture(framebuffer, binding.attachment, texture, binding.mip_level),
            }
        })
    }

    fn create_buffer(&self, gpu: &SharedGpu, desc: &BufferDesc) -> Result<BufferHandle> {
        Buffer::create(gpu, desc, |gpu, buffer| {
            gpu.buffer_data(buffer, desc.kind, desc.size, desc.data.as_deref(), UsageHint::from_usage(desc.usage))
        })
    }
}
