/// Core-profile backend: immutable storage, layered attachment

use crate::buffer::{Buffer, BufferDesc, BufferHandle};
use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use crate::framebuffer::{Framebuffer, FramebufferDesc, FramebufferHandle};
use crate::gpu::{GpuApi, SharedGpu, TextureName, TextureTarget};
use crate::texture::loader::{self, TextureAllocator};
use crate::texture::{TextureDesc, TextureHandle};
use super::device::{DeviceBackend, DeviceProfile};

/// Backend for contexts with direct-state-access style entry points
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreBackend;

impl TextureAllocator for CoreBackend {
    fn allocate(
        &self,
        gpu: &mut dyn GpuApi,
        texture: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()> {
        gpu.texture_storage(texture, target, levels, format, extent)
    }
}

impl DeviceBackend for CoreBackend {
    fn profile(&self) -> DeviceProfile {
        DeviceProfile::Core
    }

    fn create_texture(&self, gpu: &SharedGpu, desc: &TextureDesc) -> Result<TextureHandle> {
        loader::create_texture(gpu, self, desc)
    }

    fn create_framebuffer(&self, gpu: &SharedGpu, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        Framebuffer::create(gpu, desc, |gpu, framebuffer, binding| {
            let texture = binding.texture.name();
            match binding.layer {
                Some(layer) => {
                    gpu.framebuffer_texture_layer(framebuffer, binding.attachment, texture, binding.mip_level, layer)
                }
                None => gpu.framebuffer_texture(framebuffer, binding.attachment, texture, binding.mip_level),
            }
        })
    }

    fn create_buffer(&self, gpu: &SharedGpu, desc: &BufferDesc) -> Result<BufferHandle> {
        Buffer::create(gpu, desc, |gpu, buffer| {
            gpu.buffer_storage(buffer, desc.kind, desc.size, desc.data.as_deref(), desc.usage)
        })
    }
}
