/*!
# LTC Renderer

Rendering core for real-time area lights shaded with Linearly Transformed
Cosines (LTC), refined progressively across frames.

The crate is GPU-API agnostic: every GPU call goes through the `GpuApi`
binding trait. `SoftwareGpu` implements it in memory (headless runs and
tests); the `ltc_renderer_gl` crate implements it over an OpenGL context.

## Architecture

- **Device**: resource factory for a Core or Compatibility profile backend
- **Texture**: procedural, raster-image and DDS/KTX container textures
- **Framebuffer**: attachment sets with ordered draw buffers
- **Buffer**: uniform, storage, vertex and index data
- **Program**: tagged shader stages with cached uniform lookups
- **RenderPipeline**: Jitter, depth pre-pass, additive per-light LTC passes
  and resolve, accumulated over frames while the scene is static
*/

// Internal modules
mod error;
pub mod log;
pub mod format;
pub mod gpu;
pub mod texture;
pub mod framebuffer;
pub mod buffer;
pub mod device;
pub mod program;
pub mod camera;
pub mod pipeline;

#[cfg(test)]
mod test_support;

// Main ltc namespace module
pub mod ltc {
    // Error types
    pub use crate::error::{Error, Result};

    // Device and profiles
    pub use crate::device::{Device, DeviceBackend, DeviceDesc, DeviceProfile};

    pub use crate::camera::Camera;

    // Logging sub-module (types only; the ltc_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger, set_min_severity};
    }

    // GPU binding sub-module
    pub mod gpu {
        pub use crate::gpu::*;
        pub use crate::format::{BlockInfo, Extent3d, PixelFormat};
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::texture::{SamplerDesc, Texture, TextureDesc, TextureHandle, TextureInfo};
        pub use crate::framebuffer::{AttachmentBinding, Framebuffer, FramebufferDesc, FramebufferHandle};
        pub use crate::buffer::{Buffer, BufferDesc, BufferHandle};
        pub use crate::program::{Program, ShaderLibrary, ALL_EFFECTS, BUILTIN_VERSION};
    }

    // Rendering sub-module
    pub mod render {
        pub use crate::pipeline::*;
    }
}

// Re-export math library at crate root
pub use glam;
