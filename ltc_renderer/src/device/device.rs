/// Device, its configuration and the per-profile backend trait

use crate::buffer::{BufferDesc, BufferHandle};
use crate::error::Result;
use crate::framebuffer::{FramebufferDesc, FramebufferHandle};
use crate::gpu::{GpuCapabilities, SharedGpu, VertexArrayName};
use crate::program::Program;
use crate::texture::{TextureDesc, TextureHandle};
use super::compat_backend::CompatBackend;
use super::core_backend::CoreBackend;

const SOURCE: &str = "ltc::Device";

// ============================================================================
// Configuration
// ============================================================================

/// GPU-API profile a device drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceProfile {
    /// Immutable storage and layered attachment (GL 4.5+)
    Core,
    /// Mutable per-level allocation and explicit 2D attachment (GL 3.3+)
    Compatibility,
}

impl DeviceProfile {
    /// Minimum (major, minor) context version
    pub fn required_version(&self) -> (u32, u32) {
        match self {
            DeviceProfile::Core => (4, 5),
            DeviceProfile::Compatibility => (3, 3),
        }
    }
}

/// Device configuration
#[derive(Debug, Clone)]
pub struct DeviceDesc {
    pub label: String,
    pub profile: DeviceProfile,
}

impl Default for DeviceDesc {
    fn default() -> Self {
        Self {
            label: "LTC Device".to_string(),
            profile: DeviceProfile::Core,
        }
    }
}

// ============================================================================
// Backend trait
// ============================================================================

/// Resource creation for one profile.
///
/// Both implementations return resources with identical `info()`; only the
/// GPU calls used to build them differ.
pub trait DeviceBackend {
    fn profile(&self) -> DeviceProfile;

    fn create_texture(&self, gpu: &SharedGpu, desc: &TextureDesc) -> Result<TextureHandle>;

    fn create_framebuffer(&self, gpu: &SharedGpu, desc: &FramebufferDesc) -> Result<FramebufferHandle>;

    fn create_buffer(&self, gpu: &SharedGpu, desc: &BufferDesc) -> Result<BufferHandle>;
}

// ============================================================================
// Device
// ============================================================================

/// Resource factory bound to one GPU binding and one profile
pub struct Device {
    label: String,
    gpu: SharedGpu,
    backend: Box<dyn DeviceBackend>,
}

impl Device {
    /// Create a device, failing when the context is too old for the profile
    pub fn new(desc: DeviceDesc, gpu: SharedGpu) -> Result<Self> {
        let caps = gpu.borrow().capabilities().clone();
        let (major, minor) = desc.profile.required_version();
        if !caps.supports_version(major, minor) {
            crate::ltc_bail!(
                SOURCE,
                InitializationFailed,
                "{:?} profile needs GL {}.{}, context '{}' is {}.{}",
                desc.profile,
                major,
                minor,
                caps.renderer,
                caps.version.0,
                caps.version.1
            );
        }

        let backend: Box<dyn DeviceBackend> = match desc.profile {
            DeviceProfile::Core => Box::new(CoreBackend),
            DeviceProfile::Compatibility => Box::new(CompatBackend),
        };

        crate::ltc_info!(
            SOURCE,
            "Device '{}' ready: {:?} profile on {} {} (GL {}.{})",
            desc.label,
            desc.profile,
            caps.vendor,
            caps.renderer,
            caps.version.0,
            caps.version.1
        );
        Ok(Self {
            label: desc.label,
            gpu,
            backend,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn profile(&self) -> DeviceProfile {
        self.backend.profile()
    }

    /// The shared GPU binding
    pub fn gpu(&self) -> &SharedGpu {
        &self.gpu
    }

    pub fn capabilities(&self) -> GpuCapabilities {
        self.gpu.borrow().capabilities().clone()
    }

    pub fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle> {
        self.backend.create_texture(&self.gpu, desc)
    }

    pub fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        self.backend.create_framebuffer(&self.gpu, desc)
    }

    pub fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferHandle> {
        self.backend.create_buffer(&self.gpu, desc)
    }

    /// Empty program ready for `add_stage`
    pub fn create_program(&self, label: impl Into<String>) -> Result<Program> {
        Program::new(&self.gpu, label)
    }

    /// Attribute-less vertex array for generated geometry (full-screen passes)
    pub fn create_vertex_array(&self) -> Result<VertexArrayName> {
        self.gpu.borrow_mut().create_vertex_array()
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
