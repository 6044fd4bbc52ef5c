/// Framebuffer manager
///
/// A framebuffer is built from an ordered list of texture attachments. The
/// draw-buffer list follows that order with depth/stencil attachments left
/// out, and the object is only handed out once the completeness check passes.

use std::rc::Rc;

use crate::error::Result;
use crate::gpu::{AttachmentPoint, FramebufferName, FramebufferStatus, GpuApi, SharedGpu};
use crate::texture::TextureHandle;

const SOURCE: &str = "ltc::Framebuffer";

/// Shared framebuffer handle
pub type FramebufferHandle = Rc<Framebuffer>;

/// One texture bound to an attachment point
#[derive(Debug, Clone)]
pub struct AttachmentBinding {
    pub texture: TextureHandle,
    pub attachment: AttachmentPoint,
    pub mip_level: u32,
    /// Single layer (or cube face) to attach; `None` attaches the whole level
    pub layer: Option<u32>,
}

/// Descriptor for creating a framebuffer
#[derive(Debug, Clone, Default)]
pub struct FramebufferDesc {
    pub label: String,
    pub attachments: Vec<AttachmentBinding>,
}

impl FramebufferDesc {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attachments: Vec::new(),
        }
    }

    /// Append a whole-level attachment of mip 0
    pub fn add_attachment(mut self, attachment: AttachmentPoint, texture: TextureHandle) -> Self {
        self.attachments.push(AttachmentBinding {
            texture,
            attachment,
            mip_level: 0,
            layer: None,
        });
        self
    }

    /// Append an attachment of one level and optionally one layer
    pub fn add_attachment_at(
        mut self,
        attachment: AttachmentPoint,
        texture: TextureHandle,
        mip_level: u32,
        layer: Option<u32>,
    ) -> Self {
        self.attachments.push(AttachmentBinding {
            texture,
            attachment,
            mip_level,
            layer,
        });
        self
    }

    fn validate(&self) -> Result<()> {
        if self.attachments.is_empty() {
            crate::ltc_bail!(SOURCE, InvalidResource, "Framebuffer '{}' has no attachments", self.label);
        }
        let depth_like = self.attachments.iter().filter(|a| a.attachment.is_depth_like()).count();
        if depth_like > 1 {
            crate::ltc_bail!(
                SOURCE,
                InvalidResource,
                "Framebuffer '{}' has {} depth/stencil attachments, at most one is allowed",
                self.label,
                depth_like
            );
        }
        let mut previous: Option<u32> = None;
        for binding in &self.attachments {
            if let AttachmentPoint::Color(index) = binding.attachment {
                if previous.is_some_and(|p| index <= p) {
                    crate::ltc_bail!(
                        SOURCE,
                        InvalidResource,
                        "Framebuffer '{}': color attachment {} follows {}, indices must ascend",
                        self.label,
                        index,
                        previous.unwrap_or_default()
                    );
                }
                previous = Some(index);
            }
            let info = binding.texture.info();
            if binding.mip_level >= info.levels {
                crate::ltc_bail!(
                    SOURCE,
                    InvalidResource,
                    "Framebuffer '{}': level {} of '{}' does not exist ({} levels)",
                    self.label,
                    binding.mip_level,
                    info.label,
                    info.levels
                );
            }
        }
        Ok(())
    }
}

/// Completed framebuffer object; keeps its attachments alive
pub struct Framebuffer {
    gpu: SharedGpu,
    name: FramebufferName,
    label: String,
    attachments: Vec<AttachmentBinding>,
    draw_buffers: Vec<AttachmentPoint>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    /// Attach every binding through `attach`, declare draw buffers and check completeness
    pub(crate) fn create<F>(gpu: &SharedGpu, desc: &FramebufferDesc, mut attach: F) -> Result<FramebufferHandle>
    where
        F: FnMut(&mut dyn GpuApi, FramebufferName, &AttachmentBinding),
    {
        desc.validate()?;

        let name = gpu.borrow_mut().create_framebuffer()?;
        let draw_buffers: Vec<AttachmentPoint> = desc
            .attachments
            .iter()
            .map(|a| a.attachment)
            .filter(|a| !a.is_depth_like())
            .collect();

        let status = {
            let mut gpu = gpu.borrow_mut();
            for binding in &desc.attachments {
                attach(&mut *gpu, name, binding);
            }
            gpu.framebuffer_draw_buffers(name, &draw_buffers);
            gpu.check_framebuffer_status(name)
        };

        if status != FramebufferStatus::Complete {
            gpu.borrow_mut().delete_framebuffer(name);
            crate::ltc_bail!(SOURCE, IncompleteFramebuffer, "Framebuffer '{}': {}", desc.label, status);
        }

        let first = desc.attachments[0].texture.info().level_extent(desc.attachments[0].mip_level);
        crate::ltc_debug!(
            SOURCE,
            "Created framebuffer '{}' {}x{} with {} attachments",
            desc.label,
            first.width,
            first.height,
            desc.attachments.len()
        );
        Ok(Rc::new(Framebuffer {
            gpu: gpu.clone(),
            name,
            label: desc.label.clone(),
            attachments: desc.attachments.clone(),
            draw_buffers,
            width: first.width,
            height: first.height,
        }))
    }

    pub fn name(&self) -> FramebufferName {
        self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Color attachments in draw order
    pub fn draw_buffers(&self) -> &[AttachmentPoint] {
        &self.draw_buffers
    }

    pub fn attachments(&self) -> &[AttachmentBinding] {
        &self.attachments
    }

    /// Texture bound at `point`
    pub fn attachment(&self, point: AttachmentPoint) -> Option<&TextureHandle> {
        self.attachments.iter().find(|a| a.attachment == point).map(|a| &a.texture)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bind(&self) {
        self.gpu.borrow_mut().bind_framebuffer(Some(self.name));
    }

    /// Return to the default framebuffer
    pub fn unbind(&self) {
        self.gpu.borrow_mut().bind_framebuffer(None);
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        match self.gpu.try_borrow_mut() {
            Ok(mut gpu) => gpu.delete_framebuffer(self.name),
            Err(_) => crate::ltc_warn!(
                SOURCE,
                "GPU busy while dropping '{}', framebuffer {} leaked",
                self.label,
                self.name.0
            ),
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("draw_buffers", &self.draw_buffers)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
