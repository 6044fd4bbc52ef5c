/// GPU data buffers (uniform blocks, storage, vertex and index data)

use std::rc::Rc;

use crate::error::Result;
use crate::gpu::{BufferKind, BufferName, BufferUsage, GpuApi, SharedGpu};

const SOURCE: &str = "ltc::Buffer";

/// Shared buffer handle; the GPU object is deleted when the last handle drops
pub type BufferHandle = Rc<Buffer>;

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub label: String,
    pub kind: BufferKind,
    /// Size in bytes
    pub size: usize,
    pub usage: BufferUsage,
    /// Initial contents, exactly `size` bytes when present
    pub data: Option<Vec<u8>>,
}

impl BufferDesc {
    /// Uniform buffer that is rewritten after creation
    pub fn dynamic_uniform(label: impl Into<String>, size: usize) -> Self {
        Self {
            label: label.into(),
            kind: BufferKind::Uniform,
            size,
            usage: BufferUsage::DYNAMIC_STORAGE,
            data: None,
        }
    }
}

/// GPU buffer object
pub struct Buffer {
    gpu: SharedGpu,
    name: BufferName,
    label: String,
    kind: BufferKind,
    size: usize,
    usage: BufferUsage,
}

impl Buffer {
    /// Validate the descriptor, create the object and let `allocate` give it storage
    pub(crate) fn create<F>(gpu: &SharedGpu, desc: &BufferDesc, allocate: F) -> Result<BufferHandle>
    where
        F: FnOnce(&mut dyn GpuApi, BufferName) -> Result<()>,
    {
        if desc.size == 0 {
            crate::ltc_bail!(SOURCE, InvalidResource, "Buffer '{}' has size 0", desc.label);
        }
        if let Some(data) = &desc.data {
            if data.len() != desc.size {
                crate::ltc_bail!(
                    SOURCE,
                    InvalidResource,
                    "Buffer '{}': initial data is {} bytes, size is {}",
                    desc.label,
                    data.len(),
                    desc.size
                );
            }
        }

        let name = gpu.borrow_mut().create_buffer()?;
        let buffer = Buffer {
            gpu: gpu.clone(),
            name,
            label: desc.label.clone(),
            kind: desc.kind,
            size: desc.size,
            usage: desc.usage,
        };
        let allocated = allocate(&mut *gpu.borrow_mut(), name);
        allocated?;

        crate::ltc_debug!(SOURCE, "Created {:?} buffer '{}' ({} bytes)", desc.kind, desc.label, desc.size);
        Ok(Rc::new(buffer))
    }

    pub fn name(&self) -> BufferName {
        self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// `len` bytes at `offset` lie inside the buffer
    fn contains(&self, offset: usize, len: usize) -> bool {
        offset.checked_add(len).is_some_and(|end| end <= self.size)
    }

    /// Overwrite `data.len()` bytes starting at `offset`
    pub fn update(&self, offset: usize, data: &[u8]) -> Result<()> {
        if !self.contains(offset, data.len()) {
            crate::ltc_bail!(
                SOURCE,
                InvalidResource,
                "Update of {} bytes at {} overflows buffer '{}' ({} bytes)",
                data.len(),
                offset,
                self.label,
                self.size
            );
        }
        self.gpu.borrow_mut().buffer_sub_data(self.name, self.kind, offset, data)
    }

    /// Read `len` bytes starting at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        if !self.contains(offset, len) {
            crate::ltc_bail!(
                SOURCE,
                InvalidResource,
                "Read of {} bytes at {} overflows buffer '{}' ({} bytes)",
                len,
                offset,
                self.label,
                self.size
            );
        }
        self.gpu.borrow_mut().read_buffer(self.name, self.kind, offset, len)
    }

    /// Bind to an indexed binding point of the buffer's kind
    pub fn bind_base(&self, index: u32) {
        self.gpu.borrow_mut().bind_buffer_base(self.kind, index, Some(self.name));
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        match self.gpu.try_borrow_mut() {
            Ok(mut gpu) => gpu.delete_buffer(self.name),
            Err(_) => crate::ltc_warn!(SOURCE, "GPU busy while dropping '{}', buffer {} leaked", self.label, self.name.0),
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
