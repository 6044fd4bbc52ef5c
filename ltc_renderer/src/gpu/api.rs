/// The thin GPU-API binding every device backend drives.
///
/// Calls mirror a modern OpenGL context with named-object entry points:
/// each call names the object it edits, so implementations that need
/// bind-to-edit semantics do the binding themselves. Resource calls return
/// `Result` so context errors surface at the call site; state and draw calls
/// are fire-and-forget like their GL counterparts.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use super::types::*;

/// Shared handle to the GPU binding.
///
/// The context is single-threaded; every resource keeps a clone so it can
/// release its GPU object on drop.
pub type SharedGpu = Rc<RefCell<dyn GpuApi>>;

pub trait GpuApi {
    /// Context version, limits and vendor strings
    fn capabilities(&self) -> &GpuCapabilities;

    // ===== TEXTURES =====

    fn create_texture(&mut self, target: TextureTarget) -> Result<TextureName>;

    fn delete_texture(&mut self, texture: TextureName);

    /// Immutable storage for every level (and every cube face) in one call
    fn texture_storage(
        &mut self,
        texture: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()>;

    /// Mutable allocation of one level of one image, optionally filled
    fn texture_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
        extent: Extent3d,
        data: Option<&[u8]>,
    ) -> Result<()>;

    /// Linear upload into an allocated level
    fn texture_sub_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()>;

    /// Block upload into an allocated level of a compressed texture
    fn compressed_texture_sub_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()>;

    fn texture_parameter(
        &mut self,
        texture: TextureName,
        target: TextureTarget,
        parameter: TextureParameter,
    );

    /// Fill levels 1.. from level 0
    fn generate_mipmap(&mut self, texture: TextureName, target: TextureTarget) -> Result<()>;

    /// Read back one level of one image in the format's client layout
    fn read_texture_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
    ) -> Result<Vec<u8>>;

    fn bind_texture_unit(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureName>);

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferName>;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferName);

    /// Attach a whole level (layered when the texture has layers)
    fn framebuffer_texture(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        texture: TextureName,
        level: u32,
    );

    /// Attach one 2D image (a cube face for cube maps)
    fn framebuffer_texture_2d(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        image: ImageTarget,
        texture: TextureName,
        level: u32,
    );

    /// Attach a single layer of an array, 3D or cube texture
    fn framebuffer_texture_layer(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        texture: TextureName,
        level: u32,
        layer: u32,
    );

    fn framebuffer_draw_buffers(&mut self, framebuffer: FramebufferName, buffers: &[AttachmentPoint]);

    fn check_framebuffer_status(&mut self, framebuffer: FramebufferName) -> FramebufferStatus;

    /// Bind for drawing; `None` selects the default framebuffer
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferName>);

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<BufferName>;

    fn delete_buffer(&mut self, buffer: BufferName);

    /// Immutable storage with usage flags
    fn buffer_storage(
        &mut self,
        buffer: BufferName,
        kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<()>;

    /// Mutable data store with a usage hint
    fn buffer_data(
        &mut self,
        buffer: BufferName,
        kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        hint: UsageHint,
    ) -> Result<()>;

    fn buffer_sub_data(
        &mut self,
        buffer: BufferName,
        kind: BufferKind,
        offset: usize,
        data: &[u8],
    ) -> Result<()>;

    fn read_buffer(
        &mut self,
        buffer: BufferName,
        kind: BufferKind,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u8>>;

    fn bind_buffer_base(&mut self, kind: BufferKind, index: u32, buffer: Option<BufferName>);

    // ===== SHADERS & PROGRAMS =====

    /// Compile one stage; the error carries the compiler log
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderName>;

    fn delete_shader(&mut self, shader: ShaderName);

    fn create_program(&mut self) -> Result<ProgramName>;

    fn delete_program(&mut self, program: ProgramName);

    fn attach_shader(&mut self, program: ProgramName, shader: ShaderName);

    /// Link attached stages; the error carries the linker log
    fn link_program(&mut self, program: ProgramName) -> Result<()>;

    fn use_program(&mut self, program: Option<ProgramName>);

    fn uniform_location(&mut self, program: ProgramName, name: &str) -> Option<UniformLocation>;

    /// Set a uniform of the program currently in use
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn uniform_block_index(&mut self, program: ProgramName, name: &str) -> Option<u32>;

    fn uniform_block_binding(&mut self, program: ProgramName, block_index: u32, binding: u32);

    // ===== STATE & DRAWS =====

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_color_write(&mut self, enabled: bool);

    fn set_depth_state(&mut self, state: DepthState);

    /// `None` disables blending
    fn set_blend(&mut self, blend: Option<BlendState>);

    fn set_cull_face(&mut self, enabled: bool);

    /// Clear the bound framebuffer; `None` leaves that aspect untouched
    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>);

    fn create_vertex_array(&mut self) -> Result<VertexArrayName>;

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayName);

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayName>);

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32);

    fn draw_elements(&mut self, topology: PrimitiveTopology, count: u32, index_type: IndexType, offset: usize);
}
