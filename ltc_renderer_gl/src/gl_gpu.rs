/// `GpuApi` over an OpenGL context loaded with glow
///
/// Object names are the raw GL names. GL edits objects through binding
/// points, so texture edits go through a reserved scratch texture unit and
/// framebuffer edits rebind the current draw framebuffer afterwards.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;

use glow::HasContext;
use ltc_renderer::ltc::gpu::{
    AttachmentPoint, BlendState, BufferKind, BufferName, BufferUsage, DepthState, Extent3d,
    FramebufferName, FramebufferStatus, GpuApi, GpuCapabilities, ImageTarget, IndexType, PixelFormat,
    PrimitiveTopology, ProgramName, Region, ShaderName, ShaderStage, SharedGpu, TextureName,
    TextureParameter, TextureTarget, UniformLocation, UniformValue, UsageHint, VertexArrayName,
    Viewport,
};
use ltc_renderer::ltc::{Error, Result};

use crate::debug::{ErrorTracker, GlErrorStats};
use crate::gl_format;

const SOURCE: &str = "ltc::GlowGpu";

const TEXTURE_MAX_ANISOTROPY: u32 = 0x84FE;
const MAX_TEXTURE_MAX_ANISOTROPY: u32 = 0x84FF;

// ============================================================================
// Name conversion
// ============================================================================

fn non_zero(name: u32, kind: &str) -> Result<NonZeroU32> {
    NonZeroU32::new(name).ok_or_else(|| Error::InvalidResource(format!("{} name 0", kind)))
}

fn texture(name: TextureName) -> Option<glow::NativeTexture> {
    NonZeroU32::new(name.0).map(glow::NativeTexture)
}

fn framebuffer(name: FramebufferName) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(name.0).map(glow::NativeFramebuffer)
}

fn buffer(name: BufferName) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(name.0).map(glow::NativeBuffer)
}

fn shader(name: ShaderName) -> Option<glow::NativeShader> {
    NonZeroU32::new(name.0).map(glow::NativeShader)
}

fn program(name: ProgramName) -> Option<glow::NativeProgram> {
    NonZeroU32::new(name.0).map(glow::NativeProgram)
}

fn vertex_array(name: VertexArrayName) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(name.0).map(glow::NativeVertexArray)
}

/// How an image of a target is addressed by glTex*Image calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageShape {
    /// 2D calls; layers of 1D arrays live in y
    Planar,
    /// 3D calls; layers or slices live in z
    Volume,
}

fn image_shape(image: ImageTarget) -> Result<ImageShape> {
    match image.texture_target() {
        TextureTarget::D2 | TextureTarget::Rectangle | TextureTarget::Cube | TextureTarget::D1Array => {
            Ok(ImageShape::Planar)
        }
        TextureTarget::D2Array | TextureTarget::D3 | TextureTarget::CubeArray => Ok(ImageShape::Volume),
        TextureTarget::D1 => Err(ltc_renderer::ltc_err!(
            SOURCE,
            BackendError,
            "1D textures are not supported by the glow backend"
        )),
    }
}

/// (width, height) of a planar image; 1D arrays keep their layers in height
fn planar_size(image: ImageTarget, extent: Extent3d) -> (i32, i32) {
    if image.texture_target() == TextureTarget::D1Array {
        (extent.width as i32, extent.depth as i32)
    } else {
        (extent.width as i32, extent.height as i32)
    }
}

// ============================================================================
// GlowGpu
// ============================================================================

/// OpenGL binding driven through glow
pub struct GlowGpu {
    gl: glow::Context,
    capabilities: GpuCapabilities,
    /// Texture unit used for edits, never handed out to shaders
    scratch_unit: u32,
    bound_framebuffer: Option<FramebufferName>,
    errors: RefCell<ErrorTracker>,
}

impl GlowGpu {
    /// Wrap a current GL context
    pub fn new(gl: glow::Context) -> Result<Self> {
        let capabilities = unsafe { Self::query_capabilities(&gl) };
        let units = unsafe { gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) };
        if units < 2 {
            ltc_renderer::ltc_bail!(SOURCE, InitializationFailed, "Context exposes only {} texture units", units);
        }

        unsafe {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        }

        ltc_renderer::ltc_info!(
            SOURCE,
            "GL {}.{} context on {} ({}), {} texture units",
            capabilities.version.0,
            capabilities.version.1,
            capabilities.renderer,
            capabilities.vendor,
            units
        );

        Ok(Self {
            gl,
            capabilities,
            scratch_unit: units as u32 - 1,
            bound_framebuffer: None,
            errors: RefCell::new(ErrorTracker::new()),
        })
    }

    /// Wrap a current GL context into the handle devices take
    pub fn shared(gl: glow::Context) -> Result<SharedGpu> {
        let gpu: SharedGpu = Rc::new(RefCell::new(Self::new(gl)?));
        Ok(gpu)
    }

    /// Underlying glow context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// GL errors seen by this context since creation or the last reset
    pub fn error_stats(&self) -> GlErrorStats {
        self.errors.borrow().stats()
    }

    pub fn reset_error_stats(&self) {
        self.errors.borrow_mut().reset();
    }

    unsafe fn query_capabilities(gl: &glow::Context) -> GpuCapabilities {
        let version = gl.version();
        let max_anisotropy = if gl.supported_extensions().contains("GL_EXT_texture_filter_anisotropic")
            || (version.major, version.minor) >= (4, 6)
        {
            gl.get_parameter_f32(MAX_TEXTURE_MAX_ANISOTROPY)
        } else {
            1.0
        };
        GpuCapabilities {
            vendor: gl.get_parameter_string(glow::VENDOR),
            renderer: gl.get_parameter_string(glow::RENDERER),
            version: (version.major, version.minor),
            max_texture_size: gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE).max(0) as u32,
            max_color_attachments: gl.get_parameter_i32(glow::MAX_COLOR_ATTACHMENTS).max(0) as u32,
            max_anisotropy,
            uniform_attachment_sizes: version.major < 3,
        }
    }

    #[cfg(feature = "gl-error-checks")]
    fn check(&self, call: &str) -> Result<()> {
        let code = unsafe { self.gl.get_error() };
        if code == glow::NO_ERROR {
            return Ok(());
        }
        let message = format!("{} raised {} (0x{:04X})", call, gl_format::error_name(code), code);
        if self.errors.borrow_mut().track(&message) == 1 {
            return Err(ltc_renderer::ltc_err!(SOURCE, BackendError, "{}", message));
        }
        Err(Error::BackendError(message))
    }

    #[cfg(not(feature = "gl-error-checks"))]
    fn check(&self, _call: &str) -> Result<()> {
        Ok(())
    }

    /// Log a failed fire-and-forget call
    fn check_silent(&self, call: &str) {
        let _ = self.check(call);
    }

    /// Bind `name` on the scratch unit so texture edits hit it
    unsafe fn bind_for_edit(&self, target: TextureTarget, name: TextureName) {
        self.gl.active_texture(glow::TEXTURE0 + self.scratch_unit);
        self.gl.bind_texture(gl_format::texture_target(target), texture(name));
    }

    /// Bind `name` as draw framebuffer, run `edit`, restore the previous binding
    unsafe fn edit_framebuffer(&self, name: FramebufferName, edit: impl FnOnce(&glow::Context)) {
        self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, framebuffer(name));
        edit(&self.gl);
        self.gl
            .bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.bound_framebuffer.and_then(framebuffer));
    }
}

impl GpuApi for GlowGpu {
    fn capabilities(&self) -> &GpuCapabilities {
        &self.capabilities
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, _target: TextureTarget) -> Result<TextureName> {
        let native = unsafe { self.gl.create_texture() }
            .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glGenTextures failed: {}", e))?;
        Ok(TextureName(native.0.get()))
    }

    fn delete_texture(&mut self, name: TextureName) {
        if let Some(native) = texture(name) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn texture_storage(
        &mut self,
        name: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()> {
        let gl_target = gl_format::texture_target(target);
        let internal = gl_format::pixel_format(format).internal;
        let shape = image_shape(ImageTarget::Texture(target))?;
        unsafe {
            self.bind_for_edit(target, name);
            match shape {
                ImageShape::Planar => {
                    let (w, h) = planar_size(ImageTarget::Texture(target), extent);
                    self.gl.tex_storage_2d(gl_target, levels as i32, internal, w, h);
                }
                ImageShape::Volume => self.gl.tex_storage_3d(
                    gl_target,
                    levels as i32,
                    internal,
                    extent.width as i32,
                    extent.height as i32,
                    extent.depth as i32,
                ),
            }
        }
        self.check("glTexStorage")
    }

    fn texture_image(
        &mut self,
        name: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
        extent: Extent3d,
        data: Option<&[u8]>,
    ) -> Result<()> {
        let gl_image = gl_format::image_target(image);
        let gl = gl_format::pixel_format(format);
        let shape = image_shape(image)?;
        let level = level as i32;
        unsafe {
            self.bind_for_edit(image.texture_target(), name);
            if format.is_compressed() {
                // Compressed allocation always needs a payload of the right size
                let zeroed;
                let payload = match data {
                    Some(bytes) => bytes,
                    None => {
                        zeroed = vec![0u8; format.level_size(extent)];
                        &zeroed[..]
                    }
                };
                match shape {
                    ImageShape::Planar => {
                        let (w, h) = planar_size(image, extent);
                        self.gl.compressed_tex_image_2d(
                            gl_image,
                            level,
                            gl.internal as i32,
                            w,
                            h,
                            0,
                            payload.len() as i32,
                            payload,
                        );
                    }
                    ImageShape::Volume => self.gl.compressed_tex_image_3d(
                        gl_image,
                        level,
                        gl.internal as i32,
                        extent.width as i32,
                        extent.height as i32,
                        extent.depth as i32,
                        0,
                        payload.len() as i32,
                        payload,
                    ),
                }
            } else {
                match shape {
                    ImageShape::Planar => {
                        let (w, h) = planar_size(image, extent);
                        self.gl.tex_image_2d(
                            gl_image,
                            level,
                            gl.internal as i32,
                            w,
                            h,
                            0,
                            gl.format,
                            gl.ty,
                            glow::PixelUnpackData::Slice(data),
                        );
                    }
                    ImageShape::Volume => self.gl.tex_image_3d(
                        gl_image,
                        level,
                        gl.internal as i32,
                        extent.width as i32,
                        extent.height as i32,
                        extent.depth as i32,
                        0,
                        gl.format,
                        gl.ty,
                        glow::PixelUnpackData::Slice(data),
                    ),
                }
            }
        }
        self.check("glTexImage")
    }

    fn texture_sub_image(
        &mut self,
        name: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()> {
        let gl_image = gl_format::image_target(image);
        let gl = gl_format::pixel_format(format);
        let [x, y, z] = region.offset.map(|v| v as i32);
        let extent = region.extent;
        unsafe {
            self.bind_for_edit(image.texture_target(), name);
            match image_shape(image)? {
                ImageShape::Planar => {
                    let (w, h) = planar_size(image, extent);
                    let y = if image.texture_target() == TextureTarget::D1Array { z } else { y };
                    self.gl.tex_sub_image_2d(
                        gl_image,
                        level as i32,
                        x,
                        y,
                        w,
                        h,
                        gl.format,
                        gl.ty,
                        glow::PixelUnpackData::Slice(Some(data)),
                    );
                }
                ImageShape::Volume => self.gl.tex_sub_image_3d(
                    gl_image,
                    level as i32,
                    x,
                    y,
                    z,
                    extent.width as i32,
                    extent.height as i32,
                    extent.depth as i32,
                    gl.format,
                    gl.ty,
                    glow::PixelUnpackData::Slice(Some(data)),
                ),
            }
        }
        self.check("glTexSubImage")
    }

    fn compressed_texture_sub_image(
        &mut self,
        name: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()> {
        let gl_image = gl_format::image_target(image);
        let internal = gl_format::pixel_format(format).internal;
        let [x, y, z] = region.offset.map(|v| v as i32);
        let extent = region.extent;
        unsafe {
            self.bind_for_edit(image.texture_target(), name);
            match image_shape(image)? {
                ImageShape::Planar => {
                    let (w, h) = planar_size(image, extent);
                    self.gl.compressed_tex_sub_image_2d(
                        gl_image,
                        level as i32,
                        x,
                        y,
                        w,
                        h,
                        internal,
                        glow::CompressedPixelUnpackData::Slice(data),
                    );
                }
                ImageShape::Volume => self.gl.compressed_tex_sub_image_3d(
                    gl_image,
                    level as i32,
                    x,
                    y,
                    z,
                    extent.width as i32,
                    extent.height as i32,
                    extent.depth as i32,
                    internal,
                    glow::CompressedPixelUnpackData::Slice(data),
                ),
            }
        }
        self.check("glCompressedTexSubImage")
    }

    fn texture_parameter(&mut self, name: TextureName, target: TextureTarget, parameter: TextureParameter) {
        let t = gl_format::texture_target(target);
        unsafe {
            self.bind_for_edit(target, name);
            match parameter {
                TextureParameter::WrapS(mode) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_S, gl_format::wrap_mode(mode))
                }
                TextureParameter::WrapT(mode) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_T, gl_format::wrap_mode(mode))
                }
                TextureParameter::WrapR(mode) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_R, gl_format::wrap_mode(mode))
                }
                TextureParameter::MinFilter(filter) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_MIN_FILTER, gl_format::min_filter(filter))
                }
                TextureParameter::MagFilter(filter) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_MAG_FILTER, gl_format::mag_filter(filter))
                }
                TextureParameter::MaxAnisotropy(value) => {
                    self.gl.tex_parameter_f32(t, TEXTURE_MAX_ANISOTROPY, value)
                }
                TextureParameter::BaseLevel(level) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_BASE_LEVEL, level as i32)
                }
                TextureParameter::MaxLevel(level) => {
                    self.gl.tex_parameter_i32(t, glow::TEXTURE_MAX_LEVEL, level as i32)
                }
                TextureParameter::Swizzle(channels) => {
                    let points = [
                        glow::TEXTURE_SWIZZLE_R,
                        glow::TEXTURE_SWIZZLE_G,
                        glow::TEXTURE_SWIZZLE_B,
                        glow::TEXTURE_SWIZZLE_A,
                    ];
                    for (point, source) in points.into_iter().zip(channels) {
                        self.gl.tex_parameter_i32(t, point, gl_format::swizzle(source));
                    }
                }
            }
        }
        self.check_silent("glTexParameter");
    }

    fn generate_mipmap(&mut self, name: TextureName, target: TextureTarget) -> Result<()> {
        unsafe {
            self.bind_for_edit(target, name);
            self.gl.generate_mipmap(gl_format::texture_target(target));
        }
        self.check("glGenerateMipmap")
    }

    fn read_texture_image(
        &mut self,
        name: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
    ) -> Result<Vec<u8>> {
        if format.is_compressed() {
            ltc_renderer::ltc_bail!(SOURCE, BackendError, "Reading back compressed format {:?} is not supported", format);
        }
        let gl_image = gl_format::image_target(image);
        let gl = gl_format::pixel_format(format);
        let mut pixels = unsafe {
            self.bind_for_edit(image.texture_target(), name);
            let query = |parameter| self.gl.get_tex_level_parameter_i32(gl_image, level as i32, parameter).max(1) as u32;
            let extent = Extent3d::new(
                query(glow::TEXTURE_WIDTH),
                query(glow::TEXTURE_HEIGHT),
                query(glow::TEXTURE_DEPTH),
            );
            vec![0u8; format.level_size(extent)]
        };
        unsafe {
            self.gl.get_tex_image(
                gl_image,
                level as i32,
                gl.format,
                gl.ty,
                glow::PixelPackData::Slice(Some(&mut pixels)),
            );
        }
        self.check("glGetTexImage")?;
        Ok(pixels)
    }

    fn bind_texture_unit(&mut self, unit: u32, target: TextureTarget, name: Option<TextureName>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(gl_format::texture_target(target), name.and_then(texture));
        }
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferName> {
        let native = unsafe { self.gl.create_framebuffer() }
            .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glGenFramebuffers failed: {}", e))?;
        Ok(FramebufferName(native.0.get()))
    }

    fn delete_framebuffer(&mut self, name: FramebufferName) {
        if self.bound_framebuffer == Some(name) {
            self.bind_framebuffer(None);
        }
        if let Some(native) = framebuffer(name) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn framebuffer_texture(&mut self, fb: FramebufferName, point: AttachmentPoint, name: TextureName, level: u32) {
        unsafe {
            self.edit_framebuffer(fb, |gl| {
                gl.framebuffer_texture(glow::DRAW_FRAMEBUFFER, gl_format::attachment(point), texture(name), level as i32)
            });
        }
        self.check_silent("glFramebufferTexture");
    }

    fn framebuffer_texture_2d(
        &mut self,
        fb: FramebufferName,
        point: AttachmentPoint,
        image: ImageTarget,
        name: TextureName,
        level: u32,
    ) {
        unsafe {
            self.edit_framebuffer(fb, |gl| {
                gl.framebuffer_texture_2d(
                    glow::DRAW_FRAMEBUFFER,
                    gl_format::attachment(point),
                    gl_format::image_target(image),
                    texture(name),
                    level as i32,
                )
            });
        }
        self.check_silent("glFramebufferTexture2D");
    }

    fn framebuffer_texture_layer(
        &mut self,
        fb: FramebufferName,
        point: AttachmentPoint,
        name: TextureName,
        level: u32,
        layer: u32,
    ) {
        unsafe {
            self.edit_framebuffer(fb, |gl| {
                gl.framebuffer_texture_layer(
                    glow::DRAW_FRAMEBUFFER,
                    gl_format::attachment(point),
                    texture(name),
                    level as i32,
                    layer as i32,
                )
            });
        }
        self.check_silent("glFramebufferTextureLayer");
    }

    fn framebuffer_draw_buffers(&mut self, fb: FramebufferName, buffers: &[AttachmentPoint]) {
        let mut points: Vec<u32> = buffers.iter().map(|p| gl_format::attachment(*p)).collect();
        if points.is_empty() {
            points.push(glow::NONE);
        }
        unsafe {
            self.edit_framebuffer(fb, |gl| gl.draw_buffers(&points));
        }
        self.check_silent("glDrawBuffers");
    }

    fn check_framebuffer_status(&mut self, fb: FramebufferName) -> FramebufferStatus {
        let mut status = 0;
        unsafe {
            self.edit_framebuffer(fb, |gl| status = gl.check_framebuffer_status(glow::DRAW_FRAMEBUFFER));
        }
        gl_format::framebuffer_status(status)
    }

    fn bind_framebuffer(&mut self, fb: Option<FramebufferName>) {
        unsafe {
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, fb.and_then(framebuffer));
        }
        self.bound_framebuffer = fb;
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<BufferName> {
        let native = unsafe { self.gl.create_buffer() }
            .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glGenBuffers failed: {}", e))?;
        Ok(BufferName(native.0.get()))
    }

    fn delete_buffer(&mut self, name: BufferName) {
        if let Some(native) = buffer(name) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn buffer_storage(
        &mut self,
        name: BufferName,
        kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<()> {
        let target = gl_format::buffer_target(kind);
        non_zero(name.0, "buffer")?;
        unsafe {
            self.gl.bind_buffer(target, buffer(name));
            self.gl.buffer_storage(target, size as i32, data, gl_format::buffer_storage_flags(usage));
        }
        self.check("glBufferStorage")
    }

    fn buffer_data(
        &mut self,
        name: BufferName,
        kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        hint: UsageHint,
    ) -> Result<()> {
        let target = gl_format::buffer_target(kind);
        non_zero(name.0, "buffer")?;
        unsafe {
            self.gl.bind_buffer(target, buffer(name));
            match data {
                Some(bytes) => self.gl.buffer_data_u8_slice(target, bytes, gl_format::usage_hint(hint)),
                None => self.gl.buffer_data_size(target, size as i32, gl_format::usage_hint(hint)),
            }
        }
        self.check("glBufferData")
    }

    fn buffer_sub_data(&mut self, name: BufferName, kind: BufferKind, offset: usize, data: &[u8]) -> Result<()> {
        let target = gl_format::buffer_target(kind);
        unsafe {
            self.gl.bind_buffer(target, buffer(name));
            self.gl.buffer_sub_data_u8_slice(target, offset as i32, data);
        }
        self.check("glBufferSubData")
    }

    fn read_buffer(&mut self, name: BufferName, kind: BufferKind, offset: usize, len: usize) -> Result<Vec<u8>> {
        let target = gl_format::buffer_target(kind);
        let mut bytes = vec![0u8; len];
        unsafe {
            self.gl.bind_buffer(target, buffer(name));
            self.gl.get_buffer_sub_data(target, offset as i32, &mut bytes);
        }
        self.check("glGetBufferSubData")?;
        Ok(bytes)
    }

    fn bind_buffer_base(&mut self, kind: BufferKind, index: u32, name: Option<BufferName>) {
        unsafe {
            self.gl.bind_buffer_base(gl_format::buffer_target(kind), index, name.and_then(buffer));
        }
    }

    // ===== SHADERS & PROGRAMS =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderName> {
        unsafe {
            let native = self
                .gl
                .create_shader(gl_format::shader_stage(stage))
                .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glCreateShader failed: {}", e))?;
            self.gl.shader_source(native, source);
            self.gl.compile_shader(native);
            if !self.gl.get_shader_compile_status(native) {
                let log = self.gl.get_shader_info_log(native);
                self.gl.delete_shader(native);
                return Err(Error::ShaderCompilationFailed(log));
            }
            Ok(ShaderName(native.0.get()))
        }
    }

    fn delete_shader(&mut self, name: ShaderName) {
        if let Some(native) = shader(name) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn create_program(&mut self) -> Result<ProgramName> {
        let native = unsafe { self.gl.create_program() }
            .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glCreateProgram failed: {}", e))?;
        Ok(ProgramName(native.0.get()))
    }

    fn delete_program(&mut self, name: ProgramName) {
        if let Some(native) = program(name) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn attach_shader(&mut self, prog: ProgramName, stage: ShaderName) {
        if let (Some(p), Some(s)) = (program(prog), shader(stage)) {
            unsafe { self.gl.attach_shader(p, s) };
        }
    }

    fn link_program(&mut self, name: ProgramName) -> Result<()> {
        let native = program(name).ok_or_else(|| Error::InvalidResource("program name 0".to_string()))?;
        unsafe {
            self.gl.link_program(native);
            if !self.gl.get_program_link_status(native) {
                return Err(Error::ProgramLinkFailed(self.gl.get_program_info_log(native)));
            }
        }
        Ok(())
    }

    fn use_program(&mut self, name: Option<ProgramName>) {
        unsafe { self.gl.use_program(name.and_then(program)) };
    }

    fn uniform_location(&mut self, name: ProgramName, uniform: &str) -> Option<UniformLocation> {
        let native = program(name)?;
        unsafe { self.gl.get_uniform_location(native, uniform) }.map(|location| UniformLocation(location.0))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let l = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(l, v),
                UniformValue::UInt(v) => self.gl.uniform_1_u32(l, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(l, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(l, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(l, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(l, v.x, v.y, v.z, v.w),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(l, false, &m.to_cols_array()),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(l, false, &m.to_cols_array()),
            }
        }
        self.check_silent("glUniform");
    }

    fn uniform_block_index(&mut self, name: ProgramName, block: &str) -> Option<u32> {
        let native = program(name)?;
        unsafe { self.gl.get_uniform_block_index(native, block) }
    }

    fn uniform_block_binding(&mut self, name: ProgramName, block_index: u32, binding: u32) {
        if let Some(native) = program(name) {
            unsafe { self.gl.uniform_block_binding(native, block_index, binding) };
        }
    }

    // ===== STATE & DRAWS =====

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width as i32, viewport.height as i32)
        };
    }

    fn set_color_write(&mut self, enabled: bool) {
        unsafe { self.gl.color_mask(enabled, enabled, enabled, enabled) };
    }

    fn set_depth_state(&mut self, state: DepthState) {
        unsafe {
            match state.test {
                Some(op) => {
                    self.gl.enable(glow::DEPTH_TEST);
                    self.gl.depth_func(gl_format::compare_op(op));
                }
                None => self.gl.disable(glow::DEPTH_TEST),
            }
            self.gl.depth_mask(state.write);
        }
    }

    fn set_blend(&mut self, blend: Option<BlendState>) {
        unsafe {
            match blend {
                Some(state) => {
                    self.gl.enable(glow::BLEND);
                    self.gl
                        .blend_func(gl_format::blend_factor(state.src), gl_format::blend_factor(state.dst));
                    self.gl.blend_equation(gl_format::blend_op(state.op));
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn set_cull_face(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        let mut mask = 0;
        unsafe {
            if let Some([r, g, b, a]) = color {
                self.gl.clear_color(r, g, b, a);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if let Some(value) = depth {
                self.gl.clear_depth_f32(value);
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            if mask != 0 {
                self.gl.clear(mask);
            }
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayName> {
        let native = unsafe { self.gl.create_vertex_array() }
            .map_err(|e| ltc_renderer::ltc_err!(SOURCE, BackendError, "glGenVertexArrays failed: {}", e))?;
        Ok(VertexArrayName(native.0.get()))
    }

    fn delete_vertex_array(&mut self, name: VertexArrayName) {
        if let Some(native) = vertex_array(name) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn bind_vertex_array(&mut self, name: Option<VertexArrayName>) {
        unsafe { self.gl.bind_vertex_array(name.and_then(vertex_array)) };
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(gl_format::topology(topology), first as i32, count as i32)
        };
        self.check_silent("glDrawArrays");
    }

    fn draw_elements(&mut self, topology: PrimitiveTopology, count: u32, index_type: IndexType, offset: usize) {
        unsafe {
            self.gl.draw_elements(
                gl_format::topology(topology),
                count as i32,
                gl_format::index_type(index_type),
                offset as i32,
            )
        };
        self.check_silent("glDrawElements");
    }
}
