/// Software GPU (no context required)
///
/// An in-memory implementation of `GpuApi` that keeps texel and buffer
/// contents, validates calls the way a GL driver would, and records every
/// command it receives. Used for headless runs and for every test that
/// needs a device without a real GPU.
///
/// Shader sources are not executed: compilation only checks for an entry
/// point and collects `uniform` declarations, so programs expose the same
/// active uniforms and blocks a real linker would.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::format::{Extent3d, PixelFormat};
use super::api::GpuApi;
use super::name_allocator::NameAllocator;
use super::types::*;

// ============================================================================
// Recorded commands
// ============================================================================

/// Snapshot of the pipeline state at a draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub framebuffer: Option<FramebufferName>,
    pub program: ProgramName,
    pub vertex_array: Option<VertexArrayName>,
    pub topology: PrimitiveTopology,
    pub count: u32,
    pub indexed: bool,
    pub viewport: Viewport,
    pub color_write: bool,
    pub depth: DepthState,
    pub blend: Option<BlendState>,
    pub cull_face: bool,
    /// (unit, texture) pairs sorted by unit
    pub textures: Vec<(u32, TextureName)>,
}

/// Every call the software GPU receives, in order
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateTexture { texture: TextureName, target: TextureTarget },
    DeleteTexture(TextureName),
    TextureStorage { texture: TextureName, levels: u32, format: PixelFormat, extent: Extent3d },
    TextureImage { texture: TextureName, image: ImageTarget, level: u32, format: PixelFormat, extent: Extent3d, with_data: bool },
    TextureSubImage { texture: TextureName, image: ImageTarget, level: u32, region: Region, compressed: bool },
    TextureParameter { texture: TextureName, parameter: TextureParameter },
    GenerateMipmap(TextureName),
    BindTextureUnit { unit: u32, texture: Option<TextureName> },

    CreateFramebuffer(FramebufferName),
    DeleteFramebuffer(FramebufferName),
    FramebufferTexture { framebuffer: FramebufferName, attachment: AttachmentPoint, texture: TextureName, level: u32 },
    FramebufferTexture2d { framebuffer: FramebufferName, attachment: AttachmentPoint, image: ImageTarget, texture: TextureName, level: u32 },
    FramebufferTextureLayer { framebuffer: FramebufferName, attachment: AttachmentPoint, texture: TextureName, level: u32, layer: u32 },
    DrawBuffers { framebuffer: FramebufferName, buffers: Vec<AttachmentPoint> },
    BindFramebuffer(Option<FramebufferName>),

    CreateBuffer(BufferName),
    DeleteBuffer(BufferName),
    BufferStorage { buffer: BufferName, size: usize, usage: BufferUsage },
    BufferData { buffer: BufferName, size: usize, hint: UsageHint },
    BufferSubData { buffer: BufferName, offset: usize, size: usize },
    BindBufferBase { kind: BufferKind, index: u32, buffer: Option<BufferName> },

    CompileShader { shader: ShaderName, stage: ShaderStage },
    LinkProgram(ProgramName),
    DeleteProgram(ProgramName),
    UseProgram(Option<ProgramName>),
    SetUniform { program: ProgramName, location: UniformLocation, value: UniformValue },
    UniformBlockBinding { program: ProgramName, block_index: u32, binding: u32 },

    Viewport(Viewport),
    ColorWrite(bool),
    DepthState(DepthState),
    Blend(Option<BlendState>),
    CullFace(bool),
    Clear { framebuffer: Option<FramebufferName>, color: Option<[f32; 4]>, depth: Option<f32> },
    BindVertexArray(Option<VertexArrayName>),
    Draw(DrawCall),
}

// ============================================================================
// Object storage
// ============================================================================

struct SoftImage {
    extent: Extent3d,
    data: Vec<u8>,
}

struct SoftTexture {
    target: TextureTarget,
    format: Option<PixelFormat>,
    immutable: bool,
    levels: u32,
    /// Keyed by (face, level)
    images: FxHashMap<(u32, u32), SoftImage>,
    parameters: Vec<TextureParameter>,
}

struct SoftAttachment {
    point: AttachmentPoint,
    texture: TextureName,
    level: u32,
    face: u32,
    layer: Option<u32>,
    layered: bool,
}

#[derive(Default)]
struct SoftFramebuffer {
    attachments: Vec<SoftAttachment>,
    draw_buffers: Vec<AttachmentPoint>,
}

struct SoftBuffer {
    data: Vec<u8>,
    allocated: bool,
    immutable: bool,
    usage: BufferUsage,
}

struct SoftShader {
    stage: ShaderStage,
    uniforms: Vec<(String, String)>,
    blocks: Vec<String>,
}

#[derive(Default)]
struct SoftProgram {
    shaders: Vec<ShaderName>,
    linked: bool,
    /// (name, type); the index is the uniform location
    uniforms: Vec<(String, String)>,
    blocks: Vec<String>,
    block_bindings: FxHashMap<u32, u32>,
    values: FxHashMap<u32, UniformValue>,
}

struct SoftState {
    framebuffer: Option<FramebufferName>,
    program: Option<ProgramName>,
    vertex_array: Option<VertexArrayName>,
    viewport: Viewport,
    color_write: bool,
    depth: DepthState,
    blend: Option<BlendState>,
    cull_face: bool,
    texture_units: FxHashMap<u32, TextureName>,
    buffer_bindings: FxHashMap<(BufferKind, u32), BufferName>,
}

impl Default for SoftState {
    fn default() -> Self {
        Self {
            framebuffer: None,
            program: None,
            vertex_array: None,
            viewport: Viewport::from_size(0, 0),
            color_write: true,
            depth: DepthState::DISABLED,
            blend: None,
            cull_face: false,
            texture_units: FxHashMap::default(),
            buffer_bindings: FxHashMap::default(),
        }
    }
}

// ============================================================================
// Software GPU
// ============================================================================

pub struct SoftwareGpu {
    capabilities: GpuCapabilities,
    texture_names: NameAllocator,
    framebuffer_names: NameAllocator,
    buffer_names: NameAllocator,
    program_names: NameAllocator,
    vertex_array_names: NameAllocator,
    textures: FxHashMap<u32, SoftTexture>,
    framebuffers: FxHashMap<u32, SoftFramebuffer>,
    buffers: FxHashMap<u32, SoftBuffer>,
    shaders: FxHashMap<u32, SoftShader>,
    programs: FxHashMap<u32, SoftProgram>,
    state: SoftState,
    commands: Vec<GpuCommand>,
    errors: Vec<String>,
    uniform_lookups: usize,
}

impl SoftwareGpu {
    /// Software GPU reporting a 4.6 context
    pub fn new() -> Self {
        Self::with_capabilities(GpuCapabilities {
            vendor: "ltc".to_string(),
            renderer: "software".to_string(),
            version: (4, 6),
            max_texture_size: 16384,
            max_color_attachments: 8,
            max_anisotropy: 16.0,
            uniform_attachment_sizes: false,
        })
    }

    /// Software GPU reporting the given capabilities
    pub fn with_capabilities(capabilities: GpuCapabilities) -> Self {
        Self {
            capabilities,
            texture_names: NameAllocator::new(),
            framebuffer_names: NameAllocator::new(),
            buffer_names: NameAllocator::new(),
            program_names: NameAllocator::new(),
            vertex_array_names: NameAllocator::new(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            buffers: FxHashMap::default(),
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            state: SoftState::default(),
            commands: Vec::new(),
            errors: Vec::new(),
            uniform_lookups: 0,
        }
    }

    // ===== INSPECTION =====

    /// Every command received so far
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw calls in submission order
    pub fn draw_calls(&self) -> Vec<&DrawCall> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::Draw(draw) => Some(draw),
                _ => None,
            })
            .collect()
    }

    /// Call errors a driver would have raised (GL_INVALID_*), oldest first
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Number of uniform name lookups performed
    pub fn uniform_lookups(&self) -> usize {
        self.uniform_lookups
    }

    pub fn live_textures(&self) -> u32 {
        self.texture_names.len()
    }

    pub fn live_framebuffers(&self) -> u32 {
        self.framebuffer_names.len()
    }

    pub fn live_buffers(&self) -> u32 {
        self.buffer_names.len()
    }

    /// Shader and program objects still alive
    pub fn live_programs(&self) -> u32 {
        self.program_names.len()
    }

    pub fn current_framebuffer(&self) -> Option<FramebufferName> {
        self.state.framebuffer
    }

    /// Last value written to a uniform of a program
    pub fn uniform_value(&self, program: ProgramName, name: &str) -> Option<UniformValue> {
        let prog = self.programs.get(&program.0)?;
        let location = prog.uniforms.iter().position(|(n, _)| n == name)? as u32;
        prog.values.get(&location).copied()
    }

    /// Binding point assigned to a uniform block of a program
    pub fn block_binding(&self, program: ProgramName, block: &str) -> Option<u32> {
        let prog = self.programs.get(&program.0)?;
        let index = prog.blocks.iter().position(|b| b == block)? as u32;
        prog.block_bindings.get(&index).copied()
    }

    /// Parameters written to a texture, in call order
    pub fn texture_parameters(&self, texture: TextureName) -> Vec<TextureParameter> {
        self.textures
            .get(&texture.0)
            .map(|t| t.parameters.clone())
            .unwrap_or_default()
    }

    /// Buffer currently bound to an indexed binding point
    pub fn buffer_binding(&self, kind: BufferKind, index: u32) -> Option<BufferName> {
        self.state.buffer_bindings.get(&(kind, index)).copied()
    }

    // ===== INTERNAL HELPERS =====

    fn fail(&mut self, message: String) -> Error {
        self.errors.push(message.clone());
        Error::BackendError(message)
    }

    fn record_error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn write_region(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
        compressed: bool,
    ) -> Result<()> {
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            return Err(self.fail(format!("sub-image upload to unknown texture {}", texture.0)));
        };
        let Some(stored) = tex.format else {
            return Err(self.fail(format!("texture {} has no storage", texture.0)));
        };
        if stored.is_compressed() != compressed || format.is_compressed() != compressed {
            return Err(self.fail(format!(
                "{} upload into {:?} texture {}",
                if compressed { "compressed" } else { "linear" },
                stored,
                texture.0
            )));
        }
        if stored.block_info() != format.block_info() {
            return Err(self.fail(format!(
                "upload format {:?} does not match storage {:?}",
                format, stored
            )));
        }
        let Some(img) = tex.images.get_mut(&(image.face(), level)) else {
            return Err(self.fail(format!(
                "level {} of texture {} is not allocated",
                level, texture.0
            )));
        };

        let [ox, oy, oz] = region.offset;
        let r = region.extent;
        let e = img.extent;
        if ox + r.width > e.width || oy + r.height > e.height || oz + r.depth > e.depth {
            return Err(self.fail(format!(
                "region {:?} exceeds level extent {:?}",
                region, e
            )));
        }
        let block = stored.block_info();
        if ox % block.width != 0 || oy % block.height != 0 {
            return Err(self.fail(format!("region offset {:?} is not block aligned", region.offset)));
        }
        let expected = format.level_size(r);
        if data.len() != expected {
            return Err(self.fail(format!(
                "sub-image data is {} bytes, region needs {}",
                data.len(),
                expected
            )));
        }

        let dst_row = stored.row_pitch(e.width);
        let dst_slice = stored.slice_size(e.width, e.height);
        let src_row = format.row_pitch(r.width);
        let src_slice = format.slice_size(r.width, r.height);
        let rows = format.block_rows(r.height);
        let x_bytes = (ox / block.width) as usize * block.bytes as usize;
        let y_rows = (oy / block.height) as usize;
        for z in 0..r.depth as usize {
            for row in 0..rows {
                let dst = (oz as usize + z) * dst_slice + (y_rows + row) * dst_row + x_bytes;
                let src = z * src_slice + row * src_row;
                img.data[dst..dst + src_row].copy_from_slice(&data[src..src + src_row]);
            }
        }

        self.commands.push(GpuCommand::TextureSubImage {
            texture,
            image,
            level,
            region,
            compressed,
        });
        Ok(())
    }

    /// Size of the image an attachment points at, or `None` when it is unusable
    fn attachment_extent(&self, attachment: &SoftAttachment) -> Option<Extent3d> {
        let tex = self.textures.get(&attachment.texture.0)?;
        let format = tex.format?;
        let point_ok = match attachment.point {
            AttachmentPoint::Color(_) => !format.is_depth() && !format.is_compressed(),
            AttachmentPoint::Depth => format.is_depth(),
            AttachmentPoint::Stencil | AttachmentPoint::DepthStencil => format.has_stencil(),
        };
        if !point_ok {
            return None;
        }
        let (face, layer) = match (tex.target, attachment.layer) {
            (TextureTarget::Cube, Some(layer)) => (layer, None),
            (_, layer) => (attachment.face, layer),
        };
        let image = tex.images.get(&(face, attachment.level))?;
        if let Some(layer) = layer {
            if layer >= image.extent.depth {
                return None;
            }
        }
        Some(image.extent)
    }

    fn attach(&mut self, framebuffer: FramebufferName, attachment: SoftAttachment) {
        if let AttachmentPoint::Color(index) = attachment.point {
            if index >= self.capabilities.max_color_attachments {
                self.record_error(format!("color attachment {} exceeds the limit", index));
                return;
            }
        }
        if !self.textures.contains_key(&attachment.texture.0) {
            self.record_error(format!("attaching unknown texture {}", attachment.texture.0));
            return;
        }
        let Some(fb) = self.framebuffers.get_mut(&framebuffer.0) else {
            self.record_error(format!("attaching to unknown framebuffer {}", framebuffer.0));
            return;
        };
        fb.attachments.retain(|a| a.point != attachment.point);
        fb.attachments.push(attachment);
    }

    fn record_draw(&mut self, topology: PrimitiveTopology, count: u32, indexed: bool) {
        let Some(program) = self.state.program else {
            self.record_error("draw without a program in use".to_string());
            return;
        };
        let mut textures: Vec<(u32, TextureName)> =
            self.state.texture_units.iter().map(|(u, t)| (*u, *t)).collect();
        textures.sort();
        self.commands.push(GpuCommand::Draw(DrawCall {
            framebuffer: self.state.framebuffer,
            program,
            vertex_array: self.state.vertex_array,
            topology,
            count,
            indexed,
            viewport: self.state.viewport,
            color_write: self.state.color_write,
            depth: self.state.depth,
            blend: self.state.blend,
            cull_face: self.state.cull_face,
            textures,
        }));
    }
}

impl Default for SoftwareGpu {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Shader source scanning
// ============================================================================

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Collect `uniform` declarations: (name, type) pairs and block names
fn scan_uniforms(source: &str) -> (Vec<(String, String)>, Vec<String>) {
    let mut uniforms = Vec::new();
    let mut blocks = Vec::new();
    for raw in source.lines() {
        let line = raw.trim();
        if line.starts_with("//") {
            continue;
        }
        let rest = if let Some(rest) = line.strip_prefix("uniform ") {
            rest
        } else if let Some(pos) = line.find(") uniform ") {
            if !line.starts_with("layout") {
                continue;
            }
            &line[pos + ") uniform ".len()..]
        } else {
            continue;
        };

        let is_block = rest.contains('{') || !rest.contains(';');
        if is_block {
            let name = rest
                .split(|c: char| c == '{' || c.is_whitespace())
                .find(|s| !s.is_empty());
            if let Some(name) = name {
                blocks.push(name.to_string());
            }
            continue;
        }

        let decl = rest.split(';').next().unwrap_or("");
        let mut tokens = decl
            .split_whitespace()
            .filter(|t| !PRECISION_QUALIFIERS.contains(t));
        let Some(ty) = tokens.next() else { continue };
        let names: String = tokens.collect::<Vec<_>>().join(" ");
        for name in names.split(',') {
            let name = name.split('=').next().unwrap_or("").trim();
            let name = name.split('[').next().unwrap_or("").trim();
            if !name.is_empty() {
                uniforms.push((name.to_string(), ty.to_string()));
            }
        }
    }
    (uniforms, blocks)
}

fn uniform_type_accepts(declared: &str, value: &UniformValue) -> bool {
    if declared == value.type_name() {
        return true;
    }
    let opaque = declared.starts_with("sampler")
        || declared.starts_with("isampler")
        || declared.starts_with("usampler")
        || declared.starts_with("image");
    matches!(value, UniformValue::Int(_)) && (opaque || declared == "bool")
}

// ============================================================================
// Mip generation
// ============================================================================

enum Component {
    U8,
    F32,
    Nearest,
}

fn component_kind(format: PixelFormat) -> Component {
    match format {
        PixelFormat::R8Unorm
        | PixelFormat::Rg8Unorm
        | PixelFormat::Rgb8Unorm
        | PixelFormat::Rgba8Unorm
        | PixelFormat::Rgba8Srgb
        | PixelFormat::Bgra8Unorm => Component::U8,
        PixelFormat::R32Float
        | PixelFormat::Rg32Float
        | PixelFormat::Rgb32Float
        | PixelFormat::Rgba32Float => Component::F32,
        _ => Component::Nearest,
    }
}

fn texel(image: &SoftImage, bytes: usize, x: u32, y: u32, z: u32) -> &[u8] {
    let e = image.extent;
    let offset = ((z * e.height + y) * e.width + x) as usize * bytes;
    &image.data[offset..offset + bytes]
}

/// Box-filter `src` down to `dst_extent`
fn downsample(format: PixelFormat, src: &SoftImage, dst_extent: Extent3d, volume: bool) -> Vec<u8> {
    let bytes = format.block_info().bytes as usize;
    let s = src.extent;
    let kind = component_kind(format);
    let mut out = Vec::with_capacity(format.level_size(dst_extent));
    for z in 0..dst_extent.depth {
        let zs = if volume { [(2 * z).min(s.depth - 1), (2 * z + 1).min(s.depth - 1)] } else { [z, z] };
        for y in 0..dst_extent.height {
            let ys = [(2 * y).min(s.height - 1), (2 * y + 1).min(s.height - 1)];
            for x in 0..dst_extent.width {
                let xs = [(2 * x).min(s.width - 1), (2 * x + 1).min(s.width - 1)];
                let mut samples = Vec::with_capacity(8);
                for zz in zs {
                    for yy in ys {
                        for xx in xs {
                            samples.push(texel(src, bytes, xx, yy, zz));
                        }
                    }
                }
                match kind {
                    Component::U8 => {
                        for c in 0..bytes {
                            let sum: u32 = samples.iter().map(|t| t[c] as u32).sum();
                            out.push(((sum + samples.len() as u32 / 2) / samples.len() as u32) as u8);
                        }
                    }
                    Component::F32 => {
                        for c in 0..bytes / 4 {
                            let sum: f32 = samples
                                .iter()
                                .map(|t| f32::from_le_bytes([t[c * 4], t[c * 4 + 1], t[c * 4 + 2], t[c * 4 + 3]]))
                                .sum();
                            out.extend_from_slice(&(sum / samples.len() as f32).to_le_bytes());
                        }
                    }
                    Component::Nearest => out.extend_from_slice(samples[0]),
                }
            }
        }
    }
    out
}

// ============================================================================
// GpuApi implementation
// ============================================================================

impl GpuApi for SoftwareGpu {
    fn capabilities(&self) -> &GpuCapabilities {
        &self.capabilities
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, target: TextureTarget) -> Result<TextureName> {
        let texture = TextureName(self.texture_names.alloc());
        self.textures.insert(texture.0, SoftTexture {
            target,
            format: None,
            immutable: false,
            levels: 0,
            images: FxHashMap::default(),
            parameters: Vec::new(),
        });
        self.commands.push(GpuCommand::CreateTexture { texture, target });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureName) {
        if self.textures.remove(&texture.0).is_some() {
            self.texture_names.free(texture.0);
            self.state.texture_units.retain(|_, t| *t != texture);
            self.commands.push(GpuCommand::DeleteTexture(texture));
        } else {
            self.record_error(format!("deleting unknown texture {}", texture.0));
        }
    }

    fn texture_storage(
        &mut self,
        texture: TextureName,
        target: TextureTarget,
        levels: u32,
        format: PixelFormat,
        extent: Extent3d,
    ) -> Result<()> {
        let max_size = self.capabilities.max_texture_size;
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            return Err(self.fail(format!("storage for unknown texture {}", texture.0)));
        };
        if tex.immutable {
            return Err(self.fail(format!("texture {} storage is already immutable", texture.0)));
        }
        if tex.target != target {
            let message = format!(
                "texture {} is {:?}, storage requested as {:?}",
                texture.0, tex.target, target
            );
            return Err(self.fail(message));
        }
        if extent.width == 0 || extent.height == 0 || extent.depth == 0 {
            return Err(self.fail(format!("zero-sized storage {:?}", extent)));
        }
        if extent.width > max_size || extent.height > max_size {
            return Err(self.fail(format!("extent {:?} exceeds max texture size {}", extent, max_size)));
        }
        if target.is_cube() && extent.width != extent.height {
            return Err(self.fail(format!("cube map faces must be square, got {:?}", extent)));
        }
        if levels == 0 || levels > target.max_levels(extent) {
            return Err(self.fail(format!(
                "{} levels requested, {:?} allows {}",
                levels,
                extent,
                target.max_levels(extent)
            )));
        }

        for face in 0..target.face_count() {
            for level in 0..levels {
                let level_extent = target.level_extent(extent, level);
                tex.images.insert((face, level), SoftImage {
                    extent: level_extent,
                    data: vec![0; format.level_size(level_extent)],
                });
            }
        }
        tex.format = Some(format);
        tex.immutable = true;
        tex.levels = levels;
        self.commands.push(GpuCommand::TextureStorage { texture, levels, format, extent });
        Ok(())
    }

    fn texture_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
        extent: Extent3d,
        data: Option<&[u8]>,
    ) -> Result<()> {
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            return Err(self.fail(format!("image for unknown texture {}", texture.0)));
        };
        if tex.immutable {
            return Err(self.fail(format!("texture {} storage is immutable", texture.0)));
        }
        if image.texture_target() != tex.target {
            let message = format!(
                "texture {} is {:?}, image targets {:?}",
                texture.0, tex.target, image
            );
            return Err(self.fail(message));
        }
        let size = format.level_size(extent);
        let bytes = match data {
            Some(data) if data.len() != size => {
                return Err(self.fail(format!(
                    "image data is {} bytes, level needs {}",
                    data.len(),
                    size
                )));
            }
            Some(data) => data.to_vec(),
            None => vec![0; size],
        };
        tex.images.insert((image.face(), level), SoftImage { extent, data: bytes });
        tex.format = Some(format);
        tex.levels = tex.levels.max(level + 1);
        self.commands.push(GpuCommand::TextureImage {
            texture,
            image,
            level,
            format,
            extent,
            with_data: data.is_some(),
        });
        Ok(())
    }

    fn texture_sub_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()> {
        self.write_region(texture, image, level, region, format, data, false)
    }

    fn compressed_texture_sub_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        region: Region,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()> {
        self.write_region(texture, image, level, region, format, data, true)
    }

    fn texture_parameter(&mut self, texture: TextureName, target: TextureTarget, parameter: TextureParameter) {
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            self.record_error(format!("parameter on unknown texture {}", texture.0));
            return;
        };
        if tex.target != target {
            self.record_error(format!("parameter target {:?} does not match texture {}", target, texture.0));
            return;
        }
        tex.parameters.push(parameter);
        self.commands.push(GpuCommand::TextureParameter { texture, parameter });
    }

    fn generate_mipmap(&mut self, texture: TextureName, target: TextureTarget) -> Result<()> {
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            return Err(self.fail(format!("mipmaps for unknown texture {}", texture.0)));
        };
        let Some(format) = tex.format else {
            return Err(self.fail(format!("texture {} has no storage", texture.0)));
        };
        if tex.target != target {
            return Err(self.fail(format!("mipmap target {:?} does not match texture {}", target, texture.0)));
        }
        if format.is_compressed() {
            return Err(self.fail(format!("cannot generate mipmaps for {:?}", format)));
        }
        let volume = tex.target == TextureTarget::D3;
        for face in 0..tex.target.face_count() {
            for level in 1..tex.levels {
                let (Some(src), Some(dst)) = (tex.images.get(&(face, level - 1)), tex.images.get(&(face, level))) else {
                    continue;
                };
                let data = downsample(format, src, dst.extent, volume);
                if let Some(dst) = tex.images.get_mut(&(face, level)) {
                    dst.data = data;
                }
            }
        }
        self.commands.push(GpuCommand::GenerateMipmap(texture));
        Ok(())
    }

    fn read_texture_image(
        &mut self,
        texture: TextureName,
        image: ImageTarget,
        level: u32,
        format: PixelFormat,
    ) -> Result<Vec<u8>> {
        let outcome = match self.textures.get(&texture.0) {
            None => Err(format!("reading unknown texture {}", texture.0)),
            Some(tex) => match (tex.format, tex.images.get(&(image.face(), level))) {
                (Some(stored), Some(img)) if stored.block_info() == format.block_info() => {
                    Ok(img.data.clone())
                }
                (Some(stored), Some(_)) => Err(format!(
                    "read format {:?} does not match storage {:?}",
                    format, stored
                )),
                _ => Err(format!("level {} of texture {} is not allocated", level, texture.0)),
            },
        };
        outcome.map_err(|message| self.fail(message))
    }

    fn bind_texture_unit(&mut self, unit: u32, _target: TextureTarget, texture: Option<TextureName>) {
        match texture {
            Some(t) => {
                self.state.texture_units.insert(unit, t);
            }
            None => {
                self.state.texture_units.remove(&unit);
            }
        }
        self.commands.push(GpuCommand::BindTextureUnit { unit, texture });
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferName> {
        let framebuffer = FramebufferName(self.framebuffer_names.alloc());
        self.framebuffers.insert(framebuffer.0, SoftFramebuffer::default());
        self.commands.push(GpuCommand::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferName) {
        if self.framebuffers.remove(&framebuffer.0).is_some() {
            self.framebuffer_names.free(framebuffer.0);
            if self.state.framebuffer == Some(framebuffer) {
                self.state.framebuffer = None;
            }
            self.commands.push(GpuCommand::DeleteFramebuffer(framebuffer));
        } else {
            self.record_error(format!("deleting unknown framebuffer {}", framebuffer.0));
        }
    }

    fn framebuffer_texture(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        texture: TextureName,
        level: u32,
    ) {
        let layered = self
            .textures
            .get(&texture.0)
            .map(|t| t.target.is_layered())
            .unwrap_or(false);
        self.attach(framebuffer, SoftAttachment {
            point: attachment,
            texture,
            level,
            face: 0,
            layer: None,
            layered,
        });
        self.commands.push(GpuCommand::FramebufferTexture { framebuffer, attachment, texture, level });
    }

    fn framebuffer_texture_2d(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        image: ImageTarget,
        texture: TextureName,
        level: u32,
    ) {
        if !matches!(image, ImageTarget::CubeFace(_) | ImageTarget::Texture(TextureTarget::D2 | TextureTarget::Rectangle)) {
            self.record_error(format!("{:?} is not a 2D image target", image));
            return;
        }
        let stored = self.textures.get(&texture.0).map(|t| t.target);
        if stored.is_some_and(|target| target != image.texture_target()) {
            self.record_error(format!("{:?} does not match texture {} ({:?})", image, texture.0, stored));
            return;
        }
        self.attach(framebuffer, SoftAttachment {
            point: attachment,
            texture,
            level,
            face: image.face(),
            layer: None,
            layered: false,
        });
        self.commands.push(GpuCommand::FramebufferTexture2d { framebuffer, attachment, image, texture, level });
    }

    fn framebuffer_texture_layer(
        &mut self,
        framebuffer: FramebufferName,
        attachment: AttachmentPoint,
        texture: TextureName,
        level: u32,
        layer: u32,
    ) {
        self.attach(framebuffer, SoftAttachment {
            point: attachment,
            texture,
            level,
            face: 0,
            layer: Some(layer),
            layered: false,
        });
        self.commands.push(GpuCommand::FramebufferTextureLayer { framebuffer, attachment, texture, level, layer });
    }

    fn framebuffer_draw_buffers(&mut self, framebuffer: FramebufferName, buffers: &[AttachmentPoint]) {
        if buffers.iter().any(|b| b.is_depth_like()) {
            self.record_error(format!("draw buffers {:?} include a non-color attachment", buffers));
            return;
        }
        let Some(fb) = self.framebuffers.get_mut(&framebuffer.0) else {
            self.record_error(format!("draw buffers on unknown framebuffer {}", framebuffer.0));
            return;
        };
        fb.draw_buffers = buffers.to_vec();
        self.commands.push(GpuCommand::DrawBuffers { framebuffer, buffers: buffers.to_vec() });
    }

    fn check_framebuffer_status(&mut self, framebuffer: FramebufferName) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(&framebuffer.0) else {
            return FramebufferStatus::Undefined;
        };
        if fb.attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }
        let mut extents = Vec::with_capacity(fb.attachments.len());
        for attachment in &fb.attachments {
            match self.attachment_extent(attachment) {
                Some(extent) => extents.push(extent),
                None => return FramebufferStatus::IncompleteAttachment,
            }
        }
        if fb
            .draw_buffers
            .iter()
            .any(|b| !fb.attachments.iter().any(|a| a.point == *b))
        {
            return FramebufferStatus::IncompleteDrawBuffer;
        }
        let layered = fb.attachments[0].layered;
        if fb.attachments.iter().any(|a| a.layered != layered) {
            return FramebufferStatus::IncompleteLayerTargets;
        }
        if self.capabilities.uniform_attachment_sizes
            && extents
                .iter()
                .any(|e| e.width != extents[0].width || e.height != extents[0].height)
        {
            return FramebufferStatus::IncompleteDimensions;
        }
        FramebufferStatus::Complete
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferName>) {
        self.state.framebuffer = framebuffer;
        self.commands.push(GpuCommand::BindFramebuffer(framebuffer));
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<BufferName> {
        let buffer = BufferName(self.buffer_names.alloc());
        self.buffers.insert(buffer.0, SoftBuffer {
            data: Vec::new(),
            allocated: false,
            immutable: false,
            usage: BufferUsage::empty(),
        });
        self.commands.push(GpuCommand::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferName) {
        if self.buffers.remove(&buffer.0).is_some() {
            self.buffer_names.free(buffer.0);
            self.state.buffer_bindings.retain(|_, b| *b != buffer);
            self.commands.push(GpuCommand::DeleteBuffer(buffer));
        } else {
            self.record_error(format!("deleting unknown buffer {}", buffer.0));
        }
    }

    fn buffer_storage(
        &mut self,
        buffer: BufferName,
        _kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<()> {
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            return Err(self.fail(format!("storage for unknown buffer {}", buffer.0)));
        };
        if buf.immutable {
            return Err(self.fail(format!("buffer {} storage is already immutable", buffer.0)));
        }
        if size == 0 {
            return Err(self.fail(format!("zero-sized storage for buffer {}", buffer.0)));
        }
        if let Some(data) = data {
            if data.len() != size {
                return Err(self.fail(format!("buffer data is {} bytes, storage is {}", data.len(), size)));
            }
        }
        buf.data = data.map(|d| d.to_vec()).unwrap_or_else(|| vec![0; size]);
        buf.allocated = true;
        buf.immutable = true;
        buf.usage = usage;
        self.commands.push(GpuCommand::BufferStorage { buffer, size, usage });
        Ok(())
    }

    fn buffer_data(
        &mut self,
        buffer: BufferName,
        _kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        hint: UsageHint,
    ) -> Result<()> {
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            return Err(self.fail(format!("data for unknown buffer {}", buffer.0)));
        };
        if buf.immutable {
            return Err(self.fail(format!("buffer {} storage is immutable", buffer.0)));
        }
        if let Some(data) = data {
            if data.len() != size {
                return Err(self.fail(format!("buffer data is {} bytes, store is {}", data.len(), size)));
            }
        }
        buf.data = data.map(|d| d.to_vec()).unwrap_or_else(|| vec![0; size]);
        buf.allocated = true;
        self.commands.push(GpuCommand::BufferData { buffer, size, hint });
        Ok(())
    }

    fn buffer_sub_data(&mut self, buffer: BufferName, _kind: BufferKind, offset: usize, data: &[u8]) -> Result<()> {
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            return Err(self.fail(format!("update of unknown buffer {}", buffer.0)));
        };
        if !buf.allocated {
            return Err(self.fail(format!("buffer {} has no data store", buffer.0)));
        }
        if buf.immutable && !buf.usage.contains(BufferUsage::DYNAMIC_STORAGE) {
            return Err(self.fail(format!(
                "buffer {} was created without DYNAMIC_STORAGE",
                buffer.0
            )));
        }
        if offset + data.len() > buf.data.len() {
            let message = format!(
                "update of {} bytes at {} overflows buffer of {}",
                data.len(),
                offset,
                buf.data.len()
            );
            return Err(self.fail(message));
        }
        buf.data[offset..offset + data.len()].copy_from_slice(data);
        self.commands.push(GpuCommand::BufferSubData { buffer, offset, size: data.len() });
        Ok(())
    }

    fn read_buffer(&mut self, buffer: BufferName, _kind: BufferKind, offset: usize, len: usize) -> Result<Vec<u8>> {
        let Some(buf) = self.buffers.get(&buffer.0) else {
            return Err(self.fail(format!("reading unknown buffer {}", buffer.0)));
        };
        if offset + len > buf.data.len() {
            return Err(self.fail(format!("read of {} bytes at {} overflows buffer", len, offset)));
        }
        Ok(buf.data[offset..offset + len].to_vec())
    }

    fn bind_buffer_base(&mut self, kind: BufferKind, index: u32, buffer: Option<BufferName>) {
        match buffer {
            Some(b) => {
                self.state.buffer_bindings.insert((kind, index), b);
            }
            None => {
                self.state.buffer_bindings.remove(&(kind, index));
            }
        }
        self.commands.push(GpuCommand::BindBufferBase { kind, index, buffer });
    }

    // ===== SHADERS & PROGRAMS =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderName> {
        if !source.contains("void main") {
            let log = format!("0:0: error: {} stage has no entry point 'main'", stage.section_name());
            self.errors.push(log.clone());
            return Err(Error::ShaderCompilationFailed(log));
        }
        let (uniforms, blocks) = scan_uniforms(source);
        let shader = ShaderName(self.program_names.alloc());
        self.shaders.insert(shader.0, SoftShader { stage, uniforms, blocks });
        self.commands.push(GpuCommand::CompileShader { shader, stage });
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderName) {
        if self.shaders.remove(&shader.0).is_some() {
            self.program_names.free(shader.0);
        }
    }

    fn create_program(&mut self) -> Result<ProgramName> {
        let program = ProgramName(self.program_names.alloc());
        self.programs.insert(program.0, SoftProgram::default());
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramName) {
        if self.programs.remove(&program.0).is_some() {
            self.program_names.free(program.0);
            if self.state.program == Some(program) {
                self.state.program = None;
            }
            self.commands.push(GpuCommand::DeleteProgram(program));
        }
    }

    fn attach_shader(&mut self, program: ProgramName, shader: ShaderName) {
        if !self.shaders.contains_key(&shader.0) {
            self.record_error(format!("attaching unknown shader {}", shader.0));
            return;
        }
        match self.programs.get_mut(&program.0) {
            Some(prog) => prog.shaders.push(shader),
            None => self.record_error(format!("attaching to unknown program {}", program.0)),
        }
    }

    fn link_program(&mut self, program: ProgramName) -> Result<()> {
        let Some(prog) = self.programs.get(&program.0) else {
            return Err(self.fail(format!("linking unknown program {}", program.0)));
        };
        let stages: Vec<&SoftShader> = prog.shaders.iter().filter_map(|s| self.shaders.get(&s.0)).collect();
        let has = |stage| stages.iter().any(|s| s.stage == stage);
        if !has(ShaderStage::Compute) && !(has(ShaderStage::Vertex) && has(ShaderStage::Fragment)) {
            let log = "error: program needs a vertex and a fragment stage".to_string();
            self.errors.push(log.clone());
            return Err(Error::ProgramLinkFailed(log));
        }

        let mut uniforms: Vec<(String, String)> = Vec::new();
        let mut conflict = None;
        for (name, ty) in stages.iter().flat_map(|s| s.uniforms.iter()) {
            match uniforms.iter().find(|(n, _)| n == name) {
                Some((_, existing)) if existing != ty => conflict = Some(name.clone()),
                Some(_) => {}
                None => uniforms.push((name.clone(), ty.clone())),
            }
        }
        if let Some(name) = conflict {
            let log = format!("error: uniform '{}' declared with different types", name);
            self.errors.push(log.clone());
            return Err(Error::ProgramLinkFailed(log));
        }
        uniforms.sort();
        let mut blocks: Vec<String> = stages.iter().flat_map(|s| s.blocks.iter().cloned()).collect();
        blocks.sort();
        blocks.dedup();

        if let Some(prog) = self.programs.get_mut(&program.0) {
            prog.uniforms = uniforms;
            prog.blocks = blocks;
            prog.linked = true;
            prog.values.clear();
            prog.block_bindings.clear();
        }
        self.commands.push(GpuCommand::LinkProgram(program));
        Ok(())
    }

    fn use_program(&mut self, program: Option<ProgramName>) {
        if let Some(p) = program {
            if !self.programs.get(&p.0).map(|prog| prog.linked).unwrap_or(false) {
                self.record_error(format!("using unlinked program {}", p.0));
                return;
            }
        }
        self.state.program = program;
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramName, name: &str) -> Option<UniformLocation> {
        self.uniform_lookups += 1;
        let prog = self.programs.get(&program.0)?;
        if !prog.linked {
            return None;
        }
        let base = name.strip_suffix("[0]").unwrap_or(name);
        prog.uniforms
            .iter()
            .position(|(n, _)| n == base)
            .map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.state.program else {
            self.record_error("uniform set without a program in use".to_string());
            return;
        };
        let Some(prog) = self.programs.get_mut(&program.0) else {
            return;
        };
        let Some((name, ty)) = prog.uniforms.get(location.0 as usize) else {
            self.record_error(format!("uniform location {} is not active", location.0));
            return;
        };
        if !uniform_type_accepts(ty, &value) {
            let message = format!("uniform '{}' is {}, got {}", name, ty, value.type_name());
            self.record_error(message);
            return;
        }
        prog.values.insert(location.0, value);
        self.commands.push(GpuCommand::SetUniform { program, location, value });
    }

    fn uniform_block_index(&mut self, program: ProgramName, name: &str) -> Option<u32> {
        let prog = self.programs.get(&program.0)?;
        prog.blocks.iter().position(|b| b == name).map(|i| i as u32)
    }

    fn uniform_block_binding(&mut self, program: ProgramName, block_index: u32, binding: u32) {
        let Some(prog) = self.programs.get_mut(&program.0) else {
            self.record_error(format!("block binding on unknown program {}", program.0));
            return;
        };
        if block_index as usize >= prog.blocks.len() {
            self.record_error(format!("block index {} is not active", block_index));
            return;
        }
        prog.block_bindings.insert(block_index, binding);
        self.commands.push(GpuCommand::UniformBlockBinding { program, block_index, binding });
    }

    // ===== STATE & DRAWS =====

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
        self.commands.push(GpuCommand::Viewport(viewport));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.state.color_write = enabled;
        self.commands.push(GpuCommand::ColorWrite(enabled));
    }

    fn set_depth_state(&mut self, state: DepthState) {
        self.state.depth = state;
        self.commands.push(GpuCommand::DepthState(state));
    }

    fn set_blend(&mut self, blend: Option<BlendState>) {
        self.state.blend = blend;
        self.commands.push(GpuCommand::Blend(blend));
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.state.cull_face = enabled;
        self.commands.push(GpuCommand::CullFace(enabled));
    }

    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        self.commands.push(GpuCommand::Clear {
            framebuffer: self.state.framebuffer,
            color,
            depth,
        });
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayName> {
        Ok(VertexArrayName(self.vertex_array_names.alloc()))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayName) {
        self.vertex_array_names.free(vertex_array.0);
        if self.state.vertex_array == Some(vertex_array) {
            self.state.vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayName>) {
        self.state.vertex_array = vertex_array;
        self.commands.push(GpuCommand::BindVertexArray(vertex_array));
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, _first: u32, count: u32) {
        self.record_draw(topology, count, false);
    }

    fn draw_elements(&mut self, topology: PrimitiveTopology, count: u32, _index_type: IndexType, _offset: usize) {
        self.record_draw(topology, count, true);
    }
}

#[cfg(test)]
#[path = "software_tests.rs"]
mod tests;
