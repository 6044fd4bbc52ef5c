/// Progressive LTC frame orchestrator
///
/// Every frame runs Jitter -> DepthPrepass -> ColorAccumulate once per
/// sample, then a single Resolve, into a floating-point accumulation target. Light passes blend additively
/// on top of the depth laid down by the pre-pass, and the resolve pass
/// divides the running sum by the number of accumulated samples.

use std::rc::Rc;

use glam::{Mat4, Vec2};
use rustc_hash::FxHashSet;

use crate::buffer::{BufferDesc, BufferHandle};
use crate::camera::Camera;
use crate::device::Device;
use crate::error::Result;
use crate::format::PixelFormat;
use crate::framebuffer::{FramebufferDesc, FramebufferHandle};
use crate::gpu::{
    AttachmentPoint, BlendState, CompareOp, DepthState, PrimitiveTopology, ShaderStage, Viewport,
    VertexArrayName,
};
use crate::program::{Program, ShaderLibrary};
use crate::texture::{SamplerDesc, TextureDesc, TextureHandle};
use super::frame_state::{FrameReport, FrameStage, FrameState};
use super::halton::{gaussian_jitter, jitter_projection};
use super::scene::{Geometry, LightBlock, Scene, SceneSnapshot};
use super::surface::PresentSurface;

const SOURCE: &str = "ltc::RenderPipeline";

const LTC_MATRIX_UNIT: u32 = 0;
const LTC_MAGNITUDE_UNIT: u32 = 1;
const LIGHT_TEXTURE_UNIT: u32 = 2;
const ACCUMULATION_UNIT: u32 = 0;

// ============================================================================
// Configuration
// ============================================================================

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Jittered sub-passes rendered per frame, each adding one sample
    pub samples_per_frame: u32,
    /// Keep accumulating across frames; when off every frame starts over
    pub accumulate: bool,
    /// Sub-pixel projection jitter
    pub jitter: bool,
    /// Jitter standard deviation in pixels
    pub jitter_sigma: f32,
    /// Accumulation clear color on reset frames
    pub clear_color: [f32; 4],
    /// Uniform-buffer binding point of the light block
    pub light_block_binding: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            samples_per_frame: 1,
            accumulate: true,
            jitter: true,
            jitter_sigma: 0.5,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            light_block_binding: 0,
        }
    }
}

/// Shader tags (`Effect.Section`) of the four pipeline programs
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineShaders {
    pub depth: (String, String),
    pub ltc: (String, String),
    pub flat: (String, String),
    pub resolve: (String, String),
}

impl Default for PipelineShaders {
    fn default() -> Self {
        let pair = |effect: &str| (format!("{}.Vertex", effect), format!("{}.Fragment", effect));
        Self {
            depth: pair("Depth"),
            ltc: pair("LTC"),
            flat: pair("Flat"),
            resolve: pair("Resolve"),
        }
    }
}

/// Everything needed to build a pipeline
pub struct PipelineDesc<'a> {
    pub config: PipelineConfig,
    pub shaders: PipelineShaders,
    pub library: &'a ShaderLibrary,
    /// Inverse LTC matrix table
    pub ltc_matrix: TextureHandle,
    /// LTC magnitude/Fresnel table
    pub ltc_magnitude: TextureHandle,
}

// ============================================================================
// Pipeline
// ============================================================================

struct AccumulationTargets {
    color: TextureHandle,
    framebuffer: FramebufferHandle,
}

/// Camera and viewport captured by `update` for the next `render`
#[derive(Clone, Copy)]
struct FrameInputs {
    camera: Camera,
    viewport: Viewport,
}

/// Matrices and flags of one jittered sub-pass
#[derive(Clone, Copy)]
struct SamplePass {
    projection: Mat4,
    view: Mat4,
    /// Index into the jitter sequence
    index: u32,
    /// First sub-pass of a reset frame
    clear_color: bool,
}

pub struct RenderPipeline {
    device: Rc<Device>,
    config: PipelineConfig,
    depth_program: Program,
    ltc_program: Program,
    flat_program: Program,
    resolve_program: Program,
    ltc_matrix: TextureHandle,
    ltc_magnitude: TextureHandle,
    light_buffer: BufferHandle,
    fullscreen_vao: VertexArrayName,
    targets: Option<AccumulationTargets>,
    state: FrameState,
    stage: FrameStage,
    inputs: Option<FrameInputs>,
    last_scene: Option<SceneSnapshot>,
    pending_reset: bool,
    warned_untextured: FxHashSet<usize>,
}

fn build_program(device: &Device, label: &str, tags: &(String, String), library: &ShaderLibrary) -> Result<Program> {
    let mut program = device.create_program(label)?;
    program.add_stage(ShaderStage::Vertex, &tags.0, library)?;
    program.add_stage(ShaderStage::Fragment, &tags.1, library)?;
    program.link()?;
    Ok(program)
}

impl RenderPipeline {
    /// Compile the programs and create the per-light uniform buffer.
    ///
    /// Accumulation targets are created by the first `update`, once the
    /// viewport size is known.
    pub fn new(device: Rc<Device>, desc: PipelineDesc<'_>) -> Result<Self> {
        if desc.config.samples_per_frame == 0 {
            crate::ltc_bail!(SOURCE, InvalidResource, "samples_per_frame must be at least 1");
        }

        let depth_program = build_program(&device, "depth", &desc.shaders.depth, desc.library)?;
        let ltc_program = build_program(&device, "ltc", &desc.shaders.ltc, desc.library)?;
        let flat_program = build_program(&device, "flat", &desc.shaders.flat, desc.library)?;
        let resolve_program = build_program(&device, "resolve", &desc.shaders.resolve, desc.library)?;

        let light_buffer = device.create_buffer(&BufferDesc::dynamic_uniform("LightBlock", LightBlock::SIZE))?;
        let fullscreen_vao = device.create_vertex_array()?;

        {
            let mut gpu = device.gpu().borrow_mut();
            gpu.set_depth_state(DepthState { test: Some(CompareOp::LessOrEqual), write: true });
            gpu.set_cull_face(true);
        }

        crate::ltc_info!(
            SOURCE,
            "Pipeline ready ({:?} profile, {} samples/frame, accumulate {}, jitter {})",
            device.profile(),
            desc.config.samples_per_frame,
            desc.config.accumulate,
            desc.config.jitter
        );

        Ok(Self {
            state: FrameState::new(desc.config.jitter_sigma),
            device,
            config: desc.config,
            depth_program,
            ltc_program,
            flat_program,
            resolve_program,
            ltc_matrix: desc.ltc_matrix,
            ltc_magnitude: desc.ltc_magnitude,
            light_buffer,
            fullscreen_vao,
            targets: None,
            stage: FrameStage::Idle,
            inputs: None,
            last_scene: None,
            pending_reset: false,
            warned_untextured: FxHashSet::default(),
        })
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.state
    }

    /// Stage currently executing (Idle between frames)
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Accumulated color target, once created
    pub fn accumulation_texture(&self) -> Option<&TextureHandle> {
        self.targets.as_ref().map(|t| &t.color)
    }

    pub fn light_buffer(&self) -> &BufferHandle {
        &self.light_buffer
    }

    /// Discard accumulated samples at the next `update`
    pub fn force_reset(&mut self) {
        self.pending_reset = true;
    }

    // ===== UPDATE =====

    /// Compute the dirty flag and advance the sample count.
    ///
    /// The frame is dirty when the camera, the viewport or anything in the
    /// scene snapshot differs from the previous update.
    pub fn update(&mut self, camera: &Camera, scene: &Scene, viewport: Viewport) {
        let snapshot = scene.snapshot();
        let mut dirty = self.pending_reset
            || self.inputs.map(|i| i.camera != *camera || i.viewport != viewport).unwrap_or(true)
            || self.last_scene.as_ref() != Some(&snapshot);

        let size_changed = self
            .targets
            .as_ref()
            .map(|t| (t.framebuffer.width(), t.framebuffer.height()) != (viewport.width, viewport.height))
            .unwrap_or(true);
        if size_changed {
            self.targets = self.create_targets(viewport.width, viewport.height);
            dirty = true;
        }

        self.state.advance(dirty, self.config.accumulate, self.config.samples_per_frame);
        self.pending_reset = false;
        self.inputs = Some(FrameInputs { camera: *camera, viewport });
        self.last_scene = Some(snapshot);

        if dirty {
            crate::ltc_trace!(SOURCE, "Accumulation reset");
        }
    }

    fn create_targets(&self, width: u32, height: u32) -> Option<AccumulationTargets> {
        let build = || -> Result<AccumulationTargets> {
            let color = self.device.create_texture(&TextureDesc {
                sampler: SamplerDesc::clamped_linear(),
                ..TextureDesc::d2("accumulation color", width, height, PixelFormat::Rgba32Float)
            })?;
            let depth = self.device.create_texture(&TextureDesc {
                sampler: SamplerDesc::clamped_linear(),
                ..TextureDesc::d2("accumulation depth", width, height, PixelFormat::Depth32Float)
            })?;
            let framebuffer = self.device.create_framebuffer(
                &FramebufferDesc::new("accumulation")
                    .add_attachment(AttachmentPoint::Color(0), color.clone())
                    .add_attachment(AttachmentPoint::Depth, depth),
            )?;
            Ok(AccumulationTargets { color, framebuffer })
        };
        match build() {
            Ok(targets) => {
                crate::ltc_debug!(SOURCE, "Accumulation targets {}x{}", width, height);
                Some(targets)
            }
            Err(e) => {
                crate::ltc_warn!(SOURCE, "Accumulation targets {}x{} unavailable, frame skipped: {}", width, height, e);
                None
            }
        }
    }

    // ===== RENDER =====

    /// Render one frame with the inputs of the last `update` and present it.
    ///
    /// Each of the `samples_per_frame` sub-passes draws with its own jitter
    /// index, so the accumulation buffer gains exactly that many samples.
    pub fn render(&mut self, scene: &Scene, surface: &mut dyn PresentSurface) -> Result<FrameReport> {
        let Some(inputs) = self.inputs else {
            crate::ltc_bail!(SOURCE, InvalidResource, "render called before the first update");
        };

        let mut report = FrameReport {
            reset: self.state.reset,
            sample_count: self.state.sample_count,
            ..Default::default()
        };

        let targets = self.targets.as_ref().map(|t| (t.framebuffer.clone(), t.color.clone()));
        let view = *inputs.camera.view_matrix();

        for sub_pass in 0..self.config.samples_per_frame {
            let sample_index = self.state.sample_count.saturating_add(sub_pass);

            // Jitter
            self.enter(&mut report, FrameStage::Jitter, sample_index);
            let (projection, offset) = self.jittered_projection(&inputs, sample_index);
            if sub_pass == 0 {
                report.jitter = offset;
            }

            let Some((framebuffer, _)) = targets.as_ref() else {
                report.skipped = true;
                self.stage = FrameStage::Idle;
                return Ok(report);
            };

            let pass = SamplePass {
                projection,
                view,
                index: sample_index,
                clear_color: sub_pass == 0 && self.state.reset,
            };
            framebuffer.bind();
            self.depth_prepass(scene, &inputs, pass, &mut report);
            self.color_accumulate(scene, &inputs, pass, &mut report)?;
            framebuffer.unbind();
        }

        if let Some((_, accumulation)) = targets {
            self.resolve(&accumulation, surface, &mut report);
        }

        self.stage = FrameStage::Idle;
        Ok(report)
    }

    fn enter(&mut self, report: &mut FrameReport, stage: FrameStage, sample_index: u32) {
        self.stage = stage;
        report.enter(stage, sample_index);
    }

    fn draw_geometry(&self, geometry: &dyn Geometry) {
        geometry.draw(&mut *self.device.gpu().borrow_mut());
    }

    /// Projection for one sample and the offset applied to it, in pixels
    fn jittered_projection(&self, inputs: &FrameInputs, sample_index: u32) -> (Mat4, Vec2) {
        let projection = *inputs.camera.projection_matrix();
        if !self.config.jitter {
            return (projection, Vec2::ZERO);
        }
        let offset = gaussian_jitter(sample_index, self.state.jitter_sigma);
        let size = Vec2::new(inputs.viewport.width.max(1) as f32, inputs.viewport.height.max(1) as f32);
        (jitter_projection(projection, offset, size), offset)
    }

    fn depth_prepass(&mut self, scene: &Scene, inputs: &FrameInputs, pass: SamplePass, report: &mut FrameReport) {
        self.enter(report, FrameStage::DepthPrepass, pass.index);
        {
            let mut gpu = self.device.gpu().borrow_mut();
            gpu.set_viewport(inputs.viewport);
            // depth and color writes must be on for the clears to reach them
            gpu.set_color_write(true);
            gpu.set_depth_state(DepthState { test: Some(CompareOp::LessOrEqual), write: true });
            gpu.set_blend(None);
            let color = pass.clear_color.then_some(self.config.clear_color);
            gpu.clear(color, Some(1.0));
            gpu.set_color_write(false);
        }

        let program = &self.depth_program;
        program.bind();
        program.set_uniform("uProjection", pass.projection);
        program.set_uniform("uView", pass.view);
        for object in scene.objects() {
            program.set_uniform("uModel", object.transform);
            self.draw_geometry(object.geometry.as_ref());
            report.depth_draws += 1;
        }

        self.device.gpu().borrow_mut().set_cull_face(false);
        for light in scene.lights() {
            program.set_uniform("uModel", light.model_matrix());
            self.draw_geometry(scene.light_geometry().as_ref());
            report.depth_draws += 1;
        }
        self.device.gpu().borrow_mut().set_cull_face(true);
    }

    fn color_accumulate(
        &mut self,
        scene: &Scene,
        inputs: &FrameInputs,
        pass: SamplePass,
        report: &mut FrameReport,
    ) -> Result<()> {
        self.enter(report, FrameStage::ColorAccumulate, pass.index);
        {
            let mut gpu = self.device.gpu().borrow_mut();
            gpu.set_color_write(true);
            gpu.set_depth_state(DepthState { test: Some(CompareOp::Equal), write: false });
            gpu.set_blend(Some(BlendState::ADDITIVE));
        }

        let params = *scene.params();
        let program = &self.ltc_program;
        program.bind();
        program.set_uniform("uProjection", pass.projection);
        program.set_uniform("uView", pass.view);
        program.set_uniform("uCameraPosition", inputs.camera.position());
        program.set_uniform("uRoughness", params.roughness);
        program.set_uniform("uAlbedo", params.albedo);
        program.set_uniform("uTwoSided", params.two_sided);
        program.bind_texture("uLtcMatrix", &self.ltc_matrix, LTC_MATRIX_UNIT);
        program.bind_texture("uLtcMagnitude", &self.ltc_magnitude, LTC_MAGNITUDE_UNIT);

        for (index, light) in scene.lights().iter().enumerate() {
            let filtered = if params.textured_light { light.filtered_texture.as_ref() } else { None };
            if params.textured_light && filtered.is_none() && self.warned_untextured.insert(index) {
                crate::ltc_warn!(SOURCE, "Light {} has no filtered texture, drawn untextured", index);
            }

            let block = LightBlock::new(light, params.two_sided, filtered.is_some());
            self.light_buffer.update(0, block.as_bytes())?;
            let program = &self.ltc_program;
            program.bind_buffer("LightBlock", &self.light_buffer, self.config.light_block_binding);
            program.set_uniform("uTextured", filtered.is_some());
            if let Some(texture) = filtered {
                program.bind_texture("uLightTexture", texture, LIGHT_TEXTURE_UNIT);
            }

            for object in scene.objects() {
                program.set_uniform("uModel", object.transform);
                self.draw_geometry(object.geometry.as_ref());
                report.accumulate_draws += 1;
            }
            report.light_passes += 1;
        }

        // emitters
        let program = &self.flat_program;
        program.bind();
        program.set_uniform("uProjection", pass.projection);
        program.set_uniform("uView", pass.view);
        self.device.gpu().borrow_mut().set_cull_face(false);
        for light in scene.lights() {
            let source = if params.textured_light { light.source_texture.as_ref() } else { None };
            program.set_uniform("uModel", light.model_matrix());
            program.set_uniform("uColor", light.radiance());
            program.set_uniform("uTextured", source.is_some());
            if let Some(texture) = source {
                program.bind_texture("uSourceTexture", texture, LIGHT_TEXTURE_UNIT);
            }
            self.draw_geometry(scene.light_geometry().as_ref());
            report.emitter_draws += 1;
        }
        self.device.gpu().borrow_mut().set_cull_face(true);
        Ok(())
    }

    fn resolve(&mut self, accumulation: &TextureHandle, surface: &mut dyn PresentSurface, report: &mut FrameReport) {
        self.enter(report, FrameStage::Resolve, self.state.sample_count);
        let (width, height) = surface.framebuffer_size();
        {
            let mut gpu = self.device.gpu().borrow_mut();
            gpu.set_viewport(Viewport::from_size(width, height));
            gpu.set_depth_state(DepthState::DISABLED);
            gpu.set_blend(None);
            gpu.set_color_write(true);
            gpu.clear(Some(self.config.clear_color), None);
        }

        // samples held by the accumulation buffer after this frame
        let weight = (self.state.sample_count + self.config.samples_per_frame) as f32;
        let program = &self.resolve_program;
        program.bind();
        program.bind_texture("uAccumulation", accumulation, ACCUMULATION_UNIT);
        program.set_uniform("uSampleCount", weight);
        {
            let mut gpu = self.device.gpu().borrow_mut();
            gpu.bind_vertex_array(Some(self.fullscreen_vao));
            gpu.draw_arrays(PrimitiveTopology::TriangleList, 0, 3);
            gpu.bind_vertex_array(None);
            gpu.set_depth_state(DepthState { test: Some(CompareOp::LessOrEqual), write: true });
        }
        accumulation.unbind(ACCUMULATION_UNIT);
        surface.present();
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        match self.device.gpu().try_borrow_mut() {
            Ok(mut gpu) => gpu.delete_vertex_array(self.fullscreen_vao),
            Err(_) => crate::ltc_warn!(SOURCE, "GPU busy while dropping the pipeline, vertex array leaked"),
        }
    }
}

#[cfg(test)]
#[path = "render_pipeline_tests.rs"]
mod tests;
