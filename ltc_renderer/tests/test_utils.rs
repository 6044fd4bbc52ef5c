#![allow(dead_code)]
//! Test utilities shared by the integration tests
//!
//! Everything runs on the in-memory `SoftwareGpu`, so no GPU or window is
//! needed. Helpers build a device, the LTC lookup tables, a small scene and
//! a pipeline wired to the built-in shader library.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ltc_renderer::glam::{Mat4, Quat, Vec3};
use ltc_renderer::ltc::gpu::{GpuApi, IndexType, PixelFormat, PrimitiveTopology, SharedGpu, SoftwareGpu};
use ltc_renderer::ltc::render::{
    Geometry, LightInstance, PipelineConfig, PipelineDesc, PipelineShaders, RenderPipeline, Scene, SceneObject,
};
use ltc_renderer::ltc::resource::{SamplerDesc, ShaderLibrary, TextureDesc, TextureHandle};
use ltc_renderer::ltc::{Device, DeviceDesc, DeviceProfile};

/// Indexed mesh stand-in that counts how often it was drawn
pub struct TestMesh {
    pub index_count: u32,
    pub draws: Cell<u32>,
}

impl TestMesh {
    pub fn new(index_count: u32) -> Rc<Self> {
        Rc::new(Self { index_count, draws: Cell::new(0) })
    }
}

impl Geometry for TestMesh {
    fn draw(&self, gpu: &mut dyn GpuApi) {
        self.draws.set(self.draws.get() + 1);
        gpu.draw_elements(PrimitiveTopology::TriangleList, self.index_count, IndexType::U16, 0);
    }
}

/// Software GPU and a device of the requested profile
pub fn create_test_device(profile: DeviceProfile) -> (Rc<RefCell<SoftwareGpu>>, Rc<Device>) {
    let gpu = Rc::new(RefCell::new(SoftwareGpu::new()));
    let shared: SharedGpu = gpu.clone();
    let device = Device::new(
        DeviceDesc { label: format!("integration {:?}", profile), profile },
        shared,
    )
    .expect("Failed to create software device");
    (gpu, Rc::new(device))
}

/// LTC matrix and magnitude tables (64x64 RGBA32F)
pub fn create_ltc_tables(device: &Device) -> (TextureHandle, TextureHandle) {
    let table = |label: &str, value: f32| {
        let texels: Vec<f32> = vec![value; 64 * 64 * 4];
        device
            .create_texture(&TextureDesc {
                sampler: SamplerDesc::clamped_linear(),
                data: Some(texels.iter().flat_map(|t| t.to_le_bytes()).collect()),
                ..TextureDesc::d2(label, 64, 64, PixelFormat::Rgba32Float)
            })
            .expect("Failed to create LTC table")
    };
    (table("ltc_1", 1.0), table("ltc_2", 0.5))
}

/// Floor plus a row of boxes lit by two area lights
pub fn create_test_scene() -> (Rc<TestMesh>, Rc<TestMesh>, Scene) {
    let mesh = TestMesh::new(36);
    let quad = TestMesh::new(6);
    let objects = vec![
        SceneObject::new(mesh.clone(), Mat4::from_scale(Vec3::new(20.0, 0.1, 20.0))),
        SceneObject::new(mesh.clone(), Mat4::from_translation(Vec3::new(-3.0, 1.0, 0.0))),
        SceneObject::new(mesh.clone(), Mat4::from_translation(Vec3::new(3.0, 1.0, 0.0))),
    ];
    let lights = vec![
        LightInstance {
            rotation: Quat::from_rotation_x(0.3),
            color: Vec3::new(1.0, 0.9, 0.8),
            intensity: 4.0,
            ..LightInstance::new(Vec3::new(-4.0, 3.0, -6.0))
        },
        LightInstance {
            width: 2.0,
            height: 8.0,
            ..LightInstance::new(Vec3::new(4.0, 3.0, -6.0))
        },
    ];
    let scene = Scene::new(objects, lights, quad.clone()).expect("Failed to create scene");
    (mesh, quad, scene)
}

/// Pipeline over the built-in shaders
pub fn create_test_pipeline(device: &Rc<Device>, config: PipelineConfig) -> RenderPipeline {
    let (ltc_matrix, ltc_magnitude) = create_ltc_tables(device);
    let library = ShaderLibrary::builtin();
    RenderPipeline::new(
        device.clone(),
        PipelineDesc {
            config,
            shaders: PipelineShaders::default(),
            library: &library,
            ltc_matrix,
            ltc_magnitude,
        },
    )
    .expect("Failed to create pipeline")
}
