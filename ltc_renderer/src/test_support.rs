//! Shared helpers for unit tests (no GPU required)

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::device::{Device, DeviceDesc, DeviceProfile};
use crate::gpu::{SharedGpu, SoftwareGpu};
use crate::log::{self, LogEntry, LogSeverity, Logger};

/// Logger that keeps every entry in memory
///
/// Cloned handles share the same storage, so a test can install one clone
/// as the global logger and inspect the other. Only entries emitted from the
/// installing thread are kept, so tests running in parallel do not leak
/// into each other's captures.
#[derive(Clone)]
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    owner: ThreadId,
}

impl Default for CaptureLogger {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            owner: thread::current().id(),
        }
    }
}

impl CaptureLogger {
    /// Install a fresh capture logger globally and return a handle to it
    pub fn install() -> Self {
        let capture = Self::default();
        log::set_logger(capture.clone());
        capture
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count_at(&self, severity: LogSeverity) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    pub fn messages_containing(&self, needle: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message.contains(needle))
            .count()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if thread::current().id() != self.owner {
            return;
        }
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Software GPU plus a device bound to it for the requested profile
pub fn software_device(profile: DeviceProfile) -> (Rc<RefCell<SoftwareGpu>>, Device) {
    let gpu = Rc::new(RefCell::new(SoftwareGpu::new()));
    let shared: SharedGpu = gpu.clone();
    let device = Device::new(
        DeviceDesc {
            label: format!("test {:?}", profile),
            profile,
        },
        shared,
    )
    .unwrap();
    (gpu, device)
}

/// Geometry that issues one indexed triangle draw and counts its calls
#[derive(Default)]
pub struct CountingGeometry {
    pub draws: std::cell::Cell<u32>,
}

impl crate::pipeline::Geometry for CountingGeometry {
    fn draw(&self, gpu: &mut dyn crate::gpu::GpuApi) {
        self.draws.set(self.draws.get() + 1);
        gpu.draw_elements(crate::gpu::PrimitiveTopology::TriangleList, 6, crate::gpu::IndexType::U32, 0);
    }
}

/// 64x64 RGBA32F LTC tables filled with zeros
pub fn ltc_tables(device: &Device) -> (crate::texture::TextureHandle, crate::texture::TextureHandle) {
    use crate::format::PixelFormat;
    use crate::texture::{SamplerDesc, TextureDesc};
    let table = |label: &str| {
        device
            .create_texture(&TextureDesc {
                sampler: SamplerDesc::clamped_linear(),
                data: Some(vec![0u8; 64 * 64 * 16]),
                ..TextureDesc::d2(label, 64, 64, PixelFormat::Rgba32Float)
            })
            .unwrap()
    };
    (table("ltc matrix"), table("ltc magnitude"))
}

/// Scene of `objects` objects and `lights` lights sharing counting geometry
pub fn counting_scene(objects: usize, lights: usize) -> (Rc<CountingGeometry>, Rc<CountingGeometry>, crate::pipeline::Scene) {
    use crate::pipeline::{LightInstance, Scene, SceneObject};
    let mesh = Rc::new(CountingGeometry::default());
    let quad = Rc::new(CountingGeometry::default());
    let objects = (0..objects)
        .map(|i| SceneObject::new(mesh.clone(), glam::Mat4::from_translation(glam::Vec3::X * i as f32)))
        .collect();
    let lights = (0..lights)
        .map(|i| LightInstance::new(glam::Vec3::new(i as f32 * 6.0, 4.0, -10.0)))
        .collect();
    let scene = Scene::new(objects, lights, quad.clone()).unwrap();
    (mesh, quad, scene)
}
