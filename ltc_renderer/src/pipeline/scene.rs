/// Scene content consumed by the render pipeline
///
/// Geometry is supplied by an external mesh collaborator through the
/// `Geometry` trait. Lights are rectangular area lights; their quads are
/// drawn with a shared unit-plane geometry scaled by the light size.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::error::Result;
use crate::gpu::{GpuApi, TextureName};
use crate::texture::TextureHandle;

const SOURCE: &str = "ltc::Scene";

// ===== GEOMETRY =====

/// Drawable mesh; issues its own draw calls with the current state
pub trait Geometry {
    fn draw(&self, gpu: &mut dyn GpuApi);
}

/// Geometry placed in the world
#[derive(Clone)]
pub struct SceneObject {
    pub geometry: Rc<dyn Geometry>,
    pub transform: Mat4,
}

impl SceneObject {
    pub fn new(geometry: Rc<dyn Geometry>, transform: Mat4) -> Self {
        Self { geometry, transform }
    }
}

// ===== LIGHTS =====

/// Rectangular area light
#[derive(Debug, Clone)]
pub struct LightInstance {
    pub position: Vec3,
    pub rotation: Quat,
    pub width: f32,
    pub height: f32,
    pub intensity: f32,
    pub color: Vec3,
    /// Unfiltered emission texture (drawn on the light quad)
    pub source_texture: Option<TextureHandle>,
    /// Prefiltered emission texture sampled by the LTC shading
    pub filtered_texture: Option<TextureHandle>,
}

impl Default for LightInstance {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            width: 5.0,
            height: 5.0,
            intensity: 1.0,
            color: Vec3::ONE,
            source_texture: None,
            filtered_texture: None,
        }
    }
}

impl LightInstance {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Orientation with the quad's local +Y turned to face forward
    fn oriented(&self) -> Mat3 {
        Mat3::from_quat(self.rotation * Quat::from_axis_angle(Vec3::X, -std::f32::consts::FRAC_PI_2))
    }

    /// (right, up, direction) in world space
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let m = self.oriented();
        (m.x_axis, m.y_axis, m.z_axis)
    }

    /// World transform of the unit light quad
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(Vec3::new(self.width, 1.0, self.height))
    }

    /// Emitted radiance
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    fn key(&self) -> LightKey {
        LightKey {
            position: self.position,
            rotation: self.rotation,
            size: (self.width, self.height),
            radiance: (self.color, self.intensity),
            source: self.source_texture.as_ref().map(|t| t.name()),
            filtered: self.filtered_texture.as_ref().map(|t| t.name()),
        }
    }
}

// ===== PARAMETERS =====

/// Material and display parameters exposed to the user interface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParameters {
    pub roughness: f32,
    pub albedo: Vec3,
    pub two_sided: bool,
    pub textured_light: bool,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            roughness: 0.25,
            albedo: Vec3::ONE,
            two_sided: false,
            textured_light: false,
        }
    }
}

// ===== LIGHT BLOCK =====

/// std140 uniform block uploaded once per light pass
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    /// xyz = position, w = 1
    pub position: Vec4,
    pub right: Vec4,
    pub up: Vec4,
    pub direction: Vec4,
    /// rgb = color * intensity
    pub color: Vec4,
    /// x = width, y = height, z = two-sided, w = textured
    pub params: Vec4,
}

impl LightBlock {
    pub const SIZE: usize = std::mem::size_of::<LightBlock>();

    pub fn new(light: &LightInstance, two_sided: bool, textured: bool) -> Self {
        let (right, up, direction) = light.basis();
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            position: light.position.extend(1.0),
            right: right.extend(0.0),
            up: up.extend(0.0),
            direction: direction.extend(0.0),
            color: light.radiance().extend(1.0),
            params: Vec4::new(light.width, light.height, flag(two_sided), flag(textured)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

// ===== SCENE =====

/// Values whose change invalidates accumulated samples
#[derive(Debug, Clone, PartialEq)]
struct LightKey {
    position: Vec3,
    rotation: Quat,
    size: (f32, f32),
    radiance: (Vec3, f32),
    source: Option<TextureName>,
    filtered: Option<TextureName>,
}

/// Comparable copy of everything in the scene that affects the image
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    params: SceneParameters,
    lights: Vec<LightKey>,
    objects: Vec<Mat4>,
}

/// Objects, lights and parameters rendered by the pipeline
pub struct Scene {
    objects: Vec<SceneObject>,
    lights: Vec<LightInstance>,
    light_geometry: Rc<dyn Geometry>,
    params: SceneParameters,
}

impl Scene {
    /// Build a scene; both lists must be non-empty
    pub fn new(
        objects: Vec<SceneObject>,
        lights: Vec<LightInstance>,
        light_geometry: Rc<dyn Geometry>,
    ) -> Result<Self> {
        if objects.is_empty() {
            crate::ltc_bail!(SOURCE, InvalidResource, "Scene needs at least one object");
        }
        if lights.is_empty() {
            crate::ltc_bail!(SOURCE, InvalidResource, "Scene needs at least one light");
        }
        crate::ltc_debug!(SOURCE, "Scene with {} objects and {} lights", objects.len(), lights.len());
        Ok(Self {
            objects,
            lights,
            light_geometry,
            params: SceneParameters::default(),
        })
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn lights(&self) -> &[LightInstance] {
        &self.lights
    }

    /// Lights for editing; the list itself cannot shrink to empty
    pub fn lights_mut(&mut self) -> &mut [LightInstance] {
        &mut self.lights
    }

    pub fn light_geometry(&self) -> &Rc<dyn Geometry> {
        &self.light_geometry
    }

    pub fn params(&self) -> &SceneParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SceneParameters {
        &mut self.params
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            params: self.params,
            lights: self.lights.iter().map(LightInstance::key).collect(),
            objects: self.objects.iter().map(|o| o.transform).collect(),
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
