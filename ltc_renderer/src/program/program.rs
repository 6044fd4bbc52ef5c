/// Shader program binder
///
/// Compiles tagged stages, links, and sets uniforms by name. Name lookups go
/// through a per-program cache that also remembers misses, so a missing
/// uniform costs one query and one warning for the program's lifetime.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::gpu::{ProgramName, ShaderName, ShaderStage, SharedGpu, UniformLocation, UniformValue};
use crate::texture::Texture;
use super::shader_library::ShaderLibrary;

const SOURCE: &str = "ltc::Program";

pub struct Program {
    gpu: SharedGpu,
    name: ProgramName,
    label: String,
    stages: Vec<ShaderStage>,
    /// Compiled stages waiting for the next link
    shaders: Vec<ShaderName>,
    linked: bool,
    locations: RefCell<FxHashMap<String, Option<UniformLocation>>>,
    blocks: RefCell<FxHashMap<String, Option<u32>>>,
    reported: RefCell<FxHashSet<String>>,
}

impl Program {
    pub(crate) fn new(gpu: &SharedGpu, label: impl Into<String>) -> Result<Self> {
        let name = gpu.borrow_mut().create_program()?;
        Ok(Self {
            gpu: gpu.clone(),
            name,
            label: label.into(),
            stages: Vec::new(),
            shaders: Vec::new(),
            linked: false,
            locations: RefCell::new(FxHashMap::default()),
            blocks: RefCell::new(FxHashMap::default()),
            reported: RefCell::new(FxHashSet::default()),
        })
    }

    pub fn name(&self) -> ProgramName {
        self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Compile the section `tag` of `library` as `stage` and attach it
    pub fn add_stage(&mut self, stage: ShaderStage, tag: &str, library: &ShaderLibrary) -> Result<()> {
        let Some(source) = library.source(tag) else {
            crate::ltc_bail!(SOURCE, AssetLoadFailed, "Program '{}': shader '{}' not found", self.label, tag);
        };

        let mut gpu = self.gpu.borrow_mut();
        let shader = gpu.compile_shader(stage, &source).map_err(|e| {
            crate::ltc_err!(SOURCE, ShaderCompilationFailed, "{} ({:?}): {}", tag, stage, e)
        })?;
        gpu.attach_shader(self.name, shader);
        drop(gpu);

        crate::ltc_debug!(SOURCE, "Program '{}': compiled {}", self.label, tag);
        self.shaders.push(shader);
        self.stages.push(stage);
        Ok(())
    }

    /// Link the attached stages; previously cached locations are discarded
    pub fn link(&mut self) -> Result<()> {
        let linked = self.gpu.borrow_mut().link_program(self.name);
        linked.map_err(|e| crate::ltc_err!(SOURCE, ProgramLinkFailed, "Program '{}': {}", self.label, e))?;

        // the linked program no longer needs its stage objects
        let mut gpu = self.gpu.borrow_mut();
        for shader in self.shaders.drain(..) {
            gpu.delete_shader(shader);
        }
        drop(gpu);

        self.linked = true;
        self.locations.borrow_mut().clear();
        self.blocks.borrow_mut().clear();
        self.reported.borrow_mut().clear();
        crate::ltc_debug!(SOURCE, "Program '{}' linked ({} stages)", self.label, self.stages.len());
        Ok(())
    }

    /// Make this the program in use
    pub fn bind(&self) {
        self.gpu.borrow_mut().use_program(Some(self.name));
    }

    pub fn unbind(&self) {
        self.gpu.borrow_mut().use_program(None);
    }

    fn cached_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.borrow().get(name) {
            return *cached;
        }
        let location = self.gpu.borrow_mut().uniform_location(self.name, name);
        self.locations.borrow_mut().insert(name.to_string(), location);
        location
    }

    /// Location of an active uniform
    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation> {
        match self.cached_location(name) {
            Some(location) => Ok(location),
            None => Err(Error::UniformNotFound(format!("'{}' in program '{}'", name, self.label))),
        }
    }

    fn report_missing(&self, kind: &str, name: &str) {
        if self.reported.borrow_mut().insert(name.to_string()) {
            crate::ltc_warn!(SOURCE, "Program '{}': {} '{}' not found", self.label, kind, name);
        }
    }

    /// Set a uniform of this program, which must be bound.
    ///
    /// Returns false when the program has no active uniform `name`.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> bool {
        match self.cached_location(name) {
            Some(location) => {
                self.gpu.borrow_mut().set_uniform(location, value.into());
                true
            }
            None => {
                self.report_missing("uniform", name);
                false
            }
        }
    }

    /// Bind `texture` to `unit` and point sampler `name` at it
    pub fn bind_texture(&self, name: &str, texture: &Texture, unit: u32) -> bool {
        if !self.set_uniform(name, unit as i32) {
            return false;
        }
        texture.bind(unit);
        true
    }

    /// Bind `buffer` to `binding` and route uniform block `name` to it
    pub fn bind_buffer(&self, name: &str, buffer: &Buffer, binding: u32) -> bool {
        let cached = self.blocks.borrow().get(name).copied();
        let index = match cached {
            Some(index) => index,
            None => {
                let index = self.gpu.borrow_mut().uniform_block_index(self.name, name);
                self.blocks.borrow_mut().insert(name.to_string(), index);
                index
            }
        };
        let Some(index) = index else {
            self.report_missing("uniform block", name);
            return false;
        };
        self.gpu.borrow_mut().uniform_block_binding(self.name, index, binding);
        buffer.bind_base(binding);
        true
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        match self.gpu.try_borrow_mut() {
            Ok(mut gpu) => {
                for shader in self.shaders.drain(..) {
                    gpu.delete_shader(shader);
                }
                gpu.delete_program(self.name);
            }
            Err(_) => crate::ltc_warn!(
                SOURCE,
                "GPU busy while dropping '{}', program {} leaked",
                self.label,
                self.name.0
            ),
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("stages", &self.stages)
            .field("linked", &self.linked)
            .finish()
    }
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
