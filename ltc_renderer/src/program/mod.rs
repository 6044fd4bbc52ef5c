/// Shader sources and program binding

mod program;
mod shader_library;

pub use program::Program;
pub use shader_library::{ShaderLibrary, ALL_EFFECTS, BUILTIN_VERSION};
