//! Error types for the LTC renderer
//!
//! This module defines the error types used throughout the renderer,
//! including device initialization, asset loading and GPU resource creation.

use std::fmt;

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Renderer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (GL call failure, context loss, etc.)
    BackendError(String),

    /// Invalid resource or descriptor (texture, buffer, framebuffer, scene, etc.)
    InvalidResource(String),

    /// Initialization failed (device profile not supported, context too old)
    InitializationFailed(String),

    /// An asset (image file, texture container, shader source) could not be loaded
    AssetLoadFailed(String),

    /// Framebuffer completeness check failed (carries the reported status)
    IncompleteFramebuffer(String),

    /// A uniform name is not active in the program
    UniformNotFound(String),

    /// Shader stage failed to compile (carries the compiler log)
    ShaderCompilationFailed(String),

    /// Program failed to link (carries the linker log)
    ProgramLinkFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::AssetLoadFailed(msg) => write!(f, "Asset load failed: {}", msg),
            Error::IncompleteFramebuffer(msg) => write!(f, "Incomplete framebuffer: {}", msg),
            Error::UniformNotFound(name) => write!(f, "Uniform not found: {}", name),
            Error::ShaderCompilationFailed(log) => write!(f, "Shader compilation failed: {}", log),
            Error::ProgramLinkFailed(log) => write!(f, "Program link failed: {}", log),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
