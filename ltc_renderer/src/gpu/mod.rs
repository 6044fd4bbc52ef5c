/// GPU-API binding layer
///
/// `GpuApi` is the thin, GL-shaped binding every device backend drives.
/// `SoftwareGpu` implements it in memory for headless runs and tests;
/// real contexts are provided by backend crates.

pub mod api;
pub mod types;
pub mod software;
mod name_allocator;

pub use api::{GpuApi, SharedGpu};
pub use types::*;
pub use software::{SoftwareGpu, GpuCommand, DrawCall};
