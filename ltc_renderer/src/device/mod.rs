/// Device abstraction
///
/// `Device` is the single entry point for resource creation. The profile is
/// chosen once at construction and selects one `DeviceBackend`; callers
/// never branch on it.

mod device;
mod core_backend;
mod compat_backend;

pub use device::{Device, DeviceBackend, DeviceDesc, DeviceProfile};
pub use core_backend::CoreBackend;
pub use compat_backend::CompatBackend;
