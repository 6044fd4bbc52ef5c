/*!
# LTC Renderer - OpenGL Backend

OpenGL implementation of the `GpuApi` binding of `ltc_renderer`, built on
the glow loader.

The window system owns the context; this crate only needs a current one.

# Example

```no_run
use std::rc::Rc;
use ltc_renderer::ltc::{Device, DeviceDesc, DeviceProfile};
use ltc_renderer_gl::GlowGpu;

# fn run(gl: glow::Context) -> ltc_renderer::ltc::Result<()> {
let gpu = GlowGpu::shared(gl)?;
let device = Rc::new(Device::new(
    DeviceDesc { profile: DeviceProfile::Compatibility, ..Default::default() },
    gpu,
)?);
# Ok(())
# }
```
*/

mod gl_gpu;
mod gl_format;
mod debug;

pub use gl_gpu::GlowGpu;
pub use debug::{print_error_stats_report, ErrorTracker, GlErrorStats, MAX_GROUPED_MESSAGES};
