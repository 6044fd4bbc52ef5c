/// Progressive area-light rendering
///
/// Halton sampling, scene content, the per-frame state machine and the
/// render pipeline that drives them.

pub mod halton;
mod scene;
mod frame_state;
mod surface;
mod render_pipeline;

pub use halton::{gaussian_jitter, halton, halton_4d, jitter_projection, HALTON_BASES};
pub use scene::{Geometry, LightBlock, LightInstance, Scene, SceneObject, SceneParameters, SceneSnapshot};
pub use frame_state::{FrameReport, FrameStage, FrameState, StageRecord};
pub use surface::{HeadlessSurface, PresentSurface};
pub use render_pipeline::{PipelineConfig, PipelineDesc, PipelineShaders, RenderPipeline};
