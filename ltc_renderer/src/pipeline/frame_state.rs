/// Per-frame progressive sampling state and the report of a rendered frame

/// Stages of one frame, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Idle,
    Jitter,
    DepthPrepass,
    ColorAccumulate,
    Resolve,
}

/// Running accumulation state, threaded through every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Samples accumulated so far
    pub sample_count: u32,
    /// The accumulation buffer must be cleared this frame
    pub reset: bool,
    /// Standard deviation of the sub-pixel jitter, in pixels
    pub jitter_sigma: f32,
}

impl FrameState {
    pub fn new(jitter_sigma: f32) -> Self {
        Self {
            sample_count: 0,
            reset: true,
            jitter_sigma,
        }
    }

    /// Apply the reset rule for a new frame.
    ///
    /// A dirty frame restarts at zero; otherwise the count grows by `batch`
    /// when accumulation is on and stays put when it is off.
    pub fn advance(&mut self, dirty: bool, accumulate: bool, batch: u32) {
        if dirty || !accumulate {
            self.reset = true;
            self.sample_count = 0;
        } else {
            self.reset = false;
            self.sample_count = self.sample_count.saturating_add(batch);
        }
    }
}

/// One executed stage with the sample index it ran for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRecord {
    pub stage: FrameStage,
    pub sample_count: u32,
}

/// What `render` did for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub stages: Vec<StageRecord>,
    pub reset: bool,
    pub sample_count: u32,
    /// Sub-pixel offset applied to the projection of the first sub-pass
    pub jitter: glam::Vec2,
    pub depth_draws: u32,
    pub light_passes: u32,
    pub accumulate_draws: u32,
    pub emitter_draws: u32,
    /// Passes were skipped because the accumulation targets are unavailable
    pub skipped: bool,
}

impl FrameReport {
    pub(crate) fn enter(&mut self, stage: FrameStage, sample_count: u32) {
        self.stages.push(StageRecord { stage, sample_count });
    }

    /// Stages in execution order
    pub fn stage_order(&self) -> Vec<FrameStage> {
        self.stages.iter().map(|s| s.stage).collect()
    }

    /// Sample index of the first run of `stage`, if it ran
    pub fn sample_count_at(&self, stage: FrameStage) -> Option<u32> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| s.sample_count)
    }
}

#[cfg(test)]
#[path = "frame_state_tests.rs"]
mod tests;
