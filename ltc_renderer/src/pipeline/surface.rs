/// Presentation target seen by the resolve pass

/// Window-system side of presentation (swap chain, headless target, ...)
pub trait PresentSurface {
    /// Current drawable size in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    /// Show the frame drawn into the default framebuffer
    fn present(&mut self);
}

/// Surface without a window: fixed size, counts presents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    presented: u32,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            presented: 0,
        }
    }

    /// Change the size reported from the next frame on
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Frames presented so far
    pub fn presented(&self) -> u32 {
        self.presented
    }
}

impl PresentSurface for HeadlessSurface {
    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}
