//! The boundary to the display layer.
//!
//! Rendering lives outside this workspace. Whatever presents frames to the
//! operator implements `PresentationSurface` and receives presentation-
//! format buffers; no conversion responsibility crosses the boundary.

use ethogram_core::{FrameBuffer, Result};

/// Accepts decoded frames for display.
pub trait PresentationSurface: Send {
    /// Show the frame at `index`. The buffer is borrowed for the call
    /// only; implementations copy what they need.
    fn present(&mut self, index: u64, frame: &FrameBuffer) -> Result<()>;
}

/// A surface that discards every frame.
#[derive(Debug, Default)]
pub struct NullSurface;

impl PresentationSurface for NullSurface {
    fn present(&mut self, _index: u64, _frame: &FrameBuffer) -> Result<()> {
        Ok(())
    }
}
