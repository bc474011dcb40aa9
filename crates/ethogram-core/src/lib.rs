//! Ethogram Core - Foundation types for behavior annotation
//!
//! This crate provides the fundamental types used throughout Ethogram Studio:
//! - Error taxonomy shared by every subsystem
//! - Frame buffers and pixel formats
//! - Frame-accurate time representation (FrameRate, RationalTime)
//! - Display colors for behavior labels
//! - A synchronous observer utility for component wiring

pub mod color;
pub mod error;
pub mod event;
pub mod frame;
pub mod time;

pub use color::Color;
pub use error::{EthogramError, Result};
pub use event::Subscribers;
pub use frame::{FrameBuffer, FramePlane, PixelFormat};
pub use time::{FrameRate, RationalTime};

/// Session-wide defaults.
pub mod defaults {
    /// Number of decoded frames held in the sliding prefetch window.
    pub const FRAME_WINDOW_CAPACITY: usize = 100;

    /// Poll interval for the prefetch worker between tick attempts.
    pub const PREFETCH_POLL_MS: u64 = 5;

    /// Number of single-key slots available for behavior bindings.
    pub const BEHAVIOR_KEY_SLOTS: usize = 12;
}
