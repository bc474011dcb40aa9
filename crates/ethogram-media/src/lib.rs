//! Ethogram Media - video frame access for annotation sessions
//!
//! This crate handles:
//! - The `FrameSource` decode-capability boundary
//! - Media file probing
//! - The sliding-window frame cache with background prefetch

pub mod cache;
pub mod probe;
pub mod source;

pub use cache::{CacheStats, FrameCache, PrefetchHandle};
pub use probe::MediaProbe;
pub use source::{stamped_index, FrameSource, VideoSource};

/// Initialize the media subsystem (call once at startup).
pub fn init() {
    tracing::info!("Ethogram Media initialized");
}
