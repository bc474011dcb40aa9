//! Ethogram Playback - frame navigation over the prefetch cache
//!
//! This crate provides:
//! - `PlaybackCursor`: the current-frame pointer with step/seek/auto-play
//! - `PresentationSurface`: the boundary to the (external) display layer

pub mod cursor;
pub mod surface;

pub use cursor::PlaybackCursor;
pub use surface::{NullSurface, PresentationSurface};
