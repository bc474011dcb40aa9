//! Media file probing to get metadata without full decode.

use ethogram_core::{EthogramError, FrameRate, RationalTime, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Information about a video file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame rate
    pub frame_rate: FrameRate,
    /// Total frame count
    pub total_frames: u64,
}

impl MediaProbe {
    /// Probe a video file.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(EthogramError::DecodeFailure(format!(
                "file not found: {}",
                path_str
            )));
        }

        // For now, return placeholder metadata
        // In a real implementation, we would use ffprobe via ffmpeg-sidecar
        Ok(Self {
            path: path_str,
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::FPS_30,
            total_frames: 300,
        })
    }

    /// Video duration derived from frame count and rate.
    pub fn duration(&self) -> RationalTime {
        RationalTime::from_frames(self.total_frames as i64, self.frame_rate)
    }
}
