//! The per-video annotation store.
//!
//! Holds the registered behavior definitions and, per behavior, the list
//! of recorded intervals in insertion order. Overlapping or duplicate
//! intervals are legal and preserved; a behavior can occur any number of
//! times and the registry never merges or sorts. `video_path` and
//! `max_frames` bind the registry to one video and are fixed at
//! construction.

use ethogram_core::{EthogramError, Result};
use tracing::debug;

use crate::behavior::{BehaviorDef, Interval};

#[derive(Debug)]
struct BehaviorRecord {
    def: BehaviorDef,
    intervals: Vec<Interval>,
}

/// Behavior definitions plus recorded intervals for one video.
#[derive(Debug)]
pub struct AnnotationRegistry {
    video_path: String,
    max_frames: u64,
    records: Vec<BehaviorRecord>,
}

impl AnnotationRegistry {
    /// Create an empty registry bound to a video.
    pub fn new(video_path: impl Into<String>, max_frames: u64) -> Self {
        Self {
            video_path: video_path.into(),
            max_frames,
            records: Vec::new(),
        }
    }

    /// Path of the video this registry annotates.
    pub fn video_path(&self) -> &str {
        &self.video_path
    }

    /// Frame count of the video this registry annotates.
    pub fn max_frames(&self) -> u64 {
        self.max_frames
    }

    /// Register a behavior. Fails with `DuplicateBehavior` if the name is
    /// taken.
    pub fn register(&mut self, def: BehaviorDef) -> Result<()> {
        if self.find(&def.name).is_some() {
            return Err(EthogramError::DuplicateBehavior(def.name));
        }
        debug!("behavior registered: {} [{}]", def.name, def.kind);
        self.records.push(BehaviorRecord {
            def,
            intervals: Vec::new(),
        });
        Ok(())
    }

    /// Append a recorded interval for `name`.
    ///
    /// Fails with `UnknownBehavior` for an unregistered name,
    /// `InvalidInterval` when `end` precedes `start`, and `OutOfRange`
    /// when either frame lies outside the video. Nothing is recorded on
    /// failure.
    pub fn record_interval(&mut self, name: &str, start: u64, end: Option<u64>) -> Result<()> {
        let max_frames = self.max_frames;
        let record = self
            .find_mut(name)
            .ok_or_else(|| EthogramError::UnknownBehavior(name.to_string()))?;
        if let Some(end) = end {
            if end < start {
                return Err(EthogramError::InvalidInterval { start, end });
            }
        }
        let last = end.unwrap_or(start).max(start);
        if last >= max_frames {
            return Err(EthogramError::OutOfRange {
                frame: last as i64,
                total: max_frames,
            });
        }
        debug!("interval recorded: {} {}..={:?}", name, start, end);
        record.intervals.push(match end {
            Some(end) => Interval::closed(start, end),
            None => Interval::point(start),
        });
        Ok(())
    }

    /// Look up a behavior definition by name.
    pub fn behavior(&self, name: &str) -> Option<&BehaviorDef> {
        self.find(name).map(|r| &r.def)
    }

    /// Registered behaviors, in registration order.
    pub fn behaviors(&self) -> impl Iterator<Item = &BehaviorDef> {
        self.records.iter().map(|r| &r.def)
    }

    /// Recorded intervals for `name`, in insertion order.
    pub fn intervals(&self, name: &str) -> Option<&[Interval]> {
        self.find(name).map(|r| r.intervals.as_slice())
    }

    /// Number of registered behaviors.
    pub fn behavior_count(&self) -> usize {
        self.records.len()
    }

    /// Total number of recorded intervals across all behaviors.
    pub fn interval_count(&self) -> usize {
        self.records.iter().map(|r| r.intervals.len()).sum()
    }

    fn find(&self, name: &str) -> Option<&BehaviorRecord> {
        self.records.iter().find(|r| r.def.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut BehaviorRecord> {
        self.records.iter_mut().find(|r| r.def.name == name)
    }
}
