//! The persisted annotation document.
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "video_path": "clip.mp4",
//!   "max_frames": 1000,
//!   "behav_info": {
//!     "walk": { "behavior_type": "State",
//!               "behavior_note": "",
//!               "behavior_color": "#ff0000" }
//!   },
//!   "behav_frames": { "walk": [[10, 40], [55]] }
//! }
//! ```
//!
//! A one-element frame list is a point tag, a two-element list a closed
//! interval. Field order is not significant. Loading validates the whole
//! document before building a registry, so a malformed file never leaves
//! a partially-populated registry behind.

use ethogram_core::{Color, EthogramError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::behavior::{BehaviorDef, BehaviorKind};
use crate::registry::AnnotationRegistry;

/// One behavior's definition entry in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorEntry {
    /// `"Event"` or `"State"`
    pub behavior_type: BehaviorKind,
    /// Free-form operator note
    pub behavior_note: String,
    /// Display color as `#rrggbb`
    pub behavior_color: Color,
}

/// The full persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationDocument {
    /// Path of the annotated video
    pub video_path: String,
    /// Frame count of the annotated video
    pub max_frames: u64,
    /// Behavior definitions by name
    pub behav_info: BTreeMap<String, BehaviorEntry>,
    /// Recorded frame lists by name
    pub behav_frames: BTreeMap<String, Vec<Vec<u64>>>,
}

impl AnnotationDocument {
    /// Snapshot a registry into its document form.
    pub fn from_registry(registry: &AnnotationRegistry) -> Self {
        let mut behav_info = BTreeMap::new();
        let mut behav_frames = BTreeMap::new();

        for def in registry.behaviors() {
            behav_info.insert(
                def.name.clone(),
                BehaviorEntry {
                    behavior_type: def.kind,
                    behavior_note: def.note.clone(),
                    behavior_color: def.color,
                },
            );
            let frames = registry
                .intervals(&def.name)
                .unwrap_or(&[])
                .iter()
                .map(|interval| match interval.end {
                    Some(end) => vec![interval.start, end],
                    None => vec![interval.start],
                })
                .collect();
            behav_frames.insert(def.name.clone(), frames);
        }

        Self {
            video_path: registry.video_path().to_string(),
            max_frames: registry.max_frames(),
            behav_info,
            behav_frames,
        }
    }

    /// Build a registry from the document, validating everything first.
    ///
    /// Fails with `MalformedDocument` when a frames key has no matching
    /// definition, a frame list is not 1 or 2 elements long, an interval
    /// runs backwards, or a frame lies past `max_frames`. A definition
    /// with no frames entry loads with an empty interval list.
    pub fn into_registry(self) -> Result<AnnotationRegistry> {
        for name in self.behav_frames.keys() {
            if !self.behav_info.contains_key(name) {
                return Err(EthogramError::MalformedDocument(format!(
                    "frames recorded for undefined behavior {name:?}"
                )));
            }
        }

        let mut registry = AnnotationRegistry::new(self.video_path, self.max_frames);

        for (name, entry) in &self.behav_info {
            let def = BehaviorDef::new(name, entry.behavior_type, entry.behavior_color)
                .with_note(entry.behavior_note.clone());
            registry
                .register(def)
                .map_err(|e| EthogramError::MalformedDocument(e.to_string()))?;
        }

        for (name, lists) in &self.behav_frames {
            for list in lists {
                let (start, end) = match list.as_slice() {
                    [start] => (*start, None),
                    [start, end] => (*start, Some(*end)),
                    _ => {
                        return Err(EthogramError::MalformedDocument(format!(
                            "frame list for {name:?} must have 1 or 2 elements, got {}",
                            list.len()
                        )))
                    }
                };
                registry
                    .record_interval(name, start, end)
                    .map_err(|e| EthogramError::MalformedDocument(e.to_string()))?;
            }
        }

        Ok(registry)
    }

    /// Serialize to pretty-printed JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| EthogramError::MalformedDocument(format!("failed to serialize: {e}")))
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| EthogramError::MalformedDocument(e.to_string()))
    }

    /// Save to a file path.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load from a file path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}
