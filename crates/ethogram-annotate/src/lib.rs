//! Ethogram Annotate - the annotation data model and key-press recorder
//!
//! This crate provides:
//! - Behavior definitions and recorded frame intervals
//! - `AnnotationRegistry`: the per-video annotation store
//! - `AnnotationDocument`: the persisted JSON form
//! - `AnnotationRecorder`: the key-press state machine

pub mod behavior;
pub mod document;
pub mod recorder;
pub mod registry;

pub use behavior::{BehaviorDef, BehaviorKind, Interval};
pub use document::AnnotationDocument;
pub use recorder::{
    AnnotationRecorder, KeyMap, KeyOutcome, PendingRecording, BEHAVIOR_KEYS, QUIT_KEY, REMOVE_KEY,
};
pub use registry::AnnotationRegistry;
