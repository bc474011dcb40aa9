//! Behavior definitions and recorded intervals.

use ethogram_core::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a behavior is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// An instantaneous tag on a single frame.
    Event,
    /// A durative range requiring an opening and a closing key press.
    State,
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "Event"),
            Self::State => write!(f, "State"),
        }
    }
}

/// A named behavior with its display attributes.
///
/// Immutable once registered; behaviors are identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorDef {
    /// Unique name
    pub name: String,
    /// Event or State
    pub kind: BehaviorKind,
    /// Color used by the timeline display
    pub color: Color,
    /// Free-form operator note
    pub note: String,
}

impl BehaviorDef {
    /// Create a definition with an empty note.
    pub fn new(name: impl Into<String>, kind: BehaviorKind, color: Color) -> Self {
        Self {
            name: name.into(),
            kind,
            color,
            note: String::new(),
        }
    }

    /// Attach an operator note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// A recorded frame range.
///
/// `end == None` is a point tag; a closed interval covers
/// `[start, end]` inclusive. Intervals are appended once and never
/// mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// First frame of the range
    pub start: u64,
    /// Last frame of the range, or `None` for a point tag
    pub end: Option<u64>,
}

impl Interval {
    /// A point tag at `start`.
    pub fn point(start: u64) -> Self {
        Self { start, end: None }
    }

    /// A closed range `[start, end]`.
    pub fn closed(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// The effective last frame (the start frame for point tags).
    pub fn end_frame(&self) -> u64 {
        self.end.unwrap_or(self.start)
    }

    /// Whether this is a point tag.
    pub fn is_point(&self) -> bool {
        self.end.is_none()
    }
}
