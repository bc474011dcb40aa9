//! The key-press recorder.
//!
//! Maps single-key symbols to registered behaviors and turns presses into
//! registry writes. At most one State recording is in flight at a time,
//! across all behaviors; it is closed by a second press of the same key
//! and discarded by the quit key. The machine has two states, idle and
//! recording, and lives for the session.

use ethogram_core::{defaults, EthogramError, Result};
use tracing::debug;

use crate::behavior::{BehaviorDef, BehaviorKind};
use crate::registry::AnnotationRegistry;

/// Behavior key symbols, in slot order.
pub const BEHAVIOR_KEYS: [char; defaults::BEHAVIOR_KEY_SLOTS] =
    ['q', 'w', 'e', 'r', 't', 'y', 'a', 's', 'd', 'f', 'g', 'h'];

/// Discards the in-flight recording.
pub const QUIT_KEY: char = 'z';

/// Reserved for deletion; currently ignored.
pub const REMOVE_KEY: char = 'x';

/// The ordered key-slot table.
///
/// The Nth bound behavior gets the Nth symbol of [`BEHAVIOR_KEYS`]. The
/// slot cursor is owned here, per recorder, so independent sessions
/// cannot collide.
#[derive(Debug, Default)]
pub struct KeyMap {
    bindings: Vec<(char, String)>,
}

impl KeyMap {
    /// Create an empty key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the next free slot to `behavior`. Fails with
    /// `NoKeySlotAvailable` once all slots are taken.
    pub fn bind_next(&mut self, behavior: impl Into<String>) -> Result<char> {
        let Some(&key) = BEHAVIOR_KEYS.get(self.bindings.len()) else {
            return Err(EthogramError::NoKeySlotAvailable);
        };
        self.bindings.push((key, behavior.into()));
        Ok(key)
    }

    /// The behavior bound to `key`, if any.
    pub fn behavior_for(&self, key: char) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| name.as_str())
    }

    /// The key bound to `behavior`, if any.
    pub fn key_for(&self, behavior: &str) -> Option<char> {
        self.bindings
            .iter()
            .find(|(_, name)| name == behavior)
            .map(|(k, _)| *k)
    }

    /// All bindings, in slot order.
    pub fn bindings(&self) -> impl Iterator<Item = (char, &str)> {
        self.bindings.iter().map(|(k, name)| (*k, name.as_str()))
    }

    /// Whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.bindings.len() == BEHAVIOR_KEYS.len()
    }

    /// Number of bound slots.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no slots are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The one in-flight State recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecording {
    /// Key that opened the recording
    pub key: char,
    /// Behavior being recorded
    pub behavior: String,
    /// Frame at which the recording opened
    pub start_frame: u64,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing happened (quit while idle, or the reserved remove key).
    NoOp,
    /// An open recording was discarded without writing an interval.
    Cancelled { behavior: String },
    /// A State recording opened.
    Started { behavior: String, start_frame: u64 },
    /// An Event behavior was tagged at a single frame.
    EventMarked { behavior: String, frame: u64 },
    /// A State recording closed and its interval was written.
    IntervalClosed {
        behavior: String,
        start_frame: u64,
        end_frame: u64,
    },
}

/// The key-press state machine.
#[derive(Debug, Default)]
pub struct AnnotationRecorder {
    keys: KeyMap,
    pending: Option<PendingRecording>,
}

impl AnnotationRecorder {
    /// Create a recorder with no bindings and nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// The key-slot table.
    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }

    /// The in-flight State recording, if any.
    pub fn pending(&self) -> Option<&PendingRecording> {
        self.pending.as_ref()
    }

    /// Register a behavior and bind it to the next free key slot.
    ///
    /// Checks slot availability before touching the registry, so a full
    /// key table fails with `NoKeySlotAvailable` and registers nothing.
    pub fn register_and_bind(
        &mut self,
        registry: &mut AnnotationRegistry,
        def: BehaviorDef,
    ) -> Result<char> {
        if self.keys.is_full() {
            return Err(EthogramError::NoKeySlotAvailable);
        }
        let name = def.name.clone();
        registry.register(def)?;
        self.keys.bind_next(name)
    }

    /// Rebuild the key table from a registry, binding every behavior in
    /// registration order. Used after loading a document. Clears any
    /// pending recording.
    pub fn rebind_from(&mut self, registry: &AnnotationRegistry) -> Result<()> {
        let mut keys = KeyMap::new();
        for def in registry.behaviors() {
            keys.bind_next(def.name.clone())?;
        }
        self.keys = keys;
        self.pending = None;
        Ok(())
    }

    /// Process one key press at playback position `now`.
    ///
    /// On error nothing changes: `KeyMismatch` and `UnrecognizedKey`
    /// reject the press outright, and a failed interval write (for
    /// example a closing press behind the opening frame) keeps the
    /// recording open.
    pub fn handle_key(
        &mut self,
        key: char,
        now: u64,
        registry: &mut AnnotationRegistry,
    ) -> Result<KeyOutcome> {
        if key == QUIT_KEY {
            return Ok(match self.pending.take() {
                Some(pending) => {
                    debug!("recording of '{}' cancelled", pending.behavior);
                    KeyOutcome::Cancelled {
                        behavior: pending.behavior,
                    }
                }
                None => KeyOutcome::NoOp,
            });
        }
        if key == REMOVE_KEY {
            // Reserved for deletion semantics; accepted and ignored.
            return Ok(KeyOutcome::NoOp);
        }

        let behavior = self
            .keys
            .behavior_for(key)
            .ok_or(EthogramError::UnrecognizedKey(key))?
            .to_string();

        match &self.pending {
            Some(pending) if pending.key != key => Err(EthogramError::KeyMismatch {
                held: pending.key,
                pressed: key,
            }),
            Some(pending) => {
                let start_frame = pending.start_frame;
                registry.record_interval(&behavior, start_frame, Some(now))?;
                self.pending = None;
                Ok(KeyOutcome::IntervalClosed {
                    behavior,
                    start_frame,
                    end_frame: now,
                })
            }
            None => {
                let kind = registry
                    .behavior(&behavior)
                    .map(|def| def.kind)
                    .ok_or_else(|| EthogramError::UnknownBehavior(behavior.clone()))?;
                match kind {
                    BehaviorKind::Event => {
                        registry.record_interval(&behavior, now, Some(now))?;
                        Ok(KeyOutcome::EventMarked {
                            behavior,
                            frame: now,
                        })
                    }
                    BehaviorKind::State => {
                        self.pending = Some(PendingRecording {
                            key,
                            behavior: behavior.clone(),
                            start_frame: now,
                        });
                        Ok(KeyOutcome::Started {
                            behavior,
                            start_frame: now,
                        })
                    }
                }
            }
        }
    }
}
