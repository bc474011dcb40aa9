//! Error types for Ethogram Studio.

use thiserror::Error;

/// Main error type for Ethogram operations.
#[derive(Error, Debug)]
pub enum EthogramError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame {frame} out of range for a video of {total} frames")]
    OutOfRange { frame: i64, total: u64 },

    #[error("key '{pressed}' pressed while recording '{held}'; quit the open recording first")]
    KeyMismatch { held: char, pressed: char },

    #[error("key '{0}' is not bound to a behavior")]
    UnrecognizedKey(char),

    #[error("behavior '{0}' already exists")]
    DuplicateBehavior(String),

    #[error("behavior '{0}' does not exist")]
    UnknownBehavior(String),

    #[error("all behavior key slots are in use")]
    NoKeySlotAvailable,

    #[error("interval end {end} precedes start {start}")]
    InvalidInterval { start: u64, end: u64 },

    #[error("malformed annotation document: {0}")]
    MalformedDocument(String),

    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

/// Result type alias for Ethogram operations.
pub type Result<T> = std::result::Result<T, EthogramError>;
