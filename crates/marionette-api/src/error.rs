//! Error taxonomy for timeline and actor mutations.
//!
//! Every mutating operation validates before it writes, so a returned error
//! always means the engine state is unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Negative frame index, unparseable time literal, unknown time unit, or
    /// a malformed value literal (color/modifier) in authored data.
    #[error("invalid keyframe identifier: {0}")]
    InvalidKeyframe(String),

    /// The referenced actor, keyframe, live-copy source or puppet does not
    /// exist. The operation is a no-op.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is structurally disallowed, e.g. editing a live-copy
    /// target directly or moving an actor to an out-of-range layer.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
