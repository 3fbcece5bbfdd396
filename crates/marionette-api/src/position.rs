//! Keyframe positions: raw frame indices and time literals.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A point on the shared timeline, either as a concrete frame index or as a
/// wall-clock literal that is converted against the engine's frame rate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KeyframePosition {
    Frame(u32),
    Seconds(f64),
    Millis(f64),
}

impl KeyframePosition {
    /// Resolve to a concrete frame index at the given frame rate.
    pub fn to_frame(self, frames_per_second: u32) -> Result<u32, EngineError> {
        let fps = frames_per_second as f64;
        match self {
            KeyframePosition::Frame(f) => Ok(f),
            KeyframePosition::Seconds(s) if s >= 0.0 => Ok((s * fps).round() as u32),
            KeyframePosition::Millis(ms) if ms >= 0.0 => Ok((ms * fps / 1000.0).round() as u32),
            other => Err(EngineError::InvalidKeyframe(format!(
                "negative time literal {other:?}"
            ))),
        }
    }
}

impl From<u32> for KeyframePosition {
    fn from(frame: u32) -> Self {
        Self::Frame(frame)
    }
}

impl FromStr for KeyframePosition {
    type Err = EngineError;

    /// Accepts `"120"` (frame index), `"1.5s"` and `"500ms"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Some(num) = t.strip_suffix("ms") {
            let ms: f64 = num.trim().parse().map_err(|_| {
                EngineError::InvalidKeyframe(format!("unparseable time literal '{s}'"))
            })?;
            return Ok(Self::Millis(ms));
        }
        if let Some(num) = t.strip_suffix('s') {
            let secs: f64 = num.trim().parse().map_err(|_| {
                EngineError::InvalidKeyframe(format!("unparseable time literal '{s}'"))
            })?;
            return Ok(Self::Seconds(secs));
        }
        if let Ok(frame) = t.parse::<u32>() {
            return Ok(Self::Frame(frame));
        }
        Err(EngineError::InvalidKeyframe(format!(
            "unparseable keyframe position '{s}'"
        )))
    }
}
