//! Sub-timeline composition.
//!
//! A puppet is a full nested engine instance sharing the host's frame rate
//! and surface but never self-scheduling: the owner forwards its own ticks
//! and translates owner-frame thresholds (cues) into puppet play/stop calls.

use serde::{Deserialize, Serialize};

/// Owner-frame thresholds driving a puppet's playback.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PuppetCues {
    /// Owner frames at which the puppet starts playing.
    #[serde(default)]
    pub start_at: Vec<u32>,
    /// Owner frames at which the puppet stops.
    #[serde(default)]
    pub stop_at: Vec<u32>,
}

impl PuppetCues {
    pub fn start_at(mut self, frame: u32) -> Self {
        self.start_at.push(frame);
        self
    }

    pub fn stop_at(mut self, frame: u32) -> Self {
        self.stop_at.push(frame);
        self
    }
}

/// Whether any cue lies in the owner-frame interval crossed this tick.
/// `prev` is `None` on the first tick of a loop, which makes frame-0 cues
/// fire when playback begins.
pub(crate) fn cue_crossed(cues: &[u32], prev: Option<u32>, current: u32) -> bool {
    cues.iter().any(|&cue| match prev {
        None => cue <= current,
        Some(p) => p < cue && cue <= current,
    })
}
