//! Engine construction configuration.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Recognized construction options, mirroring what hosts pass when they
/// create an engine instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeline resolution in frames per second. Must be positive.
    pub frames_per_second: u32,
    /// Clear the surface at the start of every tick.
    pub autoclear: bool,
    /// Clear the surface when playback is stopped.
    pub clear_on_stop: bool,
    /// Clear the surface when a repeat/iterate budget is exhausted.
    pub clear_on_complete: bool,
    /// Styles applied to the backing surface element on first use.
    pub styles: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30,
            autoclear: true,
            clear_on_stop: false,
            clear_on_complete: false,
            styles: HashMap::new(),
        }
    }
}
