//! Rendering-surface contract.
//!
//! The engine computes values and timing only; everything pixel-shaped lives
//! behind [`Surface`], implemented by the host binding. Draw routines receive
//! the surface together with a read-only [`DrawContext`] carrying the
//! interpolated state.

use marionette_api::StateBag;
use serde_json::Value as JsonValue;

use crate::ids::ActorId;

pub trait Surface {
    /// Erase the drawable area.
    fn clear(&mut self);

    /// Apply a named style to the backing element. Bindings without styling
    /// ignore this.
    fn set_style(&mut self, _name: &str, _value: &str) {}
}

/// A surface that draws nothing. Useful for headless runs, tests, and
/// driving puppets without a host surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn clear(&mut self) {}
}

/// Read-only view handed to a draw routine once per visible actor per tick.
pub struct DrawContext<'a> {
    pub actor: ActorId,
    /// The frame the engine resolved for this tick.
    pub frame: u32,
    pub frames_per_second: u32,
    /// Fully interpolated property set for "now".
    pub state: &'a StateBag,
    /// Arbitrary user data attached to the actor.
    pub data: &'a JsonValue,
}

pub type DrawRoutine = Box<dyn FnMut(&mut dyn Surface, &DrawContext<'_>)>;
