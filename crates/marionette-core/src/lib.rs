//! Marionette core: a time-driven keyframe animation engine.
//!
//! Actors (named drawable entities with numeric/color properties) hold
//! keyframes on a shared timeline; the engine continuously computes each
//! actor's interpolated property set for "now" and hands it to a
//! caller-supplied draw routine against an abstract [`Surface`]. The engine
//! knows nothing about pixels; it computes numbers, colors and timing.

pub mod actions;
pub mod actor;
pub mod clock;
pub mod config;
pub mod easing;
pub mod engine;
pub mod events;
pub mod ids;
pub mod puppet;
pub mod resolve;
pub mod stored_timeline;
pub mod surface;
pub mod timeline;

// Re-exports for consumers (hosts and actor authors)
pub use actions::ActionOpts;
pub use actor::{Actor, ActorSpec};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use easing::{EasingFn, EasingRegistry};
pub use engine::{ActorHandle, Engine, PlaybackState};
pub use events::{EngineEvent, HandlerId};
pub use ids::ActorId;
pub use puppet::PuppetCues;
pub use stored_timeline::{parse_stored_timeline_json, StoredTimeline};
pub use surface::{DrawContext, DrawRoutine, NullSurface, Surface};

pub use marionette_api::{
    Color, ComputedFn, EngineError, KeyframePosition, ModifierOp, PropertyBag, PropertyValue,
    ResolvedValue, StateBag,
};
