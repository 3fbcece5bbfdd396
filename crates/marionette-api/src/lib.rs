//! marionette-api: the value model shared by the marionette engine and by
//! actor authors (draw routines, computed properties, stored timelines).
//!
//! Everything here is engine-agnostic data: colors, keyframe positions,
//! property values and the error taxonomy. The engine itself lives in
//! `marionette-core`.

pub mod color;
pub mod error;
pub mod position;
pub mod value;

pub use color::Color;
pub use error::EngineError;
pub use position::KeyframePosition;
pub use value::{
    ComputedFn, ModifierOp, PropertyBag, PropertyValue, ResolvedValue, StateBag,
};
