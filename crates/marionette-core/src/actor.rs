//! Actors: named drawable entities with keyframed properties.
//!
//! An actor owns its authored and normalized keyframe states, its immediate
//! action queue and its per-segment resolution cache. Timeline mutations live
//! in [`crate::timeline`]; per-frame state computation in [`crate::resolve`].

use std::collections::BTreeMap;

use hashbrown::HashMap;
use marionette_api::{PropertyBag, ResolvedValue, StateBag};
use serde_json::Value as JsonValue;

use crate::actions::ActionQueue;
use crate::ids::ActorId;
use crate::resolve::SegmentCache;
use crate::surface::DrawRoutine;

/// Everything needed to create an actor.
pub struct ActorSpec {
    /// Initial parameter bag; the fallback source for keyframe normalization.
    pub params: PropertyBag,
    /// Actor-level easing, overridable per property.
    pub easing: String,
    /// Arbitrary user data exposed to the draw routine.
    pub data: JsonValue,
    pub draw: Option<DrawRoutine>,
}

impl Default for ActorSpec {
    fn default() -> Self {
        Self {
            params: PropertyBag::new(),
            easing: "linear".to_string(),
            data: JsonValue::Null,
            draw: None,
        }
    }
}

pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) params: PropertyBag,
    /// As-authored keyframe states, pre-normalization.
    pub(crate) originals: BTreeMap<u32, PropertyBag>,
    /// Fully populated keyframe states.
    pub(crate) normalized: BTreeMap<u32, PropertyBag>,
    /// This actor's keyframe ids, ascending; a subsequence of the global list.
    pub(crate) frame_ids: Vec<u32>,
    /// copy id -> source id
    pub(crate) live_copies: HashMap<u32, u32>,
    pub(crate) easing: String,
    pub(crate) queue: ActionQueue,
    pub(crate) cache: SegmentCache,
    /// Latest own keyframe confirmed reached in the current loop.
    pub(crate) last_reached: Option<u32>,
    /// Interpolated state as of the last tick or seek.
    pub(crate) state: StateBag,
    pub(crate) data: JsonValue,
    pub(crate) draw: Option<DrawRoutine>,
}

impl Actor {
    pub(crate) fn new(id: ActorId, spec: ActorSpec) -> Self {
        Self {
            id,
            params: spec.params,
            originals: BTreeMap::new(),
            normalized: BTreeMap::new(),
            frame_ids: Vec::new(),
            live_copies: HashMap::new(),
            easing: spec.easing,
            queue: ActionQueue::default(),
            cache: SegmentCache::default(),
            last_reached: None,
            state: StateBag::new(),
            data: spec.data,
            draw: spec.draw,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn initial_params(&self) -> &PropertyBag {
        &self.params
    }

    pub fn keyframe_ids(&self) -> &[u32] {
        &self.frame_ids
    }

    /// The normalized state stored at one of this actor's keyframes.
    pub fn keyframe_state(&self, frame: u32) -> Option<&PropertyBag> {
        self.normalized.get(&frame)
    }

    /// Interpolated state as of the last tick or seek.
    pub fn state(&self) -> &StateBag {
        &self.state
    }

    pub fn get(&self, property: &str) -> Option<ResolvedValue> {
        self.state.get(property).copied()
    }

    pub fn data(&self) -> &JsonValue {
        &self.data
    }

    #[inline]
    pub(crate) fn owns_frame(&self, frame: u32) -> bool {
        self.frame_ids.binary_search(&frame).is_ok()
    }

    /// The keyframe segment bracketing `frame`: the nearest own keyframe at
    /// or before it, and the nearest one after it (or the same id when the
    /// actor's timeline has ended).
    pub(crate) fn bracket(&self, frame: u32) -> Option<(u32, u32)> {
        let idx = self.frame_ids.partition_point(|&id| id <= frame);
        if idx == 0 {
            return self.frame_ids.first().map(|&f| (f, f));
        }
        let from = self.frame_ids[idx - 1];
        let to = self.frame_ids.get(idx).copied().unwrap_or(from);
        Some((from, to))
    }
}
