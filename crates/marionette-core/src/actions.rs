//! One-shot tweens layered on top of keyframe state.
//!
//! Actions queue per actor, FIFO, one in flight at a time, and run on wall
//! clock (minus accumulated pause) rather than on the keyframe loop's
//! timing. On completion the resulting property bag is written back into the
//! actor's most-recently-reached keyframe so the mutation persists across
//! loops.

use std::collections::VecDeque;

use hashbrown::HashMap;
use marionette_api::{PropertyBag, PropertyValue, ResolvedValue, StateBag};

use crate::actor::Actor;
use crate::easing::EasingRegistry;
use crate::ids::ActorId;
use crate::resolve::{blend_value, resolve_targets};

pub type ActionHandler = Box<dyn FnOnce(ActorId)>;

/// Options accepted by `to()`.
#[derive(Default)]
pub struct ActionOpts {
    /// Easing applied to the whole action; per-property `Eased` targets win.
    pub easing: Option<String>,
    pub start: Option<ActionHandler>,
    pub complete: Option<ActionHandler>,
}

impl ActionOpts {
    pub fn easing(mut self, name: impl Into<String>) -> Self {
        self.easing = Some(name.into());
        self
    }

    pub fn on_start(mut self, f: impl FnOnce(ActorId) + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(ActorId) + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

pub(crate) struct ImmediateAction {
    pub duration: u32,
    pub targets: PropertyBag,
    pub easing: Option<String>,
    pub start: Option<ActionHandler>,
    pub complete: Option<ActionHandler>,

    // Runtime fields, filled on first evaluation.
    pub started_at: Option<f64>,
    pub pause_buffer: f64,
    pub from: StateBag,
    pub to: StateBag,
    pub prop_easing: HashMap<String, String>,
    pub force_stop: bool,
}

impl ImmediateAction {
    pub(crate) fn new(duration: u32, targets: PropertyBag, opts: ActionOpts) -> Self {
        Self {
            duration,
            targets,
            easing: opts.easing,
            start: opts.start,
            complete: opts.complete,
            started_at: None,
            pause_buffer: 0.0,
            from: StateBag::new(),
            to: StateBag::new(),
            prop_easing: HashMap::new(),
            force_stop: false,
        }
    }

    #[inline]
    pub(crate) fn started(&self) -> bool {
        self.started_at.is_some()
    }
}

#[derive(Default)]
pub(crate) struct ActionQueue {
    items: VecDeque<ImmediateAction>,
}

impl ActionQueue {
    pub fn enqueue(&mut self, action: ImmediateAction) {
        self.items.push_back(action);
    }

    pub fn head_mut(&mut self) -> Option<&mut ImmediateAction> {
        self.items.front_mut()
    }

    pub fn pop(&mut self) -> Option<ImmediateAction> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Remove everything except an action already in flight.
    pub fn clear(&mut self) {
        let keep = self.items.pop_front().filter(ImmediateAction::started);
        self.items.clear();
        if let Some(action) = keep {
            self.items.push_back(action);
        }
    }

    /// Drop all queued state including the in-flight action.
    pub fn flush(&mut self) {
        self.items.clear();
    }

    /// Force the current action to its terminal duration on next evaluation
    /// rather than removing it, preserving completion-handler semantics.
    pub fn end_current(&mut self) {
        if let Some(action) = self.items.front_mut() {
            action.force_stop = true;
        }
    }

    /// End the current action and drop the rest of the queue.
    pub fn skip_to_end(&mut self) {
        self.clear();
        self.end_current();
    }

    /// Playback resumed after `ms` of pause; the in-flight action discounts
    /// it from its elapsed time.
    pub fn add_pause(&mut self, ms: f64) {
        if let Some(action) = self.items.front_mut() {
            if action.started() {
                action.pause_buffer += ms;
            }
        }
    }
}

/// Evaluate the actor's in-flight action against `base`, the freshly
/// interpolated keyframe state. Overrides the targeted properties, fires
/// start/complete handlers, and on completion persists the final bag into
/// the most recently reached keyframe.
pub(crate) fn apply_actions(
    actor: &mut Actor,
    easings: &EasingRegistry,
    frames_per_second: u32,
    now: f64,
    base: &mut StateBag,
) {
    let actor_id = actor.id;
    let Some(action) = actor.queue.head_mut() else {
        return;
    };

    if !action.started() {
        action.started_at = Some(now);
        action.from = base.clone();
        let (resolved, prop_easing) = resolve_targets(&action.targets, base);
        // toState is the snapshot merged with the resolved targets
        let mut to = base.clone();
        for (name, value) in resolved {
            to.insert(name, value);
        }
        action.to = to;
        action.prop_easing = prop_easing;
        if let Some(handler) = action.start.take() {
            handler(actor_id);
        }
    }

    let duration = action.duration.max(1) as f64;
    let started_at = action.started_at.unwrap_or(now);
    let mut elapsed = (now - started_at - action.pause_buffer) * frames_per_second as f64 / 1000.0;
    if action.force_stop {
        elapsed = duration;
    }
    let t = elapsed.clamp(0.0, duration);
    let fallback = action.easing.as_deref().unwrap_or("linear");

    for (name, to_v) in action.to.iter() {
        let Some(from_v) = action.from.get(name) else {
            continue;
        };
        let ease_name = action.prop_easing.get(name).map(String::as_str).unwrap_or(fallback);
        let formula = easings.get(ease_name);
        base.insert(
            name.clone(),
            blend_value(formula, t, *from_v, Some(*to_v), duration),
        );
    }

    if elapsed >= duration {
        let final_values: Vec<(String, ResolvedValue)> = action
            .to
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let complete = action.complete.take();

        let write_frame = actor
            .last_reached
            .or_else(|| actor.frame_ids.first().copied());
        if let Some(frame) = write_frame {
            if let Some(bag) = actor.normalized.get_mut(&frame) {
                for (name, value) in &final_values {
                    bag.insert(name.clone(), PropertyValue::from(*value));
                    // keep segment continuity for dynamic followers
                    actor.cache.from.insert(name.clone(), *value);
                    base.insert(name.clone(), *value);
                }
            }
        }
        actor.queue.pop();
        if let Some(handler) = complete {
            handler(actor_id);
        }
    }
}
