//! Timeline store: keyframe storage, normalization and live-copy aliasing.
//!
//! All operations here work on a single actor plus the engine's global
//! sorted-unique keyframe id list; the engine wraps them with position
//! parsing, duration recomputation and cross-actor id release.
//!
//! Normalization keeps every keyframe state fully populated: missing
//! properties are forward-filled from the nearest earlier keyframe, falling
//! back to the actor's initial parameter bag. An inherited relative modifier
//! is rewritten to the no-op `+=0` so dynamic resolution sees a continuous
//! chain instead of a re-applied delta.

use marionette_api::{EngineError, ModifierOp, PropertyBag, PropertyValue};

use crate::actor::Actor;

pub(crate) fn insert_sorted_unique(list: &mut Vec<u32>, id: u32) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}

pub(crate) fn remove_sorted(list: &mut Vec<u32>, id: u32) {
    if let Ok(pos) = list.binary_search(&id) {
        list.remove(pos);
    }
}

/// Largest keyframe id at or before `frame`.
pub(crate) fn latest_at(ids: &[u32], frame: u32) -> Option<u32> {
    let idx = ids.partition_point(|&id| id <= frame);
    if idx == 0 {
        None
    } else {
        Some(ids[idx - 1])
    }
}

/// Store an authored keyframe state and re-derive the actor's normalized
/// timeline. Keyframe 0 is auto-created once any later keyframe exists.
/// Setting a keyframe over a live-copy target replaces the alias with
/// authored data.
pub(crate) fn set_keyframe(
    actor: &mut Actor,
    global_ids: &mut Vec<u32>,
    frame: u32,
    bag: PropertyBag,
) {
    if frame > 0 && !actor.originals.contains_key(&0) {
        actor.originals.insert(0, PropertyBag::new());
        insert_sorted_unique(&mut actor.frame_ids, 0);
        insert_sorted_unique(global_ids, 0);
    }
    actor.live_copies.remove(&frame);
    actor.originals.insert(frame, bag);
    insert_sorted_unique(&mut actor.frame_ids, frame);
    insert_sorted_unique(global_ids, frame);
    normalize_actor(actor);
}

/// Merge a partial state over the original (pre-normalization) keyframe and
/// re-derive. Disallowed on live-copy targets: copies are derived data.
pub(crate) fn update_keyframe(
    actor: &mut Actor,
    global_ids: &mut Vec<u32>,
    frame: u32,
    partial: PropertyBag,
) -> Result<(), EngineError> {
    if actor.live_copies.contains_key(&frame) {
        return Err(EngineError::InvalidOperation(format!(
            "keyframe {frame} is a live copy and cannot be edited directly"
        )));
    }
    let Some(original) = actor.originals.get(&frame) else {
        return Err(EngineError::NotFound(format!(
            "keyframe {frame} for actor {}",
            actor.id.0
        )));
    };
    let mut merged = original.clone();
    for (name, value) in partial {
        merged.insert(name, value);
    }
    set_keyframe(actor, global_ids, frame, merged);
    Ok(())
}

/// Remove the actor's state at `frame`, cascading away live copies sourced
/// from it. Returns every id dropped from this actor so the caller can
/// release ids no other actor uses. Removing keyframe 0 while later
/// keyframes exist resets it to an empty state instead, since keyframe 0
/// must exist for any populated timeline.
pub(crate) fn remove_keyframe(actor: &mut Actor, frame: u32) -> Result<Vec<u32>, EngineError> {
    if !actor.originals.contains_key(&frame) {
        return Err(EngineError::NotFound(format!(
            "keyframe {frame} for actor {}",
            actor.id.0
        )));
    }

    // Cascade through chains of copies sourced from removed frames.
    let mut dropped = vec![frame];
    let mut cursor = 0;
    while cursor < dropped.len() {
        let victim = dropped[cursor];
        for (&copy, &source) in actor.live_copies.iter() {
            if source == victim && !dropped.contains(&copy) {
                dropped.push(copy);
            }
        }
        cursor += 1;
    }

    for &id in &dropped {
        actor.originals.remove(&id);
        actor.normalized.remove(&id);
        actor.live_copies.remove(&id);
        remove_sorted(&mut actor.frame_ids, id);
        if actor.last_reached == Some(id) {
            actor.last_reached = None;
        }
    }

    if frame == 0 && !actor.frame_ids.is_empty() {
        actor.originals.insert(0, PropertyBag::new());
        insert_sorted_unique(&mut actor.frame_ids, 0);
        dropped.retain(|&id| id != 0);
    }

    normalize_actor(actor);
    Ok(dropped)
}

/// Record a live-copy alias: the state at `frame` tracks the source
/// keyframe. The alias entry is refreshed on every normalization pass, so
/// edits to the source propagate without the copy being touched.
pub(crate) fn live_copy(
    actor: &mut Actor,
    global_ids: &mut Vec<u32>,
    frame: u32,
    source: u32,
) -> Result<(), EngineError> {
    if frame == source {
        return Err(EngineError::InvalidOperation(format!(
            "keyframe {frame} cannot be a live copy of itself"
        )));
    }
    if !actor.originals.contains_key(&source) {
        return Err(EngineError::NotFound(format!(
            "live copy source keyframe {source} for actor {}",
            actor.id.0
        )));
    }
    if frame > 0 && !actor.originals.contains_key(&0) {
        actor.originals.insert(0, PropertyBag::new());
        insert_sorted_unique(&mut actor.frame_ids, 0);
        insert_sorted_unique(global_ids, 0);
    }
    actor.live_copies.insert(frame, source);
    actor.originals.entry(frame).or_default();
    insert_sorted_unique(&mut actor.frame_ids, frame);
    insert_sorted_unique(global_ids, frame);
    normalize_actor(actor);
    Ok(())
}

/// Rewrite values that must not be inherited verbatim: a modifier carried
/// forward would re-apply its delta, so it becomes `+=0`.
fn inherited(value: &PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Modifier(..) => PropertyValue::Modifier(ModifierOp::Add, 0.0),
        PropertyValue::Eased(name, inner) => {
            PropertyValue::Eased(name.clone(), Box::new(inherited(inner)))
        }
        other => other.clone(),
    }
}

/// Re-derive the normalized timeline from authored states. Runs the
/// fill/refresh pair twice so state inherited through a live copy sees the
/// copy's refreshed (source) state.
pub(crate) fn normalize_actor(actor: &mut Actor) {
    for _ in 0..2 {
        fill(actor);
        refresh_live_copies(actor);
    }
}

fn fill(actor: &mut Actor) {
    let mut carry = actor.params.clone();
    let mut normalized = std::collections::BTreeMap::new();
    for &fid in &actor.frame_ids {
        // Alias frames contribute their refreshed state from the previous
        // round; authored frames contribute their original bag.
        let authored: PropertyBag = if actor.live_copies.contains_key(&fid) {
            actor.normalized.get(&fid).cloned().unwrap_or_default()
        } else {
            actor.originals.get(&fid).cloned().unwrap_or_default()
        };
        let mut bag = PropertyBag::new();
        for (name, value) in carry.iter() {
            if !authored.contains_key(name) {
                bag.insert(name.clone(), inherited(value));
            }
        }
        for (name, value) in authored {
            bag.insert(name, value);
        }
        for (name, value) in bag.iter() {
            carry.insert(name.clone(), value.clone());
        }
        normalized.insert(fid, bag);
    }
    actor.normalized = normalized;
}

pub(crate) fn refresh_live_copies(actor: &mut Actor) {
    let copies: Vec<(u32, u32)> = actor.live_copies.iter().map(|(&c, &s)| (c, s)).collect();
    for (copy, source) in copies {
        if let Some(bag) = actor.normalized.get(&source).cloned() {
            actor.normalized.insert(copy, bag);
        }
    }
}
