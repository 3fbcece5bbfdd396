//! Dynamic-property resolution and per-segment interpolation.
//!
//! Endpoint values resolve through a per-actor from/to cache. The cache is
//! valid for one keyframe segment only; crossing into the next segment
//! rotates it (the resolved "to" endpoint becomes the new "from") so that
//! dynamic values stay continuous instead of being re-evaluated, which would
//! change their meaning.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use marionette_api::{Color, PropertyBag, PropertyValue, ResolvedValue, StateBag};

use crate::actor::Actor;
use crate::easing::{EasingFn, EasingRegistry};

/// Computed-property chains are cut off at this depth.
const MAX_RESOLVE_DEPTH: u32 = 8;

/// Memoized resolved endpoints for the current keyframe segment.
#[derive(Clone, Debug, Default)]
pub struct SegmentCache {
    pub(crate) from: StateBag,
    pub(crate) to: StateBag,
}

impl SegmentCache {
    pub(crate) fn rotate(&mut self) {
        self.from = std::mem::take(&mut self.to);
    }

    pub(crate) fn clear(&mut self) {
        self.from.clear();
        self.to.clear();
    }
}

/// Resolve one authored value to a concrete one. `previous` supplies the
/// base a modifier consumes; `state` is handed to computed callbacks.
pub(crate) fn resolve_value(
    value: &PropertyValue,
    previous: Option<ResolvedValue>,
    state: &StateBag,
    depth: u32,
) -> Option<ResolvedValue> {
    if depth > MAX_RESOLVE_DEPTH {
        return None;
    }
    match value {
        PropertyValue::Number(n) => Some(ResolvedValue::Number(*n)),
        PropertyValue::Color(c) => Some(ResolvedValue::Color(*c)),
        PropertyValue::Eased(_, inner) => resolve_value(inner, previous, state, depth + 1),
        PropertyValue::Computed(f) => resolve_value(&f.call(state), previous, state, depth + 1),
        PropertyValue::Modifier(op, operand) => match previous? {
            ResolvedValue::Number(prev) => Some(ResolvedValue::Number(op.apply(prev, *operand))),
            // modifiers only shift numbers; a color base passes through
            held @ ResolvedValue::Color(_) => Some(held),
        },
    }
}

/// Walk the actor's keyframe history backward from (excluding) `frame` to
/// the nearest concrete value for the property, then re-apply intervening
/// modifiers in order. Falls back to the initial parameter bag. This is the
/// cold path; within a segment the from/to cache answers instead.
pub(crate) fn previous_value(
    normalized: &BTreeMap<u32, PropertyBag>,
    params: &PropertyBag,
    name: &str,
    frame: u32,
) -> Option<ResolvedValue> {
    let empty = StateBag::new();
    let mut pending: Vec<&PropertyValue> = Vec::new();
    let mut base: Option<ResolvedValue> = None;
    for (_, bag) in normalized.range(..frame).rev() {
        let Some(mut value) = bag.get(name) else {
            continue;
        };
        while let PropertyValue::Eased(_, inner) = value {
            value = &**inner;
        }
        match value {
            PropertyValue::Modifier(..) => pending.push(value),
            concrete => {
                base = resolve_value(concrete, None, &empty, 0);
                break;
            }
        }
    }
    if base.is_none() {
        if let Some(v) = params.get(name) {
            base = resolve_value(v, None, &empty, 0);
        }
    }
    let mut acc = base?;
    for modifier in pending.into_iter().rev() {
        acc = resolve_value(modifier, Some(acc), &empty, 0)?;
    }
    Some(acc)
}

/// Interpolate one resolved value pair. Type mismatches hold the from value.
pub(crate) fn blend_value(
    formula: EasingFn,
    elapsed: f64,
    from: ResolvedValue,
    to: Option<ResolvedValue>,
    duration: f64,
) -> ResolvedValue {
    match (from, to) {
        (ResolvedValue::Number(a), Some(ResolvedValue::Number(b))) => {
            ResolvedValue::Number(formula(elapsed, a, b - a, duration))
        }
        (ResolvedValue::Color(a), Some(ResolvedValue::Color(b))) => {
            ResolvedValue::Color(blend_color(formula, elapsed, a, b, duration))
        }
        (held, _) => held,
    }
}

/// Channels ease independently and floor to integers.
fn blend_color(formula: EasingFn, elapsed: f64, from: Color, to: Color, duration: f64) -> Color {
    let fa = from.channels();
    let ta = to.channels();
    let mut out = [0u8; 3];
    for i in 0..3 {
        let eased = formula(elapsed, fa[i] as f64, ta[i] as f64 - fa[i] as f64, duration);
        out[i] = eased.floor().clamp(0.0, 255.0) as u8;
    }
    Color(out)
}

/// Compute the interpolated state for `frame` within the actor's keyframe
/// segment `[from_id, to_id]`.
pub(crate) fn interpolated_state(
    actor: &mut Actor,
    easings: &EasingRegistry,
    from_id: u32,
    to_id: u32,
    frame: u32,
) -> StateBag {
    let Actor {
        normalized,
        params,
        cache,
        easing,
        ..
    } = actor;
    let (Some(from_bag), Some(to_bag)) = (normalized.get(&from_id), normalized.get(&to_id)) else {
        return StateBag::new();
    };

    // From endpoint, cache-first. Only dynamic values are memoized; statics
    // are cheap to re-read.
    let mut from_state = StateBag::new();
    for (name, value) in from_bag.iter() {
        let resolved = match cache.from.get(name).copied() {
            Some(hit) => Some(hit),
            None => {
                let previous = previous_value(normalized, params, name, from_id);
                let r = resolve_value(value, previous, &from_state, 0);
                if let Some(r) = r {
                    if value.is_dynamic() {
                        cache.from.insert(name.clone(), r);
                    }
                }
                r
            }
        };
        if let Some(r) = resolved {
            from_state.insert(name.clone(), r);
        }
    }

    // To endpoint: modifiers consume the resolved from value, keeping each
    // evaluation anchored to the previous resolved state.
    let to_state = if to_id == from_id {
        from_state.clone()
    } else {
        let mut to_state = StateBag::new();
        for (name, value) in to_bag.iter() {
            let resolved = match cache.to.get(name).copied() {
                Some(hit) => Some(hit),
                None => {
                    let previous = from_state
                        .get(name)
                        .copied()
                        .or_else(|| previous_value(normalized, params, name, to_id));
                    let r = resolve_value(value, previous, &from_state, 0);
                    if let Some(r) = r {
                        if value.is_dynamic() {
                            cache.to.insert(name.clone(), r);
                        }
                    }
                    r
                }
            };
            if let Some(r) = resolved {
                to_state.insert(name.clone(), r);
            }
        }
        to_state
    };

    let duration = (to_id.saturating_sub(from_id)).max(1) as f64;
    let elapsed = frame.saturating_sub(from_id) as f64;
    let mut out = StateBag::new();
    for (name, from_v) in from_state.iter() {
        // Per-property easing override on either endpoint beats the
        // actor-level easing; the to endpoint wins between the two.
        let ease_name = to_bag
            .get(name)
            .and_then(|v| v.easing())
            .or_else(|| from_bag.get(name).and_then(|v| v.easing()))
            .unwrap_or(easing.as_str());
        let formula = easings.get(ease_name);
        let v = blend_value(formula, elapsed, *from_v, to_state.get(name).copied(), duration);
        out.insert(name.clone(), v);
    }
    out
}

/// Resolve an action's target bag against a base state (the action's
/// snapshotted "from"). Also collects per-property easing overrides.
pub(crate) fn resolve_targets(
    targets: &PropertyBag,
    base: &StateBag,
) -> (StateBag, HashMap<String, String>) {
    let mut out = StateBag::new();
    let mut easings = HashMap::new();
    for (name, value) in targets.iter() {
        if let Some(e) = value.easing() {
            easings.insert(name.clone(), e.to_string());
        }
        let previous = base.get(name).copied();
        if let Some(r) = resolve_value(value, previous, base, 0) {
            out.insert(name.clone(), r);
        }
    }
    (out, easings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_api::ModifierOp;

    fn bag(entries: &[(&str, PropertyValue)]) -> PropertyBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn previous_value_walks_modifier_chain() {
        let mut normalized = BTreeMap::new();
        normalized.insert(0, bag(&[("x", 10.0.into())]));
        normalized.insert(10, bag(&[("x", PropertyValue::Modifier(ModifierOp::Add, 5.0))]));
        let params = PropertyBag::new();

        let at10 = previous_value(&normalized, &params, "x", 10).unwrap();
        assert_eq!(at10, ResolvedValue::Number(10.0));
        let at20 = previous_value(&normalized, &params, "x", 20).unwrap();
        assert_eq!(at20, ResolvedValue::Number(15.0));
    }

    #[test]
    fn previous_value_falls_back_to_params() {
        let normalized = BTreeMap::new();
        let params = bag(&[("x", 7.0.into())]);
        assert_eq!(
            previous_value(&normalized, &params, "x", 5),
            Some(ResolvedValue::Number(7.0))
        );
        assert_eq!(previous_value(&normalized, &params, "y", 5), None);
    }

    #[test]
    fn rotate_moves_to_into_from() {
        let mut cache = SegmentCache::default();
        cache.to.insert("x".into(), ResolvedValue::Number(3.0));
        cache.rotate();
        assert_eq!(cache.from.get("x"), Some(&ResolvedValue::Number(3.0)));
        assert!(cache.to.is_empty());
    }

    #[test]
    fn blend_holds_on_type_mismatch() {
        let held = blend_value(
            crate::easing::linear,
            5.0,
            ResolvedValue::Number(4.0),
            Some(ResolvedValue::Color(Color::new(0, 0, 0))),
            10.0,
        );
        assert_eq!(held, ResolvedValue::Number(4.0));
    }

    #[test]
    fn color_channels_floor() {
        let mid = blend_value(
            crate::easing::linear,
            5.0,
            ResolvedValue::Color(Color::new(0, 0, 0)),
            Some(ResolvedValue::Color(Color::new(255, 255, 255))),
            10.0,
        );
        assert_eq!(mid, ResolvedValue::Color(Color::new(127, 127, 127)));
    }

    #[test]
    fn computed_values_resolve_against_state() {
        let mut base = StateBag::new();
        base.insert("x".into(), ResolvedValue::Number(3.0));
        let targets = bag(&[(
            "y",
            PropertyValue::computed(|s| {
                let x = s.get("x").and_then(|v| v.as_number()).unwrap_or(0.0);
                PropertyValue::Number(x * 10.0)
            }),
        )]);
        let (resolved, _) = resolve_targets(&targets, &base);
        assert_eq!(resolved.get("y"), Some(&ResolvedValue::Number(30.0)));
    }
}
