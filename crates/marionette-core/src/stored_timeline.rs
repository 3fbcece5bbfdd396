//! Stored-timeline documents: author timelines as JSON and attach draw
//! routines afterwards.
//!
//! The document shape mirrors what authoring tools emit: actors with initial
//! params and a list of keyframes whose values are numbers, color strings or
//! modifier strings. Positions are frame indices or time literals
//! (`"1.5s"`, `"500ms"`). Per-keyframe `easing` maps attach per-property
//! overrides.
//!
//! The whole document is validated before any engine mutation, so a bad
//! literal never leaves a half-loaded timeline behind.

use hashbrown::HashMap;
use marionette_api::{EngineError, KeyframePosition, PropertyBag, PropertyValue};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::actor::ActorSpec;
use crate::engine::Engine;
use crate::ids::ActorId;

#[derive(Debug, Deserialize)]
pub struct StoredTimeline {
    pub name: String,
    #[serde(default)]
    pub actors: Vec<StoredActor>,
}

#[derive(Debug, Deserialize)]
pub struct StoredActor {
    pub name: String,
    #[serde(default)]
    pub easing: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, RawValue>,
    #[serde(default)]
    pub keyframes: Vec<StoredKeyframe>,
    #[serde(default)]
    pub data: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct StoredKeyframe {
    pub at: RawPosition,
    #[serde(default)]
    pub state: HashMap<String, RawValue>,
    /// Per-property easing overrides for this keyframe.
    #[serde(default)]
    pub easing: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPosition {
    Frame(u32),
    Literal(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Literal(String),
}

pub fn parse_stored_timeline_json(s: &str) -> Result<StoredTimeline, EngineError> {
    serde_json::from_str(s)
        .map_err(|e| EngineError::InvalidOperation(format!("stored timeline parse error: {e}")))
}

fn to_position(raw: &RawPosition) -> Result<KeyframePosition, EngineError> {
    match raw {
        RawPosition::Frame(f) => Ok((*f).into()),
        RawPosition::Literal(s) => s.parse(),
    }
}

fn to_bag(
    raw: &HashMap<String, RawValue>,
    easing: &HashMap<String, String>,
) -> Result<PropertyBag, EngineError> {
    let mut bag = PropertyBag::new();
    for (name, value) in raw {
        let mut v = match value {
            RawValue::Number(n) => PropertyValue::Number(*n),
            RawValue::Literal(s) => s.parse()?,
        };
        if let Some(e) = easing.get(name) {
            v = PropertyValue::Eased(e.clone(), Box::new(v));
        }
        bag.insert(name.clone(), v);
    }
    Ok(bag)
}

impl Engine {
    /// Instantiate every actor in the document. Returns name → id so draw
    /// routines can be attached afterwards via
    /// [`crate::engine::ActorHandle::set_draw`].
    pub fn load_stored_timeline(
        &mut self,
        doc: &StoredTimeline,
    ) -> Result<HashMap<String, ActorId>, EngineError> {
        let fps = self.frames_per_second();
        let no_easing = HashMap::new();

        // Validate everything up front; mutation below cannot fail.
        let mut prepared = Vec::with_capacity(doc.actors.len());
        for actor in &doc.actors {
            let params = to_bag(&actor.params, &no_easing)?;
            let mut keyframes = Vec::with_capacity(actor.keyframes.len());
            for kf in &actor.keyframes {
                let frame = to_position(&kf.at)?.to_frame(fps)?;
                let bag = to_bag(&kf.state, &kf.easing)?;
                keyframes.push((frame, bag));
            }
            prepared.push((actor, params, keyframes));
        }

        let mut out = HashMap::new();
        for (actor, params, keyframes) in prepared {
            let id = self.add(ActorSpec {
                params,
                easing: actor.easing.clone().unwrap_or_else(|| "linear".to_string()),
                data: actor.data.clone(),
                draw: None,
            });
            for (frame, bag) in keyframes {
                self.set_keyframe_for(id, frame.into(), bag)?;
            }
            out.insert(actor.name.clone(), id);
        }
        Ok(out)
    }
}
