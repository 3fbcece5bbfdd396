//! Engine: timeline ownership, the tick driver and the public API.
//!
//! One engine instance owns its actors, the global keyframe id list and the
//! playback clock fields. Scheduling is cooperative and single-threaded:
//! hosts either call [`Engine::tick`] from their own loop or use
//! [`Engine::run`], a best-effort realtime loop. Exactly one tick is ever in
//! flight; every mutation API runs synchronously between ticks, so no tick
//! observes a partially updated timeline.

use hashbrown::HashMap;
use log::{debug, warn};
use marionette_api::{EngineError, KeyframePosition, PropertyBag, ResolvedValue, StateBag};
use serde_json::Value as JsonValue;

use crate::actions::{self, ActionOpts, ImmediateAction};
use crate::actor::{Actor, ActorSpec};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::easing::EasingRegistry;
use crate::events::{EngineEvent, EventRegistry, HandlerId};
use crate::ids::{ActorId, IdAllocator};
use crate::puppet::{cue_crossed, PuppetCues};
use crate::resolve;
use crate::surface::{DrawContext, DrawRoutine, Surface};
use crate::timeline;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

pub(crate) struct Puppet {
    pub engine: Engine,
    pub cues: PuppetCues,
}

pub struct Engine {
    cfg: EngineConfig,
    clock: Box<dyn Clock>,
    ids: IdAllocator,

    actors: HashMap<ActorId, Actor>,
    /// Actor ids in layer order, back to front.
    draw_order: Vec<ActorId>,
    /// Global sorted-unique keyframe id list.
    frame_ids: Vec<u32>,

    fps: u32,
    /// Total loop duration in milliseconds: `last_frame * 1000 / fps`.
    duration_ms: f64,

    state: PlaybackState,
    /// First-ever play time; the anchor grid for drift-free loop restarts.
    start_time: Option<f64>,
    loop_start_time: f64,
    paused_at: f64,
    current_frame: u32,
    prev_frame: Option<u32>,
    /// Keyframe ids confirmed visited this loop, in increasing order.
    reached: Vec<u32>,

    loops_remaining: Option<u32>,
    on_complete: Option<Box<dyn FnOnce(&Engine)>>,

    easings: EasingRegistry,
    events: EventRegistry<Engine>,
    puppets: HashMap<String, Puppet>,
    styles_applied: bool,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self::with_clock(cfg, Box::new(SystemClock::new()))
    }

    /// Create an engine driven by a caller-supplied clock, e.g. a
    /// [`crate::clock::ManualClock`] for deterministic stepping.
    pub fn with_clock(cfg: EngineConfig, clock: Box<dyn Clock>) -> Self {
        let fps = cfg.frames_per_second.max(1);
        Self {
            cfg,
            clock,
            ids: IdAllocator::new(),
            actors: HashMap::new(),
            draw_order: Vec::new(),
            frame_ids: Vec::new(),
            fps,
            duration_ms: 0.0,
            state: PlaybackState::Stopped,
            start_time: None,
            loop_start_time: 0.0,
            paused_at: 0.0,
            current_frame: 0,
            prev_frame: None,
            reached: Vec::new(),
            loops_remaining: None,
            on_complete: None,
            easings: EasingRegistry::new(),
            events: EventRegistry::new(),
            puppets: HashMap::new(),
            styles_applied: false,
        }
    }

    // ---- introspection -------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn playback(&self) -> PlaybackState {
        self.state
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Keyframe ids confirmed visited in the current loop iteration.
    pub fn reached_keyframes(&self) -> &[u32] {
        &self.reached
    }

    /// The global sorted-unique keyframe id list.
    pub fn frame_ids(&self) -> &[u32] {
        &self.frame_ids
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// The wall-clock anchor of the current loop iteration, in clock
    /// milliseconds. Stays on the `start + k * duration` grid across
    /// restarts.
    pub fn loop_start_ms(&self) -> f64 {
        self.loop_start_time
    }

    /// Snapshot of every actor's current interpolated state.
    pub fn state(&self) -> HashMap<ActorId, StateBag> {
        self.actors
            .iter()
            .map(|(&id, actor)| (id, actor.state.clone()))
            .collect()
    }

    pub fn easings_mut(&mut self) -> &mut EasingRegistry {
        &mut self.easings
    }

    // ---- actors --------------------------------------------------------

    /// Add an actor; it lands on the topmost layer.
    pub fn add(&mut self, spec: ActorSpec) -> ActorId {
        let id = self.ids.alloc_actor();
        self.actors.insert(id, Actor::new(id, spec));
        self.draw_order.push(id);
        debug!("added actor {}", id.0);
        id
    }

    /// Convenience for the common draw-routine-plus-initial-state form.
    pub fn add_draw(&mut self, draw: DrawRoutine, params: PropertyBag) -> ActorId {
        self.add(ActorSpec {
            params,
            draw: Some(draw),
            ..Default::default()
        })
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Result<(), EngineError> {
        let Some(actor) = self.actors.remove(&id) else {
            warn!("remove_actor: actor {} does not exist", id.0);
            return Err(EngineError::NotFound(format!("actor {}", id.0)));
        };
        self.draw_order.retain(|a| *a != id);
        let ids = actor.frame_ids.clone();
        self.release_ids(&ids);
        self.recompute_duration();
        debug!("removed actor {}", id.0);
        Ok(())
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<ActorHandle<'_>> {
        if self.actors.contains_key(&id) {
            Some(ActorHandle { engine: self, id })
        } else {
            None
        }
    }

    /// Actor ids in layer order, back to front.
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.draw_order.clone()
    }

    /// Re-slot an actor in the draw order. Fails when the index is out of
    /// bounds.
    pub fn move_to_layer(&mut self, id: ActorId, layer: usize) -> Result<(), EngineError> {
        if layer >= self.draw_order.len() {
            return Err(EngineError::InvalidOperation(format!(
                "layer {layer} out of bounds for {} actors",
                self.draw_order.len()
            )));
        }
        let Some(pos) = self.draw_order.iter().position(|a| *a == id) else {
            warn!("move_to_layer: actor {} does not exist", id.0);
            return Err(EngineError::NotFound(format!("actor {}", id.0)));
        };
        let moved = self.draw_order.remove(pos);
        self.draw_order.insert(layer, moved);
        Ok(())
    }

    // ---- timeline mutation (engine-side glue) --------------------------

    pub(crate) fn set_keyframe_for(
        &mut self,
        id: ActorId,
        pos: KeyframePosition,
        bag: PropertyBag,
    ) -> Result<(), EngineError> {
        let frame = pos.to_frame(self.fps)?;
        let Some(actor) = self.actors.get_mut(&id) else {
            warn!("actor {} does not exist", id.0);
            return Err(EngineError::NotFound(format!("actor {}", id.0)));
        };
        timeline::set_keyframe(actor, &mut self.frame_ids, frame, bag);
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn update_keyframe_for(
        &mut self,
        id: ActorId,
        pos: KeyframePosition,
        partial: PropertyBag,
    ) -> Result<(), EngineError> {
        let frame = pos.to_frame(self.fps)?;
        let Some(actor) = self.actors.get_mut(&id) else {
            warn!("actor {} does not exist", id.0);
            return Err(EngineError::NotFound(format!("actor {}", id.0)));
        };
        timeline::update_keyframe(actor, &mut self.frame_ids, frame, partial)?;
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn remove_keyframe_for(
        &mut self,
        id: ActorId,
        pos: KeyframePosition,
    ) -> Result<(), EngineError> {
        let frame = pos.to_frame(self.fps)?;
        let actor = self.actor_entry(id)?;
        let dropped = timeline::remove_keyframe(actor, frame)?;
        self.release_ids(&dropped);
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn live_copy_for(
        &mut self,
        id: ActorId,
        pos: KeyframePosition,
        source: KeyframePosition,
    ) -> Result<(), EngineError> {
        let frame = pos.to_frame(self.fps)?;
        let source = source.to_frame(self.fps)?;
        let Some(actor) = self.actors.get_mut(&id) else {
            warn!("actor {} does not exist", id.0);
            return Err(EngineError::NotFound(format!("actor {}", id.0)));
        };
        timeline::live_copy(actor, &mut self.frame_ids, frame, source)?;
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn remove_all_keyframes_for(&mut self, id: ActorId) -> Result<(), EngineError> {
        let actor = self.actor_entry(id)?;
        let ids = std::mem::take(&mut actor.frame_ids);
        actor.originals.clear();
        actor.normalized.clear();
        actor.live_copies.clear();
        actor.cache.clear();
        actor.last_reached = None;
        self.release_ids(&ids);
        self.recompute_duration();
        Ok(())
    }

    fn actor_entry(&mut self, id: ActorId) -> Result<&mut Actor, EngineError> {
        match self.actors.get_mut(&id) {
            Some(actor) => Ok(actor),
            None => {
                warn!("actor {} does not exist", id.0);
                Err(EngineError::NotFound(format!("actor {}", id.0)))
            }
        }
    }

    /// Drop ids no actor references anymore from the global list. Keyframe 0
    /// is never deleted.
    fn release_ids(&mut self, candidates: &[u32]) {
        for &id in candidates {
            if id == 0 {
                continue;
            }
            let still_used = self.actors.values().any(|a| a.owns_frame(id));
            if !still_used {
                timeline::remove_sorted(&mut self.frame_ids, id);
                self.reached.retain(|&r| r != id);
            }
        }
    }

    fn recompute_duration(&mut self) {
        let last = self.frame_ids.last().copied().unwrap_or(0);
        self.duration_ms = last as f64 * 1000.0 / self.fps as f64;
    }

    // ---- frame rate ----------------------------------------------------

    pub fn frames_per_second(&self) -> u32 {
        self.fps
    }

    /// Read or change the frame rate. Existing keyframe ids are rescaled so
    /// total wall-clock duration is unchanged. Non-positive values are
    /// ignored and the current rate is returned.
    pub fn framerate(&mut self, new_fps: Option<u32>) -> u32 {
        let Some(new_fps) = new_fps.filter(|&n| n > 0) else {
            return self.fps;
        };
        if new_fps == self.fps {
            return self.fps;
        }
        let scale = new_fps as f64 / self.fps as f64;
        let remap = |id: u32| (id as f64 * scale).round() as u32;

        self.frame_ids = remap_list(&self.frame_ids, remap);
        self.reached = remap_list(&self.reached, remap);
        self.current_frame = remap(self.current_frame);
        self.prev_frame = self.prev_frame.map(remap);

        for actor in self.actors.values_mut() {
            actor.frame_ids = remap_list(&actor.frame_ids, remap);
            actor.originals = remap_keys(std::mem::take(&mut actor.originals), remap);
            actor.normalized = remap_keys(std::mem::take(&mut actor.normalized), remap);
            let copies: HashMap<u32, u32> = actor
                .live_copies
                .drain()
                .map(|(copy, src)| (remap(copy), remap(src)))
                .collect();
            actor.live_copies = copies;
            actor.last_reached = actor.last_reached.map(remap);
        }

        for puppet in self.puppets.values_mut() {
            puppet.cues.start_at = puppet.cues.start_at.iter().map(|&f| remap(f)).collect();
            puppet.cues.stop_at = puppet.cues.stop_at.iter().map(|&f| remap(f)).collect();
            puppet.engine.framerate(Some(new_fps));
        }

        debug!("framerate changed {} -> {}", self.fps, new_fps);
        self.fps = new_fps;
        self.recompute_duration();
        self.fps
    }

    // ---- events --------------------------------------------------------

    pub fn bind(
        &mut self,
        event: EngineEvent,
        handler: impl FnMut(&Engine) + 'static,
    ) -> HandlerId {
        self.events.bind(event, handler)
    }

    pub fn unbind(&mut self, event: EngineEvent, id: HandlerId) -> bool {
        self.events.unbind(event, id)
    }

    fn fire(&mut self, event: EngineEvent) {
        let mut handlers = self.events.take(event);
        for (_, handler) in handlers.iter_mut() {
            handler(&*self);
        }
        self.events.restore(event, handlers);
    }

    // ---- playback control ----------------------------------------------

    pub fn play(&mut self) {
        let now = self.clock.now_ms();
        self.play_at(now);
    }

    /// Play, forwarding to every puppet as well.
    pub fn play_cascade(&mut self) {
        let now = self.clock.now_ms();
        self.play_at(now);
        for puppet in self.puppets.values_mut() {
            puppet.engine.play_at(now);
        }
    }

    pub(crate) fn play_at(&mut self, now: f64) {
        match self.state {
            PlaybackState::Playing => {}
            PlaybackState::Paused => {
                let pause_len = now - self.paused_at;
                self.loop_start_time += pause_len;
                // keep the restart anchor grid aligned across the pause
                if let Some(start) = self.start_time {
                    self.start_time = Some(start + pause_len);
                }
                for actor in self.actors.values_mut() {
                    actor.queue.add_pause(pause_len);
                }
                self.paused_at = 0.0;
                self.state = PlaybackState::Playing;
                debug!("resumed after {pause_len}ms paused");
                self.fire(EngineEvent::Play);
            }
            PlaybackState::Stopped => {
                if self.start_time.is_none() {
                    self.start_time = Some(now);
                }
                self.loop_start_time = now;
                self.prev_frame = None;
                self.state = PlaybackState::Playing;
                debug!("playback started");
                self.fire(EngineEvent::Play);
                self.fire(EngineEvent::LoopStart);
            }
        }
    }

    pub fn pause(&mut self) {
        let now = self.clock.now_ms();
        self.pause_at(now);
    }

    /// Pause, forwarding to every puppet as well.
    pub fn pause_cascade(&mut self) {
        let now = self.clock.now_ms();
        self.pause_at(now);
        for puppet in self.puppets.values_mut() {
            puppet.engine.pause_at(now);
        }
    }

    pub(crate) fn pause_at(&mut self, now: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.paused_at = now;
        self.state = PlaybackState::Paused;
        debug!("playback paused");
        self.fire(EngineEvent::Pause);
    }

    /// Stop playback and reset transient state: loop/pause timestamps, the
    /// reached list, every actor's action queue and resolution cache.
    pub fn stop(&mut self, surface: &mut dyn Surface) {
        self.halt();
        if self.cfg.clear_on_stop {
            surface.clear();
        }
        debug!("playback stopped");
        self.fire(EngineEvent::Stop);
    }

    /// Stop, forwarding to every puppet as well.
    pub fn stop_cascade(&mut self, surface: &mut dyn Surface) {
        for puppet in self.puppets.values_mut() {
            puppet.engine.stop(surface);
        }
        self.stop(surface);
    }

    fn halt(&mut self) {
        self.state = PlaybackState::Stopped;
        self.loop_start_time = 0.0;
        self.paused_at = 0.0;
        self.prev_frame = None;
        self.current_frame = 0;
        self.reached.clear();
        self.loops_remaining = None;
        self.on_complete = None;
        for actor in self.actors.values_mut() {
            actor.queue.flush();
            actor.cache.clear();
            actor.last_reached = None;
        }
    }

    /// Play the timeline `n` times, then stop and invoke `on_complete`.
    pub fn iterate(&mut self, n: u32, on_complete: Option<Box<dyn FnOnce(&Engine)>>) {
        if n == 0 {
            return;
        }
        self.loops_remaining = Some(n);
        self.on_complete = on_complete;
        self.play();
    }

    /// Play once, then repeat `n` more times.
    pub fn repeat(&mut self, n: u32, on_complete: Option<Box<dyn FnOnce(&Engine)>>) {
        self.iterate(n.saturating_add(1), on_complete);
    }

    /// Render a single frame while suspending the loop; playback can be
    /// resumed with `play`.
    pub fn goto_frame(
        &mut self,
        pos: impl Into<KeyframePosition>,
        surface: &mut dyn Surface,
    ) -> Result<(), EngineError> {
        let frame = pos.into().to_frame(self.fps)?;
        let now = self.clock.now_ms();
        self.seek(frame, now);
        self.state = PlaybackState::Paused;
        self.paused_at = now;
        self.ensure_styles(surface);
        self.update_and_draw(self.current_frame, now, surface);
        Ok(())
    }

    /// Seek and continue (or begin) playing from there.
    pub fn goto_and_play(&mut self, pos: impl Into<KeyframePosition>) -> Result<(), EngineError> {
        let frame = pos.into().to_frame(self.fps)?;
        let now = self.clock.now_ms();
        self.seek(frame, now);
        if self.start_time.is_none() {
            self.start_time = Some(self.loop_start_time);
        }
        self.paused_at = 0.0;
        self.state = PlaybackState::Playing;
        self.fire(EngineEvent::Play);
        Ok(())
    }

    fn seek(&mut self, frame: u32, now: f64) {
        let last = self.frame_ids.last().copied().unwrap_or(0);
        let frame = frame.min(last);
        // Everything at or before the seek point counts as visited.
        self.reached = self
            .frame_ids
            .iter()
            .copied()
            .filter(|&id| id <= frame)
            .collect();
        for actor in self.actors.values_mut() {
            actor.cache.clear();
            actor.last_reached = actor
                .frame_ids
                .iter()
                .rev()
                .find(|&&id| id <= frame)
                .copied();
        }
        self.current_frame = frame;
        self.prev_frame = Some(frame);
        if self.duration_ms > 0.0 && last > 0 {
            let offset = frame as f64 / last as f64 * self.duration_ms;
            self.loop_start_time = now - offset;
        } else {
            self.loop_start_time = now;
        }
    }

    // ---- the tick driver -----------------------------------------------

    /// Advance one tick against the engine clock.
    pub fn tick(&mut self, surface: &mut dyn Surface) {
        let now = self.clock.now_ms();
        self.tick_at(now, surface);
    }

    /// Drive playback against real time until it leaves the playing state.
    /// Scheduling is best-effort; the tick driver corrects for jitter and
    /// keyframe skips.
    pub fn run(&mut self, surface: &mut dyn Surface) {
        while self.state == PlaybackState::Playing {
            self.tick(surface);
            let interval = 1.0 / self.fps as f64;
            std::thread::sleep(std::time::Duration::from_secs_f64(interval));
        }
    }

    pub(crate) fn tick_at(&mut self, now: f64, surface: &mut dyn Surface) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.ensure_styles(surface);

        let last_frame = self.frame_ids.last().copied().unwrap_or(0);
        let mut frame = 0u32;

        if self.duration_ms > 0.0 {
            let loop_len = now - self.loop_start_time;
            if loop_len > self.duration_ms && self.reached.len() == self.frame_ids.len() {
                // Re-anchor on the start grid so tick jitter never
                // accumulates across restarts.
                let laps = (loop_len / self.duration_ms).floor();
                self.loop_start_time += laps * self.duration_ms;
                self.reached.clear();
                self.prev_frame = None;
                for actor in self.actors.values_mut() {
                    actor.cache.clear();
                    actor.last_reached = None;
                }
                if let Some(remaining) = self.loops_remaining {
                    let remaining = remaining.saturating_sub(1);
                    if remaining == 0 {
                        self.loops_remaining = None;
                        self.fire(EngineEvent::LoopComplete);
                        self.finish(surface);
                        return;
                    }
                    self.loops_remaining = Some(remaining);
                }
                self.fire(EngineEvent::LoopComplete);
                self.fire(EngineEvent::LoopStart);
            }
            let loop_len = now - self.loop_start_time;
            let loop_pos = (loop_len / self.duration_ms).max(0.0);
            frame = ((loop_pos * last_frame as f64).floor() as u64).min(last_frame as u64) as u32;
        }

        // Reached-keyframe bookkeeping with keyframe-skip correction: the
        // appended id is always the next expected id in the global list, and
        // the frame is forced back onto a skipped keyframe so dynamic
        // properties and live copies see every keyframe execute once.
        if !self.frame_ids.is_empty() && self.reached.len() < self.frame_ids.len() {
            let latest = timeline::latest_at(&self.frame_ids, frame).unwrap_or(0);
            let is_new = match self.reached.last() {
                None => true,
                Some(&tail) => latest > tail,
            };
            if is_new {
                let expected = self.frame_ids[self.reached.len()];
                if latest != expected {
                    frame = expected;
                }
                self.reached.push(expected);
                for actor in self.actors.values_mut() {
                    if actor.owns_frame(expected) {
                        actor.cache.rotate();
                        actor.last_reached = Some(expected);
                    }
                }
            }
        }

        self.current_frame = frame;
        self.fire(EngineEvent::EnterFrame);
        self.update_and_draw(frame, now, surface);

        // Puppet composition: translate crossed owner-frame cues into
        // puppet playback, then forward the tick.
        let prev = self.prev_frame;
        for puppet in self.puppets.values_mut() {
            if cue_crossed(&puppet.cues.start_at, prev, frame) {
                puppet.engine.play_at(now);
            }
            if cue_crossed(&puppet.cues.stop_at, prev, frame) {
                puppet.engine.stop(surface);
            }
            puppet.engine.tick_at(now, surface);
        }
        self.prev_frame = Some(frame);
    }

    /// A repeat/iterate budget just ran out: stop and notify.
    fn finish(&mut self, surface: &mut dyn Surface) {
        let callback = self.on_complete.take();
        self.halt();
        debug!("loop budget exhausted; playback complete");
        self.fire(EngineEvent::Stop);
        if let Some(callback) = callback {
            callback(&*self);
        }
        if self.cfg.clear_on_complete {
            surface.clear();
        }
    }

    fn ensure_styles(&mut self, surface: &mut dyn Surface) {
        if self.styles_applied {
            return;
        }
        for (name, value) in self.cfg.styles.iter() {
            surface.set_style(name, value);
        }
        self.styles_applied = true;
    }

    /// Compute every actor's state at `frame` and draw in layer order.
    fn update_and_draw(&mut self, frame: u32, now: f64, surface: &mut dyn Surface) {
        if self.cfg.autoclear {
            surface.clear();
        }
        let fps = self.fps;
        let order = self.draw_order.clone();
        for id in order {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            let mut state = match actor.bracket(frame) {
                Some((from_id, to_id)) => {
                    resolve::interpolated_state(actor, &self.easings, from_id, to_id, frame)
                }
                None => {
                    if actor.queue.is_empty() {
                        continue;
                    }
                    StateBag::new()
                }
            };
            actions::apply_actions(actor, &self.easings, fps, now, &mut state);
            actor.state = state;
            if let Some(mut draw) = actor.draw.take() {
                let ctx = DrawContext {
                    actor: id,
                    frame,
                    frames_per_second: fps,
                    state: &actor.state,
                    data: &actor.data,
                };
                draw(surface, &ctx);
                actor.draw = Some(draw);
            }
        }
    }

    // ---- puppets -------------------------------------------------------

    /// Create (or replace) a named puppet: a nested engine sharing this
    /// engine's frame rate and surface, driven by the given cues.
    pub fn puppet_create(&mut self, name: impl Into<String>, cues: PuppetCues) -> &mut Engine {
        let cfg = EngineConfig {
            frames_per_second: self.fps,
            // the owner clears; a puppet clearing too would erase its host
            autoclear: false,
            ..EngineConfig::default()
        };
        let puppet = Puppet {
            engine: Engine::new(cfg),
            cues,
        };
        let slot = match self.puppets.entry(name.into()) {
            hashbrown::hash_map::Entry::Occupied(mut occupied) => {
                occupied.insert(puppet);
                occupied.into_mut()
            }
            hashbrown::hash_map::Entry::Vacant(vacant) => vacant.insert(puppet),
        };
        &mut slot.engine
    }

    pub fn puppet(&mut self, name: &str) -> Option<&mut Engine> {
        self.puppets.get_mut(name).map(|p| &mut p.engine)
    }

    pub fn puppet_delete(&mut self, name: &str) -> Result<(), EngineError> {
        match self.puppets.remove(name) {
            Some(_) => Ok(()),
            None => {
                warn!("puppet '{name}' does not exist");
                Err(EngineError::NotFound(format!("puppet '{name}'")))
            }
        }
    }
}

/// Mutable view of one actor plus the engine state its operations touch.
/// Obtained from [`Engine::actor_mut`]; operations chain.
pub struct ActorHandle<'a> {
    engine: &'a mut Engine,
    id: ActorId,
}

impl ActorHandle<'_> {
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Store a keyframe state at a frame index or time literal.
    pub fn keyframe(
        &mut self,
        pos: impl Into<KeyframePosition>,
        bag: PropertyBag,
    ) -> Result<&mut Self, EngineError> {
        self.engine.set_keyframe_for(self.id, pos.into(), bag)?;
        Ok(self)
    }

    /// Merge a partial state over the keyframe's original (pre-normalization)
    /// state.
    pub fn update_keyframe(
        &mut self,
        pos: impl Into<KeyframePosition>,
        partial: PropertyBag,
    ) -> Result<&mut Self, EngineError> {
        self.engine.update_keyframe_for(self.id, pos.into(), partial)?;
        Ok(self)
    }

    pub fn remove_keyframe(
        &mut self,
        pos: impl Into<KeyframePosition>,
    ) -> Result<&mut Self, EngineError> {
        self.engine.remove_keyframe_for(self.id, pos.into())?;
        Ok(self)
    }

    pub fn remove_all_keyframes(&mut self) -> Result<&mut Self, EngineError> {
        self.engine.remove_all_keyframes_for(self.id)?;
        Ok(self)
    }

    /// Alias a keyframe to another: its state tracks the source until the
    /// source is removed.
    pub fn live_copy(
        &mut self,
        pos: impl Into<KeyframePosition>,
        source: impl Into<KeyframePosition>,
    ) -> Result<&mut Self, EngineError> {
        self.engine.live_copy_for(self.id, pos.into(), source.into())?;
        Ok(self)
    }

    /// Queue a one-shot tween from the actor's state at evaluation time to
    /// the given targets, over `duration` (frames or a time literal).
    pub fn to(
        &mut self,
        duration: impl Into<KeyframePosition>,
        targets: PropertyBag,
        opts: ActionOpts,
    ) -> Result<&mut Self, EngineError> {
        let frames = duration.into().to_frame(self.engine.fps)?;
        let actor = self.engine.actor_entry(self.id)?;
        actor.queue.enqueue(ImmediateAction::new(frames, targets, opts));
        Ok(self)
    }

    /// Force the in-flight action to its end and drop the queued remainder.
    pub fn skip_to_end(&mut self) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.queue.skip_to_end();
        }
        self
    }

    /// Force the in-flight action to its end; the rest of the queue runs on.
    pub fn end_current_action(&mut self) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.queue.end_current();
        }
        self
    }

    /// Remove every queued action except one already in flight.
    pub fn clear_queue(&mut self) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.queue.clear();
        }
        self
    }

    pub fn move_to_layer(&mut self, layer: usize) -> Result<&mut Self, EngineError> {
        self.engine.move_to_layer(self.id, layer)?;
        Ok(self)
    }

    /// Actor-level easing applied where no per-property override exists.
    pub fn set_easing(&mut self, name: impl Into<String>) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.easing = name.into();
        }
        self
    }

    pub fn set_draw(&mut self, draw: DrawRoutine) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.draw = Some(draw);
        }
        self
    }

    /// Interpolated state as of the last tick or seek.
    pub fn state(&self) -> StateBag {
        self.engine
            .actors
            .get(&self.id)
            .map(|a| a.state.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, property: &str) -> Option<ResolvedValue> {
        self.engine.actors.get(&self.id).and_then(|a| a.get(property))
    }

    pub fn data(&self) -> &JsonValue {
        static NULL: JsonValue = JsonValue::Null;
        self.engine
            .actors
            .get(&self.id)
            .map(|a| a.data())
            .unwrap_or(&NULL)
    }

    pub fn set_data(&mut self, data: JsonValue) -> &mut Self {
        if let Some(actor) = self.engine.actors.get_mut(&self.id) {
            actor.data = data;
        }
        self
    }
}

fn remap_list(ids: &[u32], remap: impl Fn(u32) -> u32) -> Vec<u32> {
    let mut out: Vec<u32> = ids.iter().map(|&id| remap(id)).collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn remap_keys<V>(
    map: std::collections::BTreeMap<u32, V>,
    remap: impl Fn(u32) -> u32,
) -> std::collections::BTreeMap<u32, V> {
    map.into_iter().map(|(k, v)| (remap(k), v)).collect()
}
