use marionette_core::{
    ActorSpec, Engine, EngineConfig, EngineError, ManualClock, NullSurface, PlaybackState,
    PropertyBag, PropertyValue, PuppetCues, ResolvedValue,
};

fn engine_at(fps: u32) -> (Engine, ManualClock) {
    let clock = ManualClock::new();
    let cfg = EngineConfig {
        frames_per_second: fps,
        ..Default::default()
    };
    let engine = Engine::with_clock(cfg, Box::new(clock.clone()));
    (engine, clock)
}

fn bag(entries: &[(&str, PropertyValue)]) -> PropertyBag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn owner_with_timeline() -> (Engine, ManualClock) {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    let mut actor = engine.actor_mut(id).unwrap();
    actor.keyframe(0u32, bag(&[("x", 0.0.into())])).unwrap();
    actor.keyframe(10u32, bag(&[("x", 1.0.into())])).unwrap();
    (engine, clock)
}

fn puppet_actor(puppet: &mut Engine) -> marionette_core::ActorId {
    let id = puppet.add(ActorSpec::default());
    let mut actor = puppet.actor_mut(id).unwrap();
    actor.keyframe(0u32, bag(&[("x", 0.0.into())])).unwrap();
    actor.keyframe(10u32, bag(&[("x", 100.0.into())])).unwrap();
    id
}

/// it should inherit the owner frame rate and stay stopped until cued
#[test]
fn puppet_starts_on_cue() {
    let (mut engine, clock) = owner_with_timeline();
    let pid = {
        let puppet = engine.puppet_create("seq", PuppetCues::default().start_at(5));
        assert_eq!(puppet.frames_per_second(), 10);
        puppet_actor(puppet)
    };

    engine.play();
    clock.set(400.0); // owner frame 4: cue not crossed yet
    engine.tick(&mut NullSurface);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Stopped);

    clock.set(600.0); // owner frame 6: cue 5 crossed
    engine.tick(&mut NullSurface);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Playing);

    // the puppet runs on the shared clock, anchored at its cue time
    clock.set(1100.0);
    engine.tick(&mut NullSurface);
    let x = engine.puppet("seq").unwrap().actor(pid).unwrap().get("x");
    assert_eq!(x, Some(ResolvedValue::Number(50.0)));
}

/// it should stop a puppet when a stop cue is crossed
#[test]
fn puppet_stops_on_cue() {
    let (mut engine, clock) = owner_with_timeline();
    {
        let puppet = engine.puppet_create("seq", PuppetCues::default().start_at(0).stop_at(8));
        puppet_actor(puppet);
    }

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Playing);

    clock.set(900.0); // owner frame 9: stop cue 8 crossed
    engine.tick(&mut NullSurface);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Stopped);
}

/// it should forward play/pause/stop to puppets when cascaded
#[test]
fn cascade_controls_forward() {
    let (mut engine, clock) = owner_with_timeline();
    {
        let puppet = engine.puppet_create("seq", PuppetCues::default());
        puppet_actor(puppet);
    }

    engine.play_cascade();
    assert_eq!(engine.playback(), PlaybackState::Playing);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Playing);

    clock.set(200.0);
    engine.pause_cascade();
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Paused);

    engine.stop_cascade(&mut NullSurface);
    assert_eq!(engine.puppet("seq").unwrap().playback(), PlaybackState::Stopped);
    assert_eq!(engine.playback(), PlaybackState::Stopped);
}

/// it should replace a puppet on re-create and error on unknown deletes
#[test]
fn puppet_lifecycle() {
    let (mut engine, _clock) = owner_with_timeline();
    engine.puppet_create("seq", PuppetCues::default());
    assert!(engine.puppet("seq").is_some());

    // re-creating replaces the old instance
    let replaced = engine.puppet_create("seq", PuppetCues::default().start_at(3));
    assert!(replaced.actor_ids().is_empty());

    engine.puppet_delete("seq").unwrap();
    assert!(engine.puppet("seq").is_none());
    assert!(matches!(
        engine.puppet_delete("seq"),
        Err(EngineError::NotFound(_))
    ));
}

/// it should drive nested sub-timelines from the owner tick only
#[test]
fn puppet_does_not_self_schedule() {
    let (mut engine, clock) = owner_with_timeline();
    let pid = {
        let puppet = engine.puppet_create("seq", PuppetCues::default().start_at(0));
        puppet_actor(puppet)
    };

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface);
    let before = engine.puppet("seq").unwrap().actor(pid).unwrap().get("x");

    // time passes but the owner does not tick: the puppet must not advance
    clock.set(5000.0);
    let after = engine.puppet("seq").unwrap().actor(pid).unwrap().get("x");
    assert_eq!(before, after);
}
