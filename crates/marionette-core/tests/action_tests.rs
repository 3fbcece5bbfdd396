use marionette_core::{
    ActionOpts, ActorSpec, Engine, EngineConfig, ManualClock, NullSurface, PropertyBag,
    PropertyValue, ResolvedValue,
};
use std::cell::RefCell;
use std::rc::Rc;

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

fn number(engine: &Engine, id: marionette_core::ActorId, prop: &str) -> f64 {
    match engine.actor(id).unwrap().get(prop) {
        Some(ResolvedValue::Number(n)) => n,
        other => panic!("expected number for '{prop}', got {other:?}"),
    }
}

/// it should run a relative-target action over its duration and complete once
#[test]
fn immediate_action_duration_and_completion() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    engine.play();
    engine.tick(&mut NullSurface);

    let completions = Rc::new(RefCell::new(0u32));
    let flag = completions.clone();
    engine
        .actor_mut(id)
        .unwrap()
        .to(
            30u32,
            bag(&[("x", "+=10".parse().unwrap())]),
            ActionOpts::default().on_complete(move |_| *flag.borrow_mut() += 1),
        )
        .unwrap();

    // the action starts on the next evaluation
    clock.set(100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 0.0);

    // 15 of 30 frames in: halfway to the relative target
    clock.set(1600.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 5.0);

    // 30 frames of wall time elapsed: complete, exactly once
    clock.set(3100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 10.0);
    assert_eq!(*completions.borrow(), 1);

    clock.set(3200.0);
    engine.tick(&mut NullSurface);
    assert_eq!(*completions.borrow(), 1);
    // the mutation persisted into the keyframe state
    assert_eq!(number(&engine, id, "x"), 10.0);
}

/// it should fire the start handler when the action first evaluates
#[test]
fn start_handler_fires_on_first_evaluation() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    let started = Rc::new(RefCell::new(false));
    let flag = started.clone();
    engine
        .actor_mut(id)
        .unwrap()
        .to(
            10u32,
            bag(&[("x", 5.0.into())]),
            ActionOpts::default().on_start(move |_| *flag.borrow_mut() = true),
        )
        .unwrap();

    assert!(!*started.borrow());
    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface);
    assert!(*started.borrow());
}

/// it should force the action to its end and drop the queue on skip_to_end
#[test]
fn skip_to_end_completes_current_and_drops_rest() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    let first = Rc::new(RefCell::new(0u32));
    let second = Rc::new(RefCell::new(0u32));
    let f1 = first.clone();
    let f2 = second.clone();
    let mut actor = engine.actor_mut(id).unwrap();
    actor
        .to(
            100u32,
            bag(&[("x", 10.0.into())]),
            ActionOpts::default().on_complete(move |_| *f1.borrow_mut() += 1),
        )
        .unwrap();
    actor
        .to(
            100u32,
            bag(&[("x", 50.0.into())]),
            ActionOpts::default().on_complete(move |_| *f2.borrow_mut() += 1),
        )
        .unwrap();

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface); // first action starts

    engine.actor_mut(id).unwrap().skip_to_end();
    clock.set(200.0);
    engine.tick(&mut NullSurface);

    assert_eq!(number(&engine, id, "x"), 10.0);
    assert_eq!(*first.borrow(), 1);

    // the second action was dropped, not run
    clock.set(20_000.0);
    engine.tick(&mut NullSurface);
    assert_eq!(*second.borrow(), 0);
    assert_eq!(number(&engine, id, "x"), 10.0);
}

/// it should let the queue continue after end_current_action
#[test]
fn end_current_action_continues_queue() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    let mut actor = engine.actor_mut(id).unwrap();
    actor
        .to(100u32, bag(&[("x", 10.0.into())]), ActionOpts::default())
        .unwrap();
    actor
        .to(10u32, bag(&[("x", "+=5".parse().unwrap())]), ActionOpts::default())
        .unwrap();

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface);

    engine.actor_mut(id).unwrap().end_current_action();
    clock.set(200.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 10.0);

    // second action: +=5 over 10 frames from the persisted 10
    clock.set(300.0);
    engine.tick(&mut NullSurface); // starts at now=300
    clock.set(1300.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 15.0);
}

/// it should keep only the in-flight action on clear_queue
#[test]
fn clear_queue_keeps_in_flight() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    let mut actor = engine.actor_mut(id).unwrap();
    actor
        .to(20u32, bag(&[("x", 10.0.into())]), ActionOpts::default())
        .unwrap();
    actor
        .to(20u32, bag(&[("x", 99.0.into())]), ActionOpts::default())
        .unwrap();

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface); // first starts
    engine.actor_mut(id).unwrap().clear_queue();

    // first action still runs to completion
    clock.set(2100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 10.0);

    // and nothing follows it
    clock.set(4100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 10.0);
}

/// it should discount pause time from an in-flight action
#[test]
fn actions_discount_pause_time() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    engine
        .actor_mut(id)
        .unwrap()
        .to(20u32, bag(&[("x", 20.0.into())]), ActionOpts::default())
        .unwrap();

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface); // action starts at 100

    clock.set(600.0);
    engine.pause();
    clock.set(5600.0);
    engine.play(); // 5000ms of pause buffered

    // 1000ms of effective action time: 10 of 20 frames
    clock.set(6100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 10.0);
}

/// it should honor an action-level easing override
#[test]
fn action_easing_override() {
    let (mut engine, clock) = engine_at(10);
    let id = engine.add(ActorSpec::default());
    engine
        .actor_mut(id)
        .unwrap()
        .keyframe(0u32, bag(&[("x", 0.0.into())]))
        .unwrap();

    engine
        .actor_mut(id)
        .unwrap()
        .to(
            20u32,
            bag(&[("x", 100.0.into())]),
            ActionOpts::default().easing("easeInQuad"),
        )
        .unwrap();

    engine.play();
    clock.set(100.0);
    engine.tick(&mut NullSurface);
    // halfway in, easeInQuad sits at a quarter
    clock.set(1100.0);
    engine.tick(&mut NullSurface);
    assert_eq!(number(&engine, id, "x"), 25.0);
}
