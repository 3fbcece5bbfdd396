use marionette_core::{
    parse_stored_timeline_json, Color, Engine, EngineConfig, ManualClock, NullSurface,
    ResolvedValue, Surface,
};
use std::cell::RefCell;
use std::rc::Rc;

const DOC: &str = r##"{
    "name": "intro",
    "actors": [
        {
            "name": "ball",
            "easing": "linear",
            "params": { "x": 0, "y": 20, "color": "#000000" },
            "keyframes": [
                { "at": 0, "state": { "x": 0 } },
                { "at": "1s", "state": { "x": "+=100", "color": "#ffffff" } }
            ]
        },
        {
            "name": "label",
            "params": { "opacity": 1 },
            "keyframes": [
                { "at": 0, "state": {} },
                { "at": 5, "state": { "opacity": 0 } }
            ]
        }
    ]
}"##;

fn engine_at(fps: u32) -> (Engine, ManualClock) {
    let clock = ManualClock::new();
    let cfg = EngineConfig {
        frames_per_second: fps,
        ..Default::default()
    };
    let engine = Engine::with_clock(cfg, Box::new(clock.clone()));
    (engine, clock)
}

/// it should load actors and keyframes from a stored document
#[test]
fn loads_actors_and_keyframes() {
    let (mut engine, clock) = engine_at(10);
    let doc = parse_stored_timeline_json(DOC).unwrap();
    let ids = engine.load_stored_timeline(&doc).unwrap();
    assert_eq!(ids.len(), 2);

    let ball = ids["ball"];
    assert_eq!(engine.actor(ball).unwrap().keyframe_ids(), &[0, 10]);
    assert_eq!(engine.frame_ids(), &[0, 5, 10]);

    engine.play();
    clock.set(300.0);
    engine.tick(&mut NullSurface);
    clock.set(500.0);
    engine.tick(&mut NullSurface);
    assert_eq!(
        engine.actor(ball).unwrap().get("x"),
        Some(ResolvedValue::Number(50.0))
    );
    // params forward-fill into every keyframe
    assert_eq!(
        engine.actor(ball).unwrap().get("y"),
        Some(ResolvedValue::Number(20.0))
    );
    assert_eq!(
        engine.actor(ball).unwrap().get("color"),
        Some(ResolvedValue::Color(Color::new(127, 127, 127)))
    );
}

/// it should let draw routines be attached after loading
#[test]
fn draw_routines_attach_by_name() {
    let (mut engine, clock) = engine_at(10);
    let doc = parse_stored_timeline_json(DOC).unwrap();
    let ids = engine.load_stored_timeline(&doc).unwrap();

    let drawn = Rc::new(RefCell::new(Vec::new()));
    let sink = drawn.clone();
    engine.actor_mut(ids["ball"]).unwrap().set_draw(Box::new(
        move |_surface: &mut dyn Surface, ctx| {
            let x = ctx.state.get("x").and_then(|v| v.as_number()).unwrap_or(-1.0);
            sink.borrow_mut().push((ctx.frame, x));
        },
    ));

    engine.play();
    clock.set(300.0);
    engine.tick(&mut NullSurface);
    clock.set(500.0);
    engine.tick(&mut NullSurface);
    assert_eq!(drawn.borrow().last(), Some(&(5u32, 50.0)));
}
