use glam::Vec3;
use handsort::body::{Body, BodyDef, ZoneSide};
use handsort::cursor::CursorSample;
use handsort::interaction::GrabPolicy;
use handsort::physics::{self, PhysicsParams};
use handsort::registry::ObjectRegistry;
use handsort::scoring::ZoneLayout;
use std::time::Duration;

fn def(id: u32, position: Vec3, dimensions: Vec3) -> BodyDef {
    BodyDef { id, position, dimensions, color: "#ffffff".to_string(), target: ZoneSide::Left }
}

fn no_hand() -> CursorSample {
    CursorSample { position: Vec3::new(0.5, 0.5, 0.0), gripping: false, tracking: false }
}

/// Drops a body and returns `(impact, rebound)` for every floor contact until it rests.
fn bounce_until_rest(mut body: Body, params: &PhysicsParams, max_frames: usize) -> (Vec<(f32, f32)>, Body) {
    let mut contacts = Vec::new();
    for _ in 0..max_frames {
        if let Some(contact) = physics::integrate(&mut body, params) {
            contacts.push((contact.impact_speed, contact.rebound_speed));
            if contact.rebound_speed == 0.0 {
                break;
            }
        }
    }
    (contacts, body)
}

#[test]
fn each_bounce_keeps_a_fifth_of_the_speed() {
    let params = PhysicsParams::buildings_2d();
    let body = Body::new(&def(1, Vec3::new(0.5, 0.2, 0.0), Vec3::new(0.1, 0.1, 0.0)));
    let (contacts, body) = bounce_until_rest(body, &params, 10_000);

    assert!(contacts.len() >= 2, "falls far enough to bounce at least once");
    assert!(contacts.len() <= 10, "settles within a bounded number of contacts");
    for (impact, rebound) in &contacts {
        if *rebound > 0.0 {
            assert!((rebound - impact * 0.2).abs() < 1e-7, "80% of vertical speed is lost");
        }
    }
    assert_eq!(body.velocity.y, 0.0);
    assert!((body.position.y - (params.floor - 0.05)).abs() < 1e-6, "bottom edge rests on the floor");
}

#[test]
fn world_space_cube_settles_on_the_floor() {
    let params = PhysicsParams::cubes_3d();
    let body = Body::new(&def(1, Vec3::new(0.0, 3.0, 0.0), Vec3::splat(1.2)));
    let (contacts, body) = bounce_until_rest(body, &params, 10_000);

    assert!(contacts.len() <= 10);
    let speeds: Vec<f32> = contacts.iter().map(|(impact, _)| *impact).collect();
    assert!(speeds.windows(2).all(|pair| pair[1] < pair[0]), "impacts shrink: {speeds:?}");
    assert_eq!(body.velocity.y, 0.0);
    assert!((body.position.y - (params.floor + 0.6)).abs() < 1e-5);
}

#[test]
fn registry_stays_at_rest_once_settled() {
    let defs = [def(1, Vec3::new(0.5, 0.2, 0.0), Vec3::new(0.1, 0.1, 0.0))];
    let mut registry = ObjectRegistry::from_defs(
        &defs,
        PhysicsParams::buildings_2d(),
        GrabPolicy::buildings_2d(),
        ZoneLayout::buildings_2d(),
    );
    for _ in 0..2_000 {
        registry.step(&no_hand(), Duration::from_millis(16));
    }
    let rest = registry.body(1).expect("body exists").position;
    for _ in 0..100 {
        registry.step(&no_hand(), Duration::from_millis(16));
    }
    let body = registry.body(1).expect("body exists");
    assert_eq!(body.position, rest);
    assert_eq!(body.velocity, Vec3::ZERO);
}

#[test]
fn falling_building_stacks_on_the_one_below() {
    let defs = [
        def(1, Vec3::new(0.5, 0.85, 0.0), Vec3::new(0.2, 0.2, 0.0)),
        def(2, Vec3::new(0.52, 0.3, 0.0), Vec3::new(0.1, 0.1, 0.0)),
    ];
    let mut registry = ObjectRegistry::from_defs(
        &defs,
        PhysicsParams::buildings_2d(),
        GrabPolicy::buildings_2d(),
        ZoneLayout::buildings_2d(),
    );
    for _ in 0..2_000 {
        registry.step(&no_hand(), Duration::from_millis(16));
    }
    let lower = registry.body(1).expect("body exists");
    let upper = registry.body(2).expect("body exists");
    let lower_top = lower.position.y - 0.1;
    assert!((upper.position.y + 0.05 - lower_top).abs() < 1e-5, "upper body rests on the lower one");
    assert!(upper.position.is_finite());
}

#[test]
fn long_silence_never_produces_nan() {
    let defs = [def(1, Vec3::new(-1.0, 0.0, 0.0), Vec3::splat(1.2)), def(2, Vec3::new(1.0, 2.0, 0.5), Vec3::splat(1.2))];
    let mut registry =
        ObjectRegistry::from_defs(&defs, PhysicsParams::cubes_3d(), GrabPolicy::cubes_3d(), ZoneLayout::cubes_3d());
    for _ in 0..20_000 {
        registry.step(&no_hand(), Duration::from_secs(60));
    }
    for body in registry.bodies() {
        assert!(body.position.is_finite() && body.velocity.is_finite());
    }
}
