use handsort::config::{AppConfig, AppConfigOverrides};
use handsort::cursor::{AlgorithmMode, ViewKind};
use handsort::physics::PhysicsParams;
use handsort::scene::SceneDefinition;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn config_file_sections_are_applied() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("app.json");
    fs::write(
        &path,
        r#"{
            "connection": { "url": "ws://10.0.0.2:9000/ws", "frame_interval_ms": 100 },
            "loop": { "frame_rate": 30, "max_frames": 600 },
            "view": { "kind": "3d", "cursor_smoothing": 0.2, "cursor_anchor": "pinch_midpoint" },
            "interaction": { "respawn_delay_ms": 500, "burst_seed": 9 },
            "initial_mode": "manual"
        }"#,
    )
    .expect("write config");

    let cfg = AppConfig::load(&path).expect("load config");
    assert_eq!(cfg.view.kind, ViewKind::ThreeD);
    assert_eq!(cfg.frame_loop.max_frames, Some(600));

    let transport = cfg.transport();
    assert_eq!(transport.url, "ws://10.0.0.2:9000/ws");
    assert_eq!(transport.frame_interval, Duration::from_millis(100));
    assert_eq!(transport.reconnect_delay, Duration::from_millis(1_000));
    assert_eq!(transport.connect_timeout, Duration::from_millis(2_000));
    assert_eq!(transport.write_timeout, Duration::from_millis(250));

    let settings = cfg.session();
    assert_eq!(settings.initial_mode, AlgorithmMode::Manual);
    assert_eq!(settings.respawn_delay, Duration::from_millis(500));
    assert_eq!(settings.burst_seed, Some(9));
    assert!((settings.cursor_smoothing - 0.2).abs() < f32::EPSILON);
}

#[test]
fn broken_config_falls_back_to_defaults() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("app.json");
    fs::write(&path, "{ not json").expect("write config");

    let err = AppConfig::load(&path).expect_err("parse failure");
    assert!(format!("{err:#}").contains("Failed to parse config file"));
    let cfg = AppConfig::load_or_default(&path);
    assert_eq!(cfg.frame_loop.frame_rate, 60);
    assert!(AppConfig::load(dir.path().join("missing.json")).is_err());
}

#[test]
fn cli_overrides_win_over_file_values() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("app.json");
    fs::write(&path, r#"{ "view": { "kind": "2d" }, "initial_mode": "ai" }"#).expect("write config");

    let mut cfg = AppConfig::load(&path).expect("load config");
    let overrides = AppConfigOverrides {
        view: Some(ViewKind::ThreeD),
        mode: Some(AlgorithmMode::Manual),
        scene: Some(dir.path().join("scene.json")),
        ..AppConfigOverrides::default()
    };
    cfg.apply_overrides(&overrides);
    assert_eq!(cfg.view.kind, ViewKind::ThreeD);
    assert_eq!(cfg.initial_mode, AlgorithmMode::Manual);
    assert_eq!(cfg.scene.as_deref(), Some(dir.path().join("scene.json").as_path()));
    assert_eq!(overrides.applied_fields(), vec!["view", "mode", "scene"]);
}

#[test]
fn scene_file_fills_tunables_from_its_view_preset() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("scene.json");
    fs::write(
        &path,
        r##"{
            "name": "warehouse",
            "view": "3d",
            "bodies": [
                { "id": 4, "position": [-2.0, 1.0, 0.0], "dimensions": [1.0, 1.0, 1.0], "target": "left" },
                { "id": 5, "position": [2.0, 1.0, 0.0], "dimensions": [0.8, 0.8, 0.8], "color": "#ff0000", "target": "right" }
            ]
        }"##,
    )
    .expect("write scene");

    let scene = SceneDefinition::load(&path).expect("load scene");
    assert_eq!(scene.name, "warehouse");
    assert_eq!(scene.view, ViewKind::ThreeD);
    assert_eq!(scene.bodies.len(), 2);
    assert_eq!(scene.bodies[1].color, "#ff0000");
    assert_eq!(scene.physics, PhysicsParams::cubes_3d());
    assert_eq!(scene.zones, SceneDefinition::cubes_3d().zones);
}

#[test]
fn invalid_scenes_are_rejected() {
    let dir = tempdir().expect("temp dir");
    let cases = [
        ("empty.json", r#"{ "bodies": [] }"#, "no bodies"),
        (
            "dupes.json",
            r#"{ "bodies": [
                { "id": 1, "position": [0.1, 0.1, 0.0], "dimensions": [0.1, 0.1, 0.0], "target": "left" },
                { "id": 1, "position": [0.5, 0.1, 0.0], "dimensions": [0.1, 0.1, 0.0], "target": "right" }
            ] }"#,
            "duplicate body id 1",
        ),
        ("broken.json", r#"{ "bodies": "#, "Parsing scene file"),
    ];
    for (name, text, expected) in cases {
        let path = dir.path().join(name);
        fs::write(&path, text).expect("write scene");
        let err = SceneDefinition::load(&path).expect_err("invalid scene");
        assert!(format!("{err:#}").contains(expected), "{name}: {err:#}");
    }
}
