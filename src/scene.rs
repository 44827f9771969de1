use crate::body::{BodyDef, ZoneSide};
use crate::cursor::ViewKind;
use crate::interaction::{GrabPolicy, HoldAnchor};
use crate::physics::PhysicsParams;
use crate::scoring::ZoneLayout;
use anyhow::{bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Everything needed to build an [`crate::registry::ObjectRegistry`]: the bodies and the
/// per-view tunables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDefinition {
    pub name: String,
    pub view: ViewKind,
    pub bodies: Vec<BodyDef>,
    pub physics: PhysicsParams,
    pub grab: GrabPolicy,
    pub zones: ZoneLayout,
    pub hold_anchor: HoldAnchor,
}

impl Default for SceneDefinition {
    fn default() -> Self {
        Self::buildings_2d()
    }
}

/// On-disk form; every tunable falls back to the preset of the file's view.
#[derive(Debug, Deserialize)]
struct SceneFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    view: ViewKind,
    bodies: Vec<BodyDef>,
    #[serde(default)]
    physics: Option<PhysicsParams>,
    #[serde(default)]
    grab: Option<GrabPolicy>,
    #[serde(default)]
    zones: Option<ZoneLayout>,
    #[serde(default)]
    hold_anchor: Option<HoldAnchor>,
}

fn building(id: u32, left: f32, top: f32, width: f32, height: f32, color: &str, target: ZoneSide) -> BodyDef {
    BodyDef {
        id,
        position: Vec3::new(left + width * 0.5, top + height * 0.5, 0.0),
        dimensions: Vec3::new(width, height, 0.0),
        color: color.to_string(),
        target,
    }
}

impl SceneDefinition {
    /// Three buildings on a normalized canvas, y growing downward.
    pub fn buildings_2d() -> Self {
        Self {
            name: "buildings_2d".to_string(),
            view: ViewKind::TwoD,
            bodies: vec![
                building(1, 0.2, 0.5, 0.12, 0.25, "#fee685", ZoneSide::Left),
                building(2, 0.6, 0.5, 0.18, 0.20, "#ffffff", ZoneSide::Right),
                building(3, 0.4, 0.2, 0.10, 0.18, "#06b6d4", ZoneSide::Left),
            ],
            physics: PhysicsParams::buildings_2d(),
            grab: GrabPolicy::buildings_2d(),
            zones: ZoneLayout::buildings_2d(),
            hold_anchor: HoldAnchor::buildings_2d(),
        }
    }

    /// Two cubes in world space, each sorted to the side it starts on.
    pub fn cubes_3d() -> Self {
        let cube = |id, x: f32, color: &str, target| BodyDef {
            id,
            position: Vec3::new(x, 0.0, 0.0),
            dimensions: Vec3::splat(1.2),
            color: color.to_string(),
            target,
        };
        Self {
            name: "cubes_3d".to_string(),
            view: ViewKind::ThreeD,
            bodies: vec![cube(1, -1.0, "#fee685", ZoneSide::Left), cube(2, 1.0, "#ffffff", ZoneSide::Right)],
            physics: PhysicsParams::cubes_3d(),
            grab: GrabPolicy::cubes_3d(),
            zones: ZoneLayout::cubes_3d(),
            hold_anchor: HoldAnchor::centered(),
        }
    }

    pub fn preset(view: ViewKind) -> Self {
        match view {
            ViewKind::TwoD => Self::buildings_2d(),
            ViewKind::ThreeD => Self::cubes_3d(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading scene file {}", path.display()))?;
        let file: SceneFile =
            serde_json::from_slice(&bytes).with_context(|| format!("Parsing scene file {}", path.display()))?;
        Self::from_file(file).with_context(|| format!("Validating scene file {}", path.display()))
    }

    fn from_file(file: SceneFile) -> Result<Self> {
        if file.bodies.is_empty() {
            bail!("scene defines no bodies");
        }
        let mut seen = HashSet::new();
        for def in &file.bodies {
            if !seen.insert(def.id) {
                bail!("duplicate body id {}", def.id);
            }
            if !def.position.is_finite() || !def.dimensions.is_finite() {
                bail!("body {} has a non-finite position or size", def.id);
            }
        }
        let preset = Self::preset(file.view);
        Ok(Self {
            name: file.name.unwrap_or_else(|| "custom".to_string()),
            view: file.view,
            bodies: file.bodies,
            physics: file.physics.unwrap_or(preset.physics),
            grab: file.grab.unwrap_or(preset.grab),
            zones: file.zones.unwrap_or(preset.zones),
            hold_anchor: file.hold_anchor.unwrap_or(preset.hold_anchor),
        })
    }
}
