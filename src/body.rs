use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type BodyId = u32;

/// Side of the table a body has to be dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyStatus {
    #[default]
    Idle,
    Hover,
    Grabbed,
    Success,
    Wrong,
}

impl BodyStatus {
    pub fn label(self) -> &'static str {
        match self {
            BodyStatus::Idle => "",
            BodyStatus::Hover => "GRAB",
            BodyStatus::Grabbed => "LOCKED",
            BodyStatus::Success => "READY",
            BodyStatus::Wrong => "RETRY",
        }
    }
}

/// Declarative body description, as found in scene files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub id: BodyId,
    /// Center of the body in scene space.
    pub position: Vec3,
    /// Full extents; 2D bodies use `z = 0`.
    pub dimensions: Vec3,
    #[serde(default = "BodyDef::default_color")]
    pub color: String,
    pub target: ZoneSide,
}

impl BodyDef {
    fn default_color() -> String {
        "#ffffff".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    id: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
    dimensions: Vec3,
    color: String,
    target: ZoneSide,
    pub status: BodyStatus,
    spawn: Vec3,
}

impl Body {
    pub fn new(def: &BodyDef) -> Self {
        Self {
            id: def.id,
            position: def.position,
            velocity: Vec3::ZERO,
            dimensions: def.dimensions.abs(),
            color: def.color.clone(),
            target: def.target,
            status: BodyStatus::Idle,
            spawn: def.position,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn dimensions(&self) -> Vec3 {
        self.dimensions
    }

    pub fn half_extents(&self) -> Vec3 {
        self.dimensions * 0.5
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn target(&self) -> ZoneSide {
        self.target
    }

    pub fn spawn(&self) -> Vec3 {
        self.spawn
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Back to the spawn point, at rest and idle.
    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec3::ZERO;
        self.status = BodyStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_restores_spawn_state() {
        let def = BodyDef {
            id: 7,
            position: Vec3::new(-1.0, 0.0, 0.0),
            dimensions: Vec3::splat(1.2),
            color: "#fee685".into(),
            target: ZoneSide::Left,
        };
        let mut body = Body::new(&def);
        body.position = Vec3::new(3.0, -1.0, 0.5);
        body.velocity = Vec3::new(0.0, -0.2, 0.0);
        body.status = BodyStatus::Success;
        body.respawn();
        assert_eq!(body.position, def.position);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.status, BodyStatus::Idle);
    }
}
