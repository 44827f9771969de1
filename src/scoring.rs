use crate::body::ZoneSide;
use serde::{Deserialize, Serialize};

/// Two target zones mirrored around `center_x`; drops farther than `boundary` from the
/// center land in a zone, anything closer is neutral ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    pub center_x: f32,
    pub boundary: f32,
}

impl ZoneLayout {
    pub fn cubes_3d() -> Self {
        Self { center_x: 0.0, boundary: 1.5 }
    }

    pub fn buildings_2d() -> Self {
        Self { center_x: 0.5, boundary: 0.3 }
    }

    pub fn classify(&self, target: ZoneSide, x: f32) -> DropOutcome {
        let dx = x - self.center_x;
        let correct = match target {
            ZoneSide::Left => dx < -self.boundary,
            ZoneSide::Right => dx > self.boundary,
        };
        if correct {
            DropOutcome::Success
        } else if dx.abs() > self.boundary {
            DropOutcome::Wrong
        } else {
            DropOutcome::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOutcome {
    Success,
    Wrong,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRules {
    pub success_points: u32,
    pub failure_penalty: u32,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self { success_points: 100, failure_penalty: 50 }
    }
}

/// Running score; never drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score(u32);

impl Score {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn award(&mut self, points: u32) -> u32 {
        self.0 = self.0.saturating_add(points);
        self.0
    }

    pub fn penalize(&mut self, points: u32) -> u32 {
        self.0 = self.0.saturating_sub(points);
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_zones_match_reference_boundaries() {
        let zones = ZoneLayout::cubes_3d();
        assert_eq!(zones.classify(ZoneSide::Left, -2.0), DropOutcome::Success);
        assert_eq!(zones.classify(ZoneSide::Left, 2.0), DropOutcome::Wrong);
        assert_eq!(zones.classify(ZoneSide::Left, 0.0), DropOutcome::Neutral);
        assert_eq!(zones.classify(ZoneSide::Right, 1.6), DropOutcome::Success);
        assert_eq!(zones.classify(ZoneSide::Right, -1.5), DropOutcome::Neutral, "boundary itself is neutral");
    }

    #[test]
    fn building_zones_are_centered_on_the_canvas() {
        let zones = ZoneLayout::buildings_2d();
        assert_eq!(zones.classify(ZoneSide::Left, 0.1), DropOutcome::Success);
        assert_eq!(zones.classify(ZoneSide::Right, 0.1), DropOutcome::Wrong);
        assert_eq!(zones.classify(ZoneSide::Right, 0.5), DropOutcome::Neutral);
    }

    #[test]
    fn score_floors_at_zero() {
        let mut score = Score::default();
        score.award(30);
        assert_eq!(score.penalize(50), 0);
        assert_eq!(score.award(100), 100);
    }
}
