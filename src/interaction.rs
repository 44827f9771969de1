//! Grab/release state machine.
//!
//! All bodies share one [`GrabSlot`]. A frame's decision is computed from a single read
//! of the slot and applied with a single write, so two bodies can never both see the
//! slot empty and claim it in the same frame.

use crate::body::{Body, BodyId, BodyStatus};
use crate::cursor::CursorSample;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How close the cursor must be for a body to be grab-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrabPolicy {
    /// Cursor inside the body's rectangle grown by `margin` on every side (2D).
    Margin { margin: f32 },
    /// Cursor within `radius` of the body's center (3D).
    Radius { radius: f32 },
}

impl GrabPolicy {
    pub fn buildings_2d() -> Self {
        GrabPolicy::Margin { margin: 0.05 }
    }

    pub fn cubes_3d() -> Self {
        GrabPolicy::Radius { radius: 1.8 }
    }

    pub fn is_proximate(&self, body: &Body, cursor: Vec3) -> bool {
        match *self {
            GrabPolicy::Margin { margin } => {
                let half = body.half_extents();
                let offset = (cursor - body.position).abs();
                offset.x < half.x + margin && offset.y < half.y + margin
            }
            GrabPolicy::Radius { radius } => body.position.distance(cursor) < radius,
        }
    }
}

/// Where a held body sits relative to the cursor: `down_fraction` of the body's height
/// below it along the vertical axis (0 = centered on the cursor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldAnchor {
    pub down_fraction: f32,
}

impl HoldAnchor {
    pub fn buildings_2d() -> Self {
        Self { down_fraction: 0.3 }
    }

    pub fn centered() -> Self {
        Self { down_fraction: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrabSlot {
    holder: Option<BodyId>,
}

impl GrabSlot {
    pub fn holder(&self) -> Option<BodyId> {
        self.holder
    }

    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }

    /// Claims the slot only if it is empty.
    pub fn claim(&mut self, id: BodyId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(id);
        true
    }

    pub fn release(&mut self) -> Option<BodyId> {
        self.holder.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabDecision {
    Claim(BodyId),
    Keep(BodyId),
    Release(BodyId),
    None,
}

pub fn can_be_grabbed(body: &Body) -> bool {
    body.status != BodyStatus::Success
}

/// Nearest eligible body; ties go to the earlier body in registry order.
pub fn select_candidate(bodies: &[Body], cursor: Vec3, policy: &GrabPolicy) -> Option<BodyId> {
    let mut best: Option<(BodyId, f32)> = None;
    for body in bodies.iter().filter(|body| can_be_grabbed(body) && policy.is_proximate(body, cursor)) {
        let distance = body.position.distance(cursor);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((body.id(), distance));
        }
    }
    best.map(|(id, _)| id)
}

pub fn decide(bodies: &[Body], slot: GrabSlot, cursor: &CursorSample, policy: &GrabPolicy) -> GrabDecision {
    match slot.holder() {
        Some(id) if cursor.gripping => GrabDecision::Keep(id),
        Some(id) => GrabDecision::Release(id),
        None if cursor.gripping && cursor.tracking => {
            select_candidate(bodies, cursor.position, policy).map_or(GrabDecision::None, GrabDecision::Claim)
        }
        None => GrabDecision::None,
    }
}

/// HOVER/IDLE bookkeeping for every body that is neither held nor waiting to respawn.
/// `settled` names a body whose status was decided this frame and must stay visible.
pub fn refresh_proximity(
    bodies: &mut [Body],
    slot: GrabSlot,
    cursor: &CursorSample,
    policy: &GrabPolicy,
    settled: Option<BodyId>,
) {
    for body in bodies.iter_mut() {
        if Some(body.id()) == slot.holder() || Some(body.id()) == settled {
            continue;
        }
        if matches!(body.status, BodyStatus::Success | BodyStatus::Grabbed) {
            continue;
        }
        let proximate = cursor.tracking && policy.is_proximate(body, cursor.position);
        body.status = if slot.is_empty() && proximate { BodyStatus::Hover } else { BodyStatus::Idle };
    }
}

/// Scene position of a body held at `cursor`.
pub fn held_position(body: &Body, cursor: Vec3, anchor: &HoldAnchor, vertical: crate::physics::VerticalAxis) -> Vec3 {
    let offset = anchor.down_fraction * body.dimensions().y;
    let y = vertical.down(vertical.down(cursor.y) + offset);
    Vec3::new(cursor.x, y, if body.dimensions().z > 0.0 { cursor.z } else { body.position.z })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDef, ZoneSide};

    fn cube(id: BodyId, x: f32) -> Body {
        Body::new(&BodyDef {
            id,
            position: Vec3::new(x, 0.0, 0.0),
            dimensions: Vec3::splat(1.2),
            color: "#fff".into(),
            target: ZoneSide::Left,
        })
    }

    #[test]
    fn slot_claim_is_exclusive() {
        let mut slot = GrabSlot::default();
        assert!(slot.claim(1));
        assert!(!slot.claim(2));
        assert_eq!(slot.release(), Some(1));
        assert!(slot.is_empty());
    }

    #[test]
    fn nearest_candidate_wins() {
        let bodies = vec![cube(1, -1.0), cube(2, 1.0)];
        let policy = GrabPolicy::cubes_3d();
        assert_eq!(select_candidate(&bodies, Vec3::new(0.3, 0.0, 0.0), &policy), Some(2));
        assert_eq!(select_candidate(&bodies, Vec3::new(-0.3, 0.0, 0.0), &policy), Some(1));
        assert_eq!(select_candidate(&bodies, Vec3::new(0.0, 0.0, 0.0), &policy), Some(1), "tie keeps order");
        assert_eq!(select_candidate(&bodies, Vec3::new(5.0, 0.0, 0.0), &policy), None);
    }

    #[test]
    fn no_claim_without_tracking() {
        let bodies = vec![cube(1, 0.0)];
        let cursor = CursorSample { position: Vec3::ZERO, gripping: true, tracking: false };
        assert_eq!(decide(&bodies, GrabSlot::default(), &cursor, &GrabPolicy::cubes_3d()), GrabDecision::None);
    }

    #[test]
    fn margin_policy_extends_rectangle() {
        let body = Body::new(&BodyDef {
            id: 1,
            position: Vec3::new(0.5, 0.5, 0.0),
            dimensions: Vec3::new(0.2, 0.2, 0.0),
            color: "#fff".into(),
            target: ZoneSide::Right,
        });
        let policy = GrabPolicy::buildings_2d();
        assert!(policy.is_proximate(&body, Vec3::new(0.64, 0.5, 0.0)));
        assert!(!policy.is_proximate(&body, Vec3::new(0.66, 0.5, 0.0)));
    }

    #[test]
    fn building_hangs_below_cursor() {
        let body = Body::new(&BodyDef {
            id: 1,
            position: Vec3::new(0.5, 0.5, 0.0),
            dimensions: Vec3::new(0.1, 0.2, 0.0),
            color: "#fff".into(),
            target: ZoneSide::Right,
        });
        let held = held_position(&body, Vec3::new(0.3, 0.4, 0.7), &HoldAnchor::buildings_2d(), crate::physics::VerticalAxis::Down);
        assert!((held - Vec3::new(0.3, 0.46, 0.0)).length() < 1e-6);
    }
}
