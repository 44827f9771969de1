//! Owner of the interactive bodies, the grab slot, the score and the respawn timers.
//!
//! [`ObjectRegistry::step`] is one atomic pass for a frame: it borrows the registry
//! mutably for the whole pass, so grab decisions, scoring and physics never interleave
//! across bodies within a frame.

use crate::body::{Body, BodyDef, BodyId, BodyStatus};
use crate::cursor::CursorSample;
use crate::events::{EventBus, InteractionEvent};
use crate::interaction::{self, GrabDecision, GrabPolicy, GrabSlot, HoldAnchor};
use crate::physics::{self, PhysicsParams};
use crate::scene::SceneDefinition;
use crate::scoring::{DropOutcome, Score, ScoreRules, ZoneLayout};
use crate::time::Countdown;
use glam::Vec3;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_millis(2000);

/// What happened to the held body on a release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseOutcome {
    pub id: BodyId,
    pub position: Vec3,
    pub outcome: DropOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepSummary {
    pub claimed: Option<BodyId>,
    pub released: Option<ReleaseOutcome>,
    pub respawned: usize,
    pub floor_contacts: usize,
    pub resets: usize,
}

pub struct ObjectRegistry {
    bodies: Vec<Body>,
    slot: GrabSlot,
    score: Score,
    rules: ScoreRules,
    zones: ZoneLayout,
    physics: PhysicsParams,
    grab: GrabPolicy,
    hold_anchor: HoldAnchor,
    respawn_delay: Duration,
    respawns: Vec<(BodyId, Countdown)>,
    events: EventBus,
}

impl ObjectRegistry {
    pub fn new(scene: &SceneDefinition, rules: ScoreRules, respawn_delay: Duration) -> Self {
        Self {
            bodies: scene.bodies.iter().map(Body::new).collect(),
            slot: GrabSlot::default(),
            score: Score::default(),
            rules,
            zones: scene.zones,
            physics: scene.physics.sanitized(),
            grab: scene.grab,
            hold_anchor: scene.hold_anchor,
            respawn_delay,
            respawns: Vec::new(),
            events: EventBus::default(),
        }
    }

    pub fn from_defs(defs: &[BodyDef], physics: PhysicsParams, grab: GrabPolicy, zones: ZoneLayout) -> Self {
        let scene = SceneDefinition {
            name: "custom".to_string(),
            bodies: defs.to_vec(),
            physics,
            grab,
            zones,
            hold_anchor: HoldAnchor::centered(),
            ..SceneDefinition::default()
        };
        Self::new(&scene, ScoreRules::default(), DEFAULT_RESPAWN_DELAY)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|body| body.id() == id)
    }

    pub fn holder(&self) -> Option<BodyId> {
        self.slot.holder()
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn zones(&self) -> ZoneLayout {
        self.zones
    }

    pub fn physics(&self) -> &PhysicsParams {
        &self.physics
    }

    pub fn pending_respawns(&self) -> usize {
        self.respawns.len()
    }

    /// Ids of every body currently in GRABBED state; never more than one.
    pub fn grabbed_ids(&self) -> Vec<BodyId> {
        self.bodies.iter().filter(|body| body.status == BodyStatus::Grabbed).map(Body::id).collect()
    }

    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        self.events.drain()
    }

    pub fn step(&mut self, cursor: &CursorSample, dt: Duration) -> StepSummary {
        let mut summary = StepSummary { respawned: self.tick_respawns(dt), ..StepSummary::default() };

        match interaction::decide(&self.bodies, self.slot, cursor, &self.grab) {
            GrabDecision::Claim(id) => {
                if self.on_grab(id) {
                    summary.claimed = Some(id);
                }
            }
            GrabDecision::Release(id) => {
                self.follow_cursor(id, cursor.position);
                summary.released = self.on_release();
            }
            GrabDecision::Keep(_) | GrabDecision::None => {}
        }

        let settled = summary.released.map(|release| release.id);
        interaction::refresh_proximity(&mut self.bodies, self.slot, cursor, &self.grab, settled);

        for index in 0..self.bodies.len() {
            let id = self.bodies[index].id();
            if self.slot.holder() == Some(id) {
                self.follow_cursor(id, cursor.position);
                continue;
            }
            if self.bodies[index].status == BodyStatus::Success {
                continue;
            }
            let report = physics::step_body(&mut self.bodies, index, &self.physics);
            if report.floor.is_some() {
                summary.floor_contacts += 1;
            }
            if report.reset {
                warn!(target: "handsort::registry", body = id, "non-finite body state, respawned at spawn");
                summary.resets += 1;
            }
        }
        summary
    }

    /// Claims the grab slot for `id`. Fails when the slot is taken, the body is unknown,
    /// or it is waiting to respawn.
    pub fn on_grab(&mut self, id: BodyId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !interaction::can_be_grabbed(&self.bodies[index]) || !self.slot.claim(id) {
            return false;
        }
        let body = &mut self.bodies[index];
        body.status = BodyStatus::Grabbed;
        body.velocity = Vec3::ZERO;
        debug!(target: "handsort::registry", body = id, "grabbed");
        self.events.push(InteractionEvent::Grabbed { id });
        true
    }

    /// Releases the held body where it is and scores the drop.
    pub fn on_release(&mut self) -> Option<ReleaseOutcome> {
        let id = self.slot.release()?;
        let index = self.index_of(id)?;
        let (position, target) = {
            let body = &mut self.bodies[index];
            body.velocity = Vec3::ZERO;
            body.status = BodyStatus::Idle;
            (body.position, body.target())
        };
        self.events.push(InteractionEvent::Released { id, position });
        let outcome = self.zones.classify(target, position.x);
        match outcome {
            DropOutcome::Success => self.on_score(id, position),
            DropOutcome::Wrong => self.on_fail(id),
            DropOutcome::Neutral => debug!(target: "handsort::registry", body = id, "released in neutral ground"),
        }
        Some(ReleaseOutcome { id, position, outcome })
    }

    /// Awards the success points for `id`, freezes it at `position` and schedules its respawn.
    pub fn on_score(&mut self, id: BodyId, position: Vec3) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        if self.slot.holder() == Some(id) {
            self.slot.release();
        }
        let color = {
            let body = &mut self.bodies[index];
            body.position = position;
            body.velocity = Vec3::ZERO;
            body.status = BodyStatus::Success;
            body.color().to_string()
        };
        let points = self.rules.success_points;
        let total = self.score.award(points);
        self.respawns.retain(|(pending, _)| *pending != id);
        self.respawns.push((id, Countdown::new(self.respawn_delay)));
        debug!(target: "handsort::registry", body = id, total, "scored");
        self.events.push(InteractionEvent::Scored { id, position, color, points, total });
    }

    pub fn on_fail(&mut self, id: BodyId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        if self.slot.holder() == Some(id) {
            self.slot.release();
        }
        let position = {
            let body = &mut self.bodies[index];
            body.status = BodyStatus::Wrong;
            body.position
        };
        let penalty = self.rules.failure_penalty;
        let total = self.score.penalize(penalty);
        debug!(target: "handsort::registry", body = id, total, "dropped in the wrong zone");
        self.events.push(InteractionEvent::Failed { id, position, penalty, total });
    }

    /// Drops the held body without scoring it.
    pub fn force_release(&mut self) -> Option<BodyId> {
        let id = self.slot.release()?;
        if let Some(index) = self.index_of(id) {
            let body = &mut self.bodies[index];
            body.status = BodyStatus::Idle;
            body.velocity = Vec3::ZERO;
            self.events.push(InteractionEvent::Released { id, position: body.position });
        }
        debug!(target: "handsort::registry", body = id, "grab force-released");
        Some(id)
    }

    pub fn cancel_respawns(&mut self) -> usize {
        let cancelled = self.respawns.len();
        self.respawns.clear();
        cancelled
    }

    /// Every body back to its spawn, slot cleared, pending respawns cancelled.
    pub fn reset(&mut self, keep_score: bool) {
        self.cancel_respawns();
        self.slot.release();
        for body in &mut self.bodies {
            body.respawn();
        }
        if !keep_score {
            self.score.reset();
        }
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|body| body.id() == id)
    }

    fn follow_cursor(&mut self, id: BodyId, cursor: Vec3) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let body = &mut self.bodies[index];
        let target = interaction::held_position(body, cursor, &self.hold_anchor, self.physics.vertical);
        if target.is_finite() {
            body.position = target;
        }
        body.velocity = Vec3::ZERO;
    }

    fn tick_respawns(&mut self, dt: Duration) -> usize {
        let mut due = Vec::new();
        self.respawns.retain_mut(|(id, countdown)| {
            if countdown.tick(dt) {
                due.push(*id);
                false
            } else {
                true
            }
        });
        for id in &due {
            if let Some(index) = self.index_of(*id) {
                self.bodies[index].respawn();
                self.events.push(InteractionEvent::Respawned { id: *id });
            }
        }
        due.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ZoneSide;

    fn cubes() -> ObjectRegistry {
        ObjectRegistry::new(&SceneDefinition::cubes_3d(), ScoreRules::default(), DEFAULT_RESPAWN_DELAY)
    }

    fn frame() -> Duration {
        Duration::from_millis(16)
    }

    #[test]
    fn claim_then_keep_follows_cursor() {
        let mut registry = cubes();
        let grip = CursorSample::new(Vec3::new(-1.0, 0.0, 0.0), true);
        let summary = registry.step(&grip, frame());
        assert_eq!(summary.claimed, Some(1));
        registry.step(&CursorSample::new(Vec3::new(-0.5, 1.0, 0.2), true), frame());
        assert_eq!(registry.body(1).map(|body| body.position), Some(Vec3::new(-0.5, 1.0, 0.2)));
        assert_eq!(registry.grabbed_ids(), vec![1]);
    }

    #[test]
    fn hover_decays_while_slot_is_taken() {
        let mut registry = cubes();
        registry.step(&CursorSample::new(Vec3::new(0.0, 0.0, 0.0), false), frame());
        assert_eq!(registry.body(2).map(|body| body.status), Some(BodyStatus::Hover));
        registry.step(&CursorSample::new(Vec3::new(0.0, 0.0, 0.0), true), frame());
        assert_eq!(registry.holder(), Some(1));
        assert_eq!(registry.body(2).map(|body| body.status), Some(BodyStatus::Idle));
    }

    #[test]
    fn success_freezes_until_respawn() {
        let mut registry = cubes();
        registry.step(&CursorSample::new(Vec3::new(-1.0, 0.0, 0.0), true), frame());
        registry.step(&CursorSample::new(Vec3::new(-2.0, 0.5, 0.0), true), frame());
        let summary = registry.step(&CursorSample::new(Vec3::new(-2.0, 0.5, 0.0), false), frame());
        assert_eq!(summary.released.map(|release| release.outcome), Some(DropOutcome::Success));
        registry.step(&CursorSample::new(Vec3::new(-2.0, 0.5, 0.0), true), frame());
        assert_eq!(registry.holder(), None, "SUCCESS bodies cannot be grabbed");
        assert_eq!(registry.body(1).map(|body| body.position.y), Some(0.5), "frozen while waiting");
    }

    #[test]
    fn reset_cancels_timers_and_keeps_score_on_request() {
        let mut registry = cubes();
        registry.on_score(1, Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(registry.pending_respawns(), 1);
        registry.reset(true);
        assert_eq!(registry.pending_respawns(), 0);
        assert_eq!(registry.score(), 100);
        assert_eq!(registry.body(1).map(|body| body.status), Some(BodyStatus::Idle));
        registry.reset(false);
        assert_eq!(registry.score(), 0);
    }

    #[test]
    fn explicit_entry_points_emit_events() {
        let mut registry = cubes();
        assert!(registry.on_grab(2));
        assert!(!registry.on_grab(1), "slot already taken");
        assert_eq!(registry.force_release(), Some(2));
        registry.on_fail(2);
        let events = registry.drain_events();
        assert!(matches!(events[0], InteractionEvent::Grabbed { id: 2 }));
        assert!(matches!(events[1], InteractionEvent::Released { id: 2, .. }));
        assert!(matches!(events[2], InteractionEvent::Failed { id: 2, total: 0, .. }));
        assert_eq!(registry.body(2).map(|body| body.target()), Some(ZoneSide::Right));
    }
}
