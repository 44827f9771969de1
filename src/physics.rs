//! Per-frame integrator for bodies nobody is holding.
//!
//! Units are "per frame": gravity is added to the velocity once per step and the
//! velocity is added to the position once per step, like the renderer-driven loop
//! this mirrors. All vertical math happens along a "down" axis so the same code
//! serves screen space (y grows downward) and world space (y grows upward).
//!
//! Stacking is a simplified, order-dependent resolution: bodies are visited in
//! registry order and each one only reacts to where the others are at that moment.
//! Simultaneous drops can therefore stack differently depending on order. It is a
//! known approximation, not a contact solver.

use crate::body::{Body, BodyId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Direction of scene-space `+y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAxis {
    Down,
    Up,
}

impl VerticalAxis {
    /// Converts a scene `y` into a down-positive coordinate. The mapping is its own
    /// inverse, so it also converts back.
    pub fn down(self, y: f32) -> f32 {
        match self {
            VerticalAxis::Down => y,
            VerticalAxis::Up => -y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Added to the downward velocity every frame.
    pub gravity: f32,
    /// Fraction of vertical speed kept after a floor contact. Must be below 1.
    pub bounce: f32,
    /// Floor height in scene `y`.
    pub floor: f32,
    pub vertical: VerticalAxis,
    /// How far below the other body's midpoint a bottom edge may be and still count
    /// as landing on top of it.
    pub stack_tolerance: f32,
    /// Horizontal overlap shaved off both sides before two bodies count as stacked.
    pub edge_inset: f32,
    /// Rebounds slower than this end in rest.
    pub rest_speed: f32,
}

impl PhysicsParams {
    pub fn buildings_2d() -> Self {
        Self {
            gravity: 0.0005,
            bounce: 0.2,
            floor: 0.95,
            vertical: VerticalAxis::Down,
            stack_tolerance: 0.1,
            edge_inset: 0.01,
            rest_speed: 0.001,
        }
    }

    pub fn cubes_3d() -> Self {
        Self {
            gravity: 0.01,
            bounce: 0.2,
            floor: -1.8,
            vertical: VerticalAxis::Up,
            stack_tolerance: 0.3,
            edge_inset: 0.05,
            rest_speed: 0.02,
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.gravity = self.gravity.abs();
        self.bounce = self.bounce.clamp(0.0, 0.99);
        self.stack_tolerance = self.stack_tolerance.max(0.0);
        self.edge_inset = self.edge_inset.max(0.0);
        self.rest_speed = self.rest_speed.max(0.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorContact {
    /// Downward speed at impact.
    pub impact_speed: f32,
    /// Upward speed after the bounce (0 when the body came to rest).
    pub rebound_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    pub floor: Option<FloorContact>,
    pub landed_on: Option<BodyId>,
    /// The body held non-finite state and was sent back to its spawn.
    pub reset: bool,
}

/// Vertical extent of a body in down-positive coordinates.
#[derive(Debug, Clone, Copy)]
struct Extent {
    id: BodyId,
    center: Vec3,
    half: Vec3,
    down: f32,
}

impl Extent {
    fn of(body: &Body, axis: VerticalAxis) -> Self {
        Self { id: body.id(), center: body.position, half: body.half_extents(), down: axis.down(body.position.y) }
    }

    fn top(&self) -> f32 {
        self.down - self.half.y
    }

    fn bottom(&self) -> f32 {
        self.down + self.half.y
    }
}

/// Gravity plus floor for a single body.
pub fn integrate(body: &mut Body, params: &PhysicsParams) -> Option<FloorContact> {
    let axis = params.vertical;
    let half_height = body.half_extents().y;
    let mut down = axis.down(body.position.y);
    let mut down_velocity = axis.down(body.velocity.y) + params.gravity;
    down += down_velocity;
    body.position.x += body.velocity.x;
    body.position.z += body.velocity.z;

    let floor = axis.down(params.floor);
    let mut contact = None;
    if down + half_height > floor {
        down = floor - half_height;
        let impact_speed = down_velocity;
        down_velocity = -down_velocity * params.bounce;
        if down_velocity.abs() < params.rest_speed {
            down_velocity = 0.0;
        }
        contact = Some(FloorContact { impact_speed, rebound_speed: -down_velocity });
    }

    body.position.y = axis.down(down);
    body.velocity.y = axis.down(down_velocity);
    contact
}

fn overlaps_horizontally(a: &Extent, b: &Extent, inset: f32) -> bool {
    let x = a.center.x - a.half.x < b.center.x + b.half.x - inset
        && a.center.x + a.half.x > b.center.x - b.half.x + inset;
    // Flat (2D) bodies have no depth to compare.
    let z = a.half.z <= 0.0
        || b.half.z <= 0.0
        || (a.center.z - a.half.z < b.center.z + b.half.z - inset
            && a.center.z + a.half.z > b.center.z - b.half.z + inset);
    x && z
}

/// Snaps `bodies[index]` on top of the first body it is falling into, in registry order.
pub fn resolve_stacking(bodies: &mut [Body], index: usize, params: &PhysicsParams) -> Option<BodyId> {
    let axis = params.vertical;
    for other_index in 0..bodies.len() {
        if other_index == index {
            continue;
        }
        let moving = Extent::of(&bodies[index], axis);
        let other = Extent::of(&bodies[other_index], axis);
        let vertical_overlap = moving.top() < other.bottom() && moving.bottom() > other.top();
        if !vertical_overlap || !overlaps_horizontally(&moving, &other, params.edge_inset) {
            continue;
        }
        let falling = axis.down(bodies[index].velocity.y) > 0.0;
        let on_top = moving.bottom() - other.down < params.stack_tolerance;
        if on_top && falling {
            let body = &mut bodies[index];
            body.position.y = axis.down(other.top() - moving.half.y);
            body.velocity.y = 0.0;
            return Some(other.id);
        }
    }
    None
}

/// Full free-body step: gravity, floor, stacking, and a reset if anything went non-finite.
pub fn step_body(bodies: &mut [Body], index: usize, params: &PhysicsParams) -> StepReport {
    let floor = integrate(&mut bodies[index], params);
    let landed_on = resolve_stacking(bodies, index, params);
    let body = &mut bodies[index];
    let reset = !body.is_finite();
    if reset {
        body.respawn();
    }
    StepReport { floor, landed_on, reset }
}
