//! Read-only per-frame output for whatever draws the scene.

use crate::body::{Body, BodyId, BodyStatus, ZoneSide};
use crate::cursor::AlgorithmMode;
use crate::feed::{FeedMode, LogEntry};
use crate::mailbox::ConnectionStatus;
use crate::particles::ParticleBurst;
use crate::voice::ListeningStatus;
use glam::Vec3;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub dimensions: Vec3,
    pub color: String,
    pub status: BodyStatus,
    pub label: &'static str,
    pub target: ZoneSide,
}

impl From<&Body> for BodySnapshot {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id(),
            position: body.position,
            velocity: body.velocity,
            dimensions: body.dimensions(),
            color: body.color().to_string(),
            status: body.status,
            label: body.status.label(),
            target: body.target(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceSnapshot {
    pub status: ListeningStatus,
    pub gripping: bool,
    pub last_heard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub connection: ConnectionStatus,
    /// Status line: connection label while not connected, otherwise the gesture text.
    pub system_status: String,
    pub mode: AlgorithmMode,
    pub feed_mode: FeedMode,
    pub cursor: Vec3,
    pub gripping: bool,
    pub tracking: bool,
    pub handedness: String,
    pub confidence: f32,
    pub score: u32,
    pub holder: Option<BodyId>,
    pub bodies: Vec<BodySnapshot>,
    pub bursts: Vec<ParticleBurst>,
    pub logs: Vec<LogEntry>,
    pub voice: VoiceSnapshot,
}

impl FrameSnapshot {
    pub fn body(&self, id: BodyId) -> Option<&BodySnapshot> {
        self.bodies.iter().find(|body| body.id == id)
    }

    /// Compact one-line summary for console logging.
    pub fn summary(&self) -> String {
        let bodies: Vec<String> = self
            .bodies
            .iter()
            .map(|b| format!("#{}({:.2},{:.2},{:.2}){:?}", b.id, b.position.x, b.position.y, b.position.z, b.status))
            .collect();
        format!(
            "frame={} {} mode={} cursor=({:.2},{:.2},{:.2}) grip={} score={} [{}]",
            self.frame,
            self.connection.label(),
            self.mode.label(),
            self.cursor.x,
            self.cursor.y,
            self.cursor.z,
            self.gripping,
            self.score,
            bodies.join(" ")
        )
    }
}
