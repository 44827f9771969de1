use crate::body::BodyId;
use crate::cursor::AlgorithmMode;
use crate::mailbox::ConnectionStatus;
use glam::Vec3;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InteractionEvent {
    Grabbed { id: BodyId },
    Released { id: BodyId, position: Vec3 },
    Scored { id: BodyId, position: Vec3, color: String, points: u32, total: u32 },
    Failed { id: BodyId, position: Vec3, penalty: u32, total: u32 },
    Respawned { id: BodyId },
    ModeChanged { mode: AlgorithmMode },
    ConnectionChanged { status: ConnectionStatus },
}

impl fmt::Display for InteractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionEvent::Grabbed { id } => write!(f, "Grabbed body={id}"),
            InteractionEvent::Released { id, position } => {
                write!(f, "Released body={id} at=({:.3}, {:.3}, {:.3})", position.x, position.y, position.z)
            }
            InteractionEvent::Scored { id, points, total, .. } => {
                write!(f, "Scored body={id} points=+{points} total={total}")
            }
            InteractionEvent::Failed { id, penalty, total, .. } => {
                write!(f, "Failed body={id} penalty=-{penalty} total={total}")
            }
            InteractionEvent::Respawned { id } => write!(f, "Respawned body={id}"),
            InteractionEvent::ModeChanged { mode } => write!(f, "ModeChanged mode={}", mode.label()),
            InteractionEvent::ConnectionChanged { status } => {
                write!(f, "ConnectionChanged status={}", status.label())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<InteractionEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: InteractionEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = InteractionEvent>) {
        self.events.extend(events);
    }

    pub fn drain(&mut self) -> Vec<InteractionEvent> {
        self.events.drain(..).collect()
    }
}
