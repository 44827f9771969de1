//! One-slot, latest-wins handoff between the socket thread and the frame loop.

use crate::feed::{LogEntry, PerceptionMessage, LOG_CAPACITY};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Offline,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "CONNECTING...",
            ConnectionStatus::Connected => "CONNECTED",
            ConnectionStatus::Offline => "SERVER OFFLINE",
        }
    }
}

/// Everything the frame loop needs from one `take`.
#[derive(Debug, Default)]
pub struct Delivery {
    pub message: Option<PerceptionMessage>,
    /// Log entries of every message posted since the last take, oldest batch first.
    pub logs: Vec<Vec<LogEntry>>,
    pub status: ConnectionStatus,
    /// Messages overwritten before the frame loop read them.
    pub superseded: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct Slot {
    message: Option<PerceptionMessage>,
    logs: Vec<Vec<LogEntry>>,
    status: ConnectionStatus,
    superseded: u64,
    rejected: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slot: Arc<Mutex<Slot>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, mut message: PerceptionMessage) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        let logs = std::mem::take(&mut message.logs);
        if !logs.is_empty() {
            slot.logs.push(logs);
            let total: usize = slot.logs.iter().map(Vec::len).sum();
            if total > LOG_CAPACITY * 2 {
                slot.logs.remove(0);
            }
        }
        if slot.message.replace(message).is_some() {
            slot.superseded += 1;
        }
    }

    pub fn reject(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.rejected += 1;
        }
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.status = status;
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.slot.lock().map(|slot| slot.status).unwrap_or(ConnectionStatus::Offline)
    }

    pub fn take(&self) -> Delivery {
        let Ok(mut slot) = self.slot.lock() else {
            return Delivery { status: ConnectionStatus::Offline, ..Delivery::default() };
        };
        Delivery {
            message: slot.message.take(),
            logs: std::mem::take(&mut slot.logs),
            status: slot.status,
            superseded: std::mem::take(&mut slot.superseded),
            rejected: std::mem::take(&mut slot.rejected),
        }
    }
}
