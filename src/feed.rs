//! Perception feed adapter.
//!
//! The backend sends one JSON object per processed camera frame. Every field is
//! optional on the wire; [`FeedAdapter::ingest`] folds a decoded message into a
//! complete [`InputState`], filling gaps from documented defaults or from the last
//! known good value.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

pub const HAND_LANDMARK_COUNT: usize = 21;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const LOG_CAPACITY: usize = 50;

/// Pointer position before any message supplied one: the canvas center.
pub const CANVAS_CENTER: Vec3 = Vec3::new(0.5, 0.5, 0.0);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed perception message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("perception message is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gesture {
    #[default]
    None,
    Open,
    Gripping,
}

impl Gesture {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GRIPPING" => Gesture::Gripping,
            "OPEN" | "OPEN HAND" => Gesture::Open,
            _ => Gesture::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPhase {
    Starting,
    Waiting,
    Sampling,
}

/// Operating mode as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "phase")]
pub enum FeedMode {
    #[default]
    Ai,
    Manual,
    Calibrating(CalibrationPhase),
}

impl FeedMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AI" => Some(FeedMode::Ai),
            "MANUAL" => Some(FeedMode::Manual),
            "CALIBRATING" => Some(FeedMode::Calibrating(CalibrationPhase::Starting)),
            "CALIBRATING_WAIT" => Some(FeedMode::Calibrating(CalibrationPhase::Waiting)),
            "CALIBRATING_SCAN" => Some(FeedMode::Calibrating(CalibrationPhase::Sampling)),
            _ => None,
        }
    }

    pub fn is_calibrating(self) -> bool {
        matches!(self, FeedMode::Calibrating(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.time, self.kind, self.message)
    }
}

/// Newest-first log buffer capped at [`LOG_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
}

impl LogRing {
    /// Pushes a batch that arrived in one message. The batch keeps its own order and
    /// lands in front of everything older.
    pub fn push_batch(&mut self, batch: impl IntoIterator<Item = LogEntry>) {
        let batch: Vec<LogEntry> = batch.into_iter().collect();
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.entries.truncate(LOG_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Deserialize)]
struct WirePoint {
    x: Option<f64>,
    y: Option<f64>,
    #[serde(default)]
    z: Option<f64>,
}

impl WirePoint {
    fn finite(&self) -> Option<Vec3> {
        let x = self.x? as f32;
        let y = self.y? as f32;
        let z = self.z.unwrap_or(0.0) as f32;
        let point = Vec3::new(x, y, z);
        point.is_finite().then_some(point)
    }
}

#[derive(Debug, Deserialize)]
struct WireLog {
    #[serde(default)]
    time: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: Option<String>,
}

/// Every field is kept as raw JSON so a wrong-typed field degrades on its own instead
/// of failing the whole message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    landmarks: Option<serde_json::Value>,
    #[serde(default)]
    gesture: Option<serde_json::Value>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default)]
    handedness: Option<serde_json::Value>,
    #[serde(default)]
    finger_tip: Option<serde_json::Value>,
    #[serde(default)]
    mode: Option<serde_json::Value>,
    #[serde(default)]
    logs: Option<serde_json::Value>,
}

fn as_string(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(text) => Some(text),
        _ => None,
    }
}

/// A decoded inbound message. Absent fields stay `None`; defaults are applied by the
/// adapter, which knows the last good values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerceptionMessage {
    pub landmarks: Option<Vec<Landmark>>,
    pub gesture: Option<String>,
    pub confidence: Option<f32>,
    pub handedness: Option<String>,
    pub finger_tip: Option<Vec3>,
    pub mode: Option<FeedMode>,
    pub logs: Vec<LogEntry>,
}

impl PerceptionMessage {
    pub fn decode(text: &str) -> Result<Self, FeedError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(FeedError::NotAnObject);
        }
        let wire: WireMessage = serde_json::from_value(value)?;
        Ok(Self::from_wire(wire))
    }

    fn from_wire(wire: WireMessage) -> Self {
        let landmarks = wire.landmarks.map(|raw| match raw.as_array() {
            Some(joints) => decode_landmarks(joints),
            None => Vec::new(),
        });
        let finger_tip = wire
            .finger_tip
            .and_then(|value| serde_json::from_value::<WirePoint>(value).ok())
            .and_then(|point| point.finite());
        let confidence = wire.confidence.and_then(|value| value.as_f64()).map(|c| c as f32).filter(|c| c.is_finite());
        let mode = wire.mode.as_ref().and_then(serde_json::Value::as_str).and_then(FeedMode::parse);
        let logs = match wire.logs {
            Some(serde_json::Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|value| serde_json::from_value::<WireLog>(value).ok())
                .filter_map(|log| {
                    Some(LogEntry {
                        time: log.time.unwrap_or_default(),
                        kind: log.kind.unwrap_or_else(|| "INFO".to_string()),
                        message: log.message?,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            landmarks,
            gesture: as_string(wire.gesture),
            confidence,
            handedness: as_string(wire.handedness),
            finger_tip,
            mode,
            logs,
        }
    }
}

/// All-or-nothing: one unusable joint invalidates the hand.
fn decode_landmarks(raw: &[serde_json::Value]) -> Vec<Landmark> {
    let mut out = Vec::with_capacity(raw.len().min(HAND_LANDMARK_COUNT));
    for value in raw.iter().take(HAND_LANDMARK_COUNT) {
        let point = serde_json::from_value::<WirePoint>(value.clone()).ok().and_then(|p| p.finite());
        match point {
            Some(p) => out.push(Landmark { x: p.x, y: p.y, z: p.z }),
            None => return Vec::new(),
        }
    }
    out
}

/// Immutable per-frame view of the perception stream.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    pub landmarks: Vec<Landmark>,
    pub gesture: Gesture,
    pub handedness: String,
    pub confidence: f32,
    pub cursor: Vec3,
    pub mode: FeedMode,
    /// Raw gesture text; carries the countdown while the backend calibrates.
    pub status_text: String,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            landmarks: Vec::new(),
            gesture: Gesture::None,
            handedness: "N/A".to_string(),
            confidence: 0.0,
            cursor: CANVAS_CENTER,
            mode: FeedMode::default(),
            status_text: String::new(),
        }
    }
}

impl InputState {
    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    pub fn has_hand(&self) -> bool {
        !self.landmarks.is_empty()
    }
}

/// Folds decoded messages into successive [`InputState`]s and keeps the backend log.
#[derive(Debug, Default)]
pub struct FeedAdapter {
    current: InputState,
    logs: LogRing,
}

impl FeedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, message: PerceptionMessage) -> &InputState {
        let previous = &self.current;
        let next = InputState {
            landmarks: message.landmarks.unwrap_or_default(),
            gesture: message.gesture.as_deref().map(Gesture::parse).unwrap_or_default(),
            handedness: message.handedness.unwrap_or_else(|| "N/A".to_string()),
            confidence: message.confidence.map(|c| c.clamp(0.0, 100.0)).unwrap_or(0.0),
            cursor: message.finger_tip.unwrap_or(previous.cursor),
            mode: message.mode.unwrap_or(previous.mode),
            status_text: message.gesture.unwrap_or_default(),
        };
        self.logs.push_batch(message.logs);
        self.current = next;
        &self.current
    }

    /// Appends log entries that arrived without a state update.
    pub fn push_logs(&mut self, logs: impl IntoIterator<Item = LogEntry>) {
        self.logs.push_batch(logs);
    }

    /// Drops hand data while keeping the last pointer and mode; used when the feed goes
    /// offline so nothing keeps acting on a stale gesture.
    pub fn clear_hand(&mut self) {
        self.current.landmarks.clear();
        self.current.gesture = Gesture::None;
        self.current.confidence = 0.0;
        self.current.status_text.clear();
    }

    pub fn current(&self) -> &InputState {
        &self.current
    }

    pub fn logs(&self) -> &LogRing {
        &self.logs
    }
}
