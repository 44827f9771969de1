//! Cursor resolution: one pointer and one gripping flag per frame.

use crate::feed::{Gesture, InputState, CANVAS_CENTER, INDEX_TIP, THUMB_TIP};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Who drives the pointer: the landmark model, or the backend's manual tracker paired
/// with voice commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmMode {
    #[default]
    Ai,
    Manual,
}

impl AlgorithmMode {
    pub fn label(self) -> &'static str {
        match self {
            AlgorithmMode::Ai => "AI",
            AlgorithmMode::Manual => "MANUAL",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AlgorithmMode::Ai => AlgorithmMode::Manual,
            AlgorithmMode::Manual => AlgorithmMode::Ai,
        }
    }
}

/// Which landmark(s) stand for the pointer in AI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorAnchor {
    #[default]
    IndexTip,
    PinchMidpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorSample {
    pub position: Vec3,
    pub gripping: bool,
    /// A hand (or the manual tracker) currently supplies the position.
    pub tracking: bool,
}

impl CursorSample {
    pub fn new(position: Vec3, gripping: bool) -> Self {
        Self { position, gripping, tracking: true }
    }
}

#[derive(Debug, Clone)]
pub struct CursorResolver {
    anchor: CursorAnchor,
    last: Vec3,
}

impl Default for CursorResolver {
    fn default() -> Self {
        Self::new(CursorAnchor::default())
    }
}

impl CursorResolver {
    pub fn new(anchor: CursorAnchor) -> Self {
        Self { anchor, last: CANVAS_CENTER }
    }

    /// Exactly one branch sources the sample, chosen by `mode` alone. `voice_gripping`
    /// is only consulted in manual mode.
    pub fn resolve(&mut self, input: &InputState, mode: AlgorithmMode, voice_gripping: bool) -> CursorSample {
        let (position, gripping, tracking) = match mode {
            AlgorithmMode::Ai => match self.anchor_point(input) {
                Some(point) => (point, input.gesture == Gesture::Gripping, true),
                None => (self.last, input.gesture == Gesture::Gripping, false),
            },
            AlgorithmMode::Manual => (input.cursor, voice_gripping, true),
        };
        self.last = position;
        // The backend reuses the gesture field for countdown text while calibrating.
        let gripping = gripping && !input.mode.is_calibrating();
        CursorSample { position, gripping, tracking }
    }

    pub fn last(&self) -> Vec3 {
        self.last
    }

    fn anchor_point(&self, input: &InputState) -> Option<Vec3> {
        let index = input.landmark(INDEX_TIP)?.to_vec3();
        match self.anchor {
            CursorAnchor::IndexTip => Some(index),
            CursorAnchor::PinchMidpoint => {
                let thumb = input.landmark(THUMB_TIP)?.to_vec3();
                Some((thumb + index) * 0.5)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    #[serde(alias = "2d")]
    TwoD,
    #[serde(alias = "3d")]
    ThreeD,
}

impl ViewKind {
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::TwoD => "2D",
            ViewKind::ThreeD => "3D",
        }
    }
}

/// Maps normalized camera coordinates into scene space, with optional smoothing.
#[derive(Debug, Clone)]
pub struct ViewProjection {
    kind: ViewKind,
    smoothing: f32,
    smoothed: Option<Vec3>,
}

impl ViewProjection {
    /// `smoothing` is the lerp factor toward the new point; 1.0 disables smoothing.
    pub fn new(kind: ViewKind, smoothing: f32) -> Self {
        let smoothing = if smoothing.is_finite() { smoothing.clamp(0.01, 1.0) } else { 1.0 };
        Self { kind, smoothing, smoothed: None }
    }

    pub fn project(&self, normalized: Vec3) -> Vec3 {
        match self.kind {
            ViewKind::TwoD => Vec3::new(normalized.x, normalized.y, 0.0),
            ViewKind::ThreeD => Vec3::new(
                (normalized.x - 0.5) * -10.0,
                (normalized.y - 0.5) * -10.0,
                normalized.z * -5.0,
            ),
        }
    }

    pub fn apply(&mut self, sample: CursorSample) -> CursorSample {
        let target = self.project(sample.position);
        let position = match self.smoothed {
            Some(previous) if self.smoothing < 1.0 => previous.lerp(target, self.smoothing),
            _ => target,
        };
        self.smoothed = Some(position);
        CursorSample { position, ..sample }
    }

    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}
