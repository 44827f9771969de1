use crate::cursor::{AlgorithmMode, CursorAnchor, ViewKind};
use crate::scoring::ScoreRules;
use crate::session::SessionSettings;
use crate::transport::{TransportConfig, DEFAULT_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "ConnectionConfig::default_url")]
    pub url: String,
    #[serde(default = "ConnectionConfig::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "ConnectionConfig::default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "ConnectionConfig::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "ConnectionConfig::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "ConnectionConfig::default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Still image streamed in place of a camera; no frames are sent without one.
    #[serde(default)]
    pub frame_image: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "LoopConfig::default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "LoopConfig::default_max_backlog_frames")]
    pub max_backlog_frames: u32,
    /// Stop after this many frames; runs until quit when absent.
    #[serde(default)]
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub kind: ViewKind,
    #[serde(default = "ViewConfig::default_cursor_smoothing")]
    pub cursor_smoothing: f32,
    #[serde(default)]
    pub cursor_anchor: CursorAnchor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "InteractionConfig::default_respawn_delay_ms")]
    pub respawn_delay_ms: u64,
    #[serde(default = "InteractionConfig::default_success_points")]
    pub success_points: u32,
    #[serde(default = "InteractionConfig::default_failure_penalty")]
    pub failure_penalty: u32,
    #[serde(default = "InteractionConfig::default_voice_enabled")]
    pub voice_enabled: bool,
    #[serde(default)]
    pub burst_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default, rename = "loop")]
    pub frame_loop: LoopConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub initial_mode: AlgorithmMode,
    /// Scene file replacing the built-in preset of `view.kind`.
    #[serde(default)]
    pub scene: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub url: Option<String>,
    pub view: Option<ViewKind>,
    pub mode: Option<AlgorithmMode>,
    pub max_frames: Option<u64>,
    pub frame_image: Option<PathBuf>,
    pub scene: Option<PathBuf>,
}

impl ConnectionConfig {
    fn default_url() -> String {
        DEFAULT_URL.to_string()
    }

    const fn default_frame_interval_ms() -> u64 {
        50
    }

    const fn default_reconnect_delay_ms() -> u64 {
        1_000
    }

    const fn default_read_timeout_ms() -> u64 {
        5
    }

    const fn default_connect_timeout_ms() -> u64 {
        2_000
    }

    const fn default_write_timeout_ms() -> u64 {
        250
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            frame_interval_ms: Self::default_frame_interval_ms(),
            reconnect_delay_ms: Self::default_reconnect_delay_ms(),
            read_timeout_ms: Self::default_read_timeout_ms(),
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            write_timeout_ms: Self::default_write_timeout_ms(),
            frame_image: None,
        }
    }
}

impl LoopConfig {
    const fn default_frame_rate() -> u32 {
        60
    }

    const fn default_max_backlog_frames() -> u32 {
        5
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_rate: Self::default_frame_rate(),
            max_backlog_frames: Self::default_max_backlog_frames(),
            max_frames: None,
        }
    }
}

impl ViewConfig {
    const fn default_cursor_smoothing() -> f32 {
        1.0
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            kind: ViewKind::default(),
            cursor_smoothing: Self::default_cursor_smoothing(),
            cursor_anchor: CursorAnchor::default(),
        }
    }
}

impl InteractionConfig {
    const fn default_respawn_delay_ms() -> u64 {
        2_000
    }

    const fn default_success_points() -> u32 {
        100
    }

    const fn default_failure_penalty() -> u32 {
        50
    }

    const fn default_voice_enabled() -> bool {
        true
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            respawn_delay_ms: Self::default_respawn_delay_ms(),
            success_points: Self::default_success_points(),
            failure_penalty: Self::default_failure_penalty(),
            voice_enabled: Self::default_voice_enabled(),
            burst_seed: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(target: "handsort::config", "Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(url) = &overrides.url {
            self.connection.url = url.clone();
        }
        if let Some(view) = overrides.view {
            self.view.kind = view;
        }
        if let Some(mode) = overrides.mode {
            self.initial_mode = mode;
        }
        if let Some(frames) = overrides.max_frames {
            self.frame_loop.max_frames = Some(frames);
        }
        if let Some(image) = &overrides.frame_image {
            self.connection.frame_image = Some(image.clone());
        }
        if let Some(scene) = &overrides.scene {
            self.scene = Some(scene.clone());
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            url: self.connection.url.clone(),
            frame_interval: Duration::from_millis(self.connection.frame_interval_ms.max(1)),
            reconnect_delay: Duration::from_millis(self.connection.reconnect_delay_ms),
            read_timeout: Duration::from_millis(self.connection.read_timeout_ms.max(1)),
            connect_timeout: Duration::from_millis(self.connection.connect_timeout_ms.max(1)),
            write_timeout: Duration::from_millis(self.connection.write_timeout_ms.max(1)),
        }
    }

    pub fn session(&self) -> SessionSettings {
        SessionSettings {
            initial_mode: self.initial_mode,
            cursor_anchor: self.view.cursor_anchor,
            cursor_smoothing: self.view.cursor_smoothing,
            rules: ScoreRules {
                success_points: self.interaction.success_points,
                failure_penalty: self.interaction.failure_penalty,
            },
            respawn_delay: Duration::from_millis(self.interaction.respawn_delay_ms),
            voice_available: self.interaction.voice_enabled,
            burst_seed: self.interaction.burst_seed,
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.view.is_none()
            && self.mode.is_none()
            && self.max_frames.is_none()
            && self.frame_image.is_none()
            && self.scene.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.url.is_some() {
            fields.push("url");
        }
        if self.view.is_some() {
            fields.push("view");
        }
        if self.mode.is_some() {
            fields.push("mode");
        }
        if self.max_frames.is_some() {
            fields.push("frames");
        }
        if self.frame_image.is_some() {
            fields.push("frame_image");
        }
        if self.scene.is_some() {
            fields.push("scene");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").expect("parse config");
        assert_eq!(cfg.connection.url, "ws://localhost:8000/ws");
        assert_eq!(cfg.connection.frame_interval_ms, 50);
        assert_eq!(cfg.frame_loop.frame_rate, 60);
        assert_eq!(cfg.view.kind, ViewKind::TwoD);
        assert_eq!(cfg.interaction.respawn_delay_ms, 2_000);
        assert_eq!(cfg.initial_mode, AlgorithmMode::Ai);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut cfg = AppConfig::default();
        let overrides = AppConfigOverrides { view: Some(ViewKind::ThreeD), max_frames: Some(10), ..Default::default() };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.view.kind, ViewKind::ThreeD);
        assert_eq!(cfg.frame_loop.max_frames, Some(10));
        assert_eq!(cfg.connection.url, DEFAULT_URL);
        assert_eq!(overrides.applied_fields(), vec!["view", "frames"]);
    }

    #[test]
    fn session_settings_follow_interaction_section() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"interaction":{"success_points":10,"voice_enabled":false},"initial_mode":"manual"}"#)
                .expect("parse config");
        let settings = cfg.session();
        assert_eq!(settings.rules.success_points, 10);
        assert_eq!(settings.rules.failure_penalty, 50);
        assert!(!settings.voice_available);
        assert_eq!(settings.initial_mode, AlgorithmMode::Manual);
    }
}
