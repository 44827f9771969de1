use crate::config::AppConfigOverrides;
use crate::cursor::{AlgorithmMode, ViewKind};
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

const SUPPORTED: &str = "--config, --scene, --url, --view, --mode, --frames, --frame-image, --log-level";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    scene: Option<PathBuf>,
    url: Option<String>,
    view: Option<ViewKind>,
    mode: Option<AlgorithmMode>,
    frames: Option<u64>,
    frame_image: Option<PathBuf>,
    log_level: Option<String>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "scene" => overrides.scene = Some(PathBuf::from(value)),
                "url" => {
                    if value.starts_with("wss://") {
                        bail!("Invalid url '{value}'. TLS is not supported; use a plain ws:// address.");
                    }
                    if !value.starts_with("ws://") {
                        bail!("Invalid url '{value}'. Expected a ws:// address.");
                    }
                    overrides.url = Some(value);
                }
                "view" => overrides.view = Some(parse_view(&value)?),
                "mode" => overrides.mode = Some(parse_mode(&value)?),
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u64>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "frame-image" => overrides.frame_image = Some(PathBuf::from(value)),
                "log-level" => overrides.log_level = Some(parse_log_level(&value)?),
                _ => bail!("Unknown flag '{flag}'. Supported flags: {SUPPORTED}."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            url: self.url,
            view: self.view,
            mode: self.mode,
            max_frames: self.frames,
            frame_image: self.frame_image,
            scene: self.scene,
        }
    }
}

fn parse_view(value: &str) -> Result<ViewKind> {
    match value.to_ascii_lowercase().as_str() {
        "2d" | "two_d" | "buildings" => Ok(ViewKind::TwoD),
        "3d" | "three_d" | "cubes" => Ok(ViewKind::ThreeD),
        other => bail!("Invalid view '{other}'. Use 2d or 3d."),
    }
}

fn parse_mode(value: &str) -> Result<AlgorithmMode> {
    match value.to_ascii_lowercase().as_str() {
        "ai" => Ok(AlgorithmMode::Ai),
        "manual" => Ok(AlgorithmMode::Manual),
        other => bail!("Invalid mode '{other}'. Use ai or manual."),
    }
}

fn parse_log_level(value: &str) -> Result<String> {
    let lowered = value.to_ascii_lowercase();
    match lowered.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(lowered),
        other => bail!("Invalid log level '{other}'. Use trace, debug, info, warn or error."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_mode_and_frames() {
        let args = ["app", "--view", "3d", "--mode", "MANUAL", "--frames", "120"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.view, Some(ViewKind::ThreeD));
        assert_eq!(overrides.mode, Some(AlgorithmMode::Manual));
        assert_eq!(overrides.max_frames, Some(120));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--view", "3d", "--view", "2d", "--log-level", "info", "--log-level", "debug"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.log_level(), Some("debug"));
        assert_eq!(overrides.into_config_overrides().view, Some(ViewKind::TwoD));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--frames"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_urls() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["app", "--url", "http://localhost"]).is_err());
    }

    #[test]
    fn tls_urls_are_rejected() {
        let err = CliOverrides::parse(["app", "--url", "wss://tracker.local/ws"]).unwrap_err();
        assert!(err.to_string().contains("TLS is not supported"));
        let overrides = CliOverrides::parse(["app", "--url", "ws://tracker.local/ws"]).expect("plain ws accepted");
        assert_eq!(overrides.into_config_overrides().url.as_deref(), Some("ws://tracker.local/ws"));
    }
}
