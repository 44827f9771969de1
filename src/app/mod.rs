mod console;
mod runtime_loop;

use self::console::ConsoleCommand;
use self::runtime_loop::RuntimeLoop;
use crate::config::{AppConfig, AppConfigOverrides, LoopConfig};
use crate::mailbox::Mailbox;
use crate::scene::SceneDefinition;
use crate::session::Session;
use crate::time::Time;
use crate::transport::{self, FrameSource, NoCamera, TransportHandle};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.json";

pub fn run() -> Result<()> {
    run_with_overrides(None, AppConfigOverrides::default())
}

/// Loads the config (explicit path, else the default file when present), applies CLI
/// overrides and runs until quit or the frame limit.
pub fn run_with_overrides(config_path: Option<&Path>, overrides: AppConfigOverrides) -> Result<()> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load_or_default(DEFAULT_CONFIG_PATH),
        None => AppConfig::default(),
    };
    if !overrides.is_empty() {
        info!(target: "handsort::app", fields = ?overrides.applied_fields(), "applying CLI overrides");
    }
    config.apply_overrides(&overrides);
    run_with_config(config)
}

pub fn run_with_config(config: AppConfig) -> Result<()> {
    let scene = match &config.scene {
        Some(path) => SceneDefinition::load(path)?,
        None => SceneDefinition::preset(config.view.kind),
    };
    info!(
        target: "handsort::app",
        scene = %scene.name,
        view = scene.view.label(),
        bodies = scene.bodies.len(),
        "scene ready"
    );

    let mailbox = Mailbox::new();
    let mut session = Session::new(&scene, config.session(), mailbox.clone());
    let transport = transport::spawn(config.transport(), mailbox, frame_source(&config)?)
        .context("Starting perception transport")?;
    let console = match console::spawn_console() {
        Ok(console) => console,
        Err(err) => {
            // Transcripts only arrive through the console.
            warn!(target: "handsort::app", "console unavailable: {err}");
            session.mark_voice_unavailable();
            mpsc::channel().1
        }
    };
    let mut runtime = RuntimeLoop::new(Time::new(), config.frame_loop.frame_rate);
    debug!(target: "handsort::app", frame_dt = ?runtime.frame_dt(), "frame loop ready");

    let result = drive(&mut session, &transport, &console, &mut runtime, &config.frame_loop);

    session.teardown();
    transport.shutdown();
    info!(
        target: "handsort::app",
        stats = %session.stats(),
        score = session.registry().score(),
        elapsed_secs = runtime.elapsed_seconds(),
        "session finished"
    );
    result
}

fn frame_source(config: &AppConfig) -> Result<Box<dyn FrameSource>> {
    let Some(path) = &config.connection.frame_image else {
        info!(target: "handsort::app", "no frame image configured, camera streaming disabled");
        return Ok(Box::new(NoCamera));
    };
    #[cfg(feature = "frame_stream")]
    {
        let source = transport::StillImageSource::open(path)?;
        info!(target: "handsort::app", image = %path.display(), "streaming still image frames");
        Ok(Box::new(source))
    }
    #[cfg(not(feature = "frame_stream"))]
    {
        warn!(target: "handsort::app", image = %path.display(), "built without frame_stream, ignoring frame image");
        Ok(Box::new(NoCamera))
    }
}

fn drive(
    session: &mut Session,
    transport: &TransportHandle,
    console: &Receiver<ConsoleCommand>,
    runtime: &mut RuntimeLoop,
    loop_config: &LoopConfig,
) -> Result<()> {
    let summary_every = u64::from(loop_config.frame_rate.max(1));
    let mut frames = 0u64;
    loop {
        for command in console.try_iter() {
            match command {
                ConsoleCommand::Quit => return Ok(()),
                ConsoleCommand::SetMode(mode) => session.set_mode(mode),
                ConsoleCommand::ToggleMode => {
                    session.toggle_mode();
                }
                ConsoleCommand::Calibrate => session.start_calibration(),
                ConsoleCommand::Reset { keep_score } => session.reset(keep_score),
                ConsoleCommand::Stats => info!(target: "handsort::app", stats = %session.stats(), "stats"),
                ConsoleCommand::Say(transcript) => {
                    if session.hear(&transcript).is_none() {
                        debug!(target: "handsort::voice", transcript = %transcript, "no voice command recognised");
                    }
                }
            }
        }

        let tick = runtime.tick(loop_config.max_backlog_frames);
        if let Some(dropped) = tick.dropped_backlog {
            debug!(target: "handsort::app", ?dropped, "frame loop fell behind, backlog dropped");
        }
        while let Some(dt) = runtime.pop_frame() {
            let snapshot = session.frame(dt);
            for event in session.take_events() {
                info!(target: "handsort::events", "{event}");
            }
            for command in session.take_commands() {
                if !transport.send(command) {
                    warn!(target: "handsort::app", "transport stopped, command {} not sent", command.wire_text());
                }
            }
            if snapshot.frame % summary_every == 0 {
                debug!(target: "handsort::app", "{}", snapshot.summary());
            }
            frames += 1;
            if loop_config.max_frames.is_some_and(|max| frames >= max) {
                return Ok(());
            }
        }
        thread::sleep(runtime.until_next_frame());
    }
}
