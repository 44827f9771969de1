//! One frame is one consistent pass: mailbox, feed, cursor, registry, bursts, snapshot.

use crate::analytics::SessionStats;
use crate::cursor::{AlgorithmMode, CursorAnchor, CursorResolver, CursorSample, ViewProjection};
use crate::events::{EventBus, InteractionEvent};
use crate::feed::{FeedAdapter, FeedMode, InputState};
use crate::mailbox::{ConnectionStatus, Mailbox};
use crate::particles::Bursts;
use crate::registry::{ObjectRegistry, DEFAULT_RESPAWN_DELAY};
use crate::scene::SceneDefinition;
use crate::scoring::ScoreRules;
use crate::snapshot::{BodySnapshot, FrameSnapshot, VoiceSnapshot};
use crate::transport::ControlCommand;
use crate::voice::{VoiceGrip, VoiceIntent};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub initial_mode: AlgorithmMode,
    pub cursor_anchor: CursorAnchor,
    /// Lerp factor toward the newest cursor point; 1.0 disables smoothing.
    pub cursor_smoothing: f32,
    pub rules: ScoreRules,
    pub respawn_delay: Duration,
    pub voice_available: bool,
    /// Fixed seed for particle bursts; `None` seeds from entropy.
    pub burst_seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_mode: AlgorithmMode::Ai,
            cursor_anchor: CursorAnchor::IndexTip,
            cursor_smoothing: 1.0,
            rules: ScoreRules::default(),
            respawn_delay: DEFAULT_RESPAWN_DELAY,
            voice_available: true,
            burst_seed: None,
        }
    }
}

pub struct Session {
    mailbox: Mailbox,
    feed: FeedAdapter,
    resolver: CursorResolver,
    projection: ViewProjection,
    voice: VoiceGrip,
    registry: ObjectRegistry,
    bursts: Bursts,
    events: EventBus,
    stats: SessionStats,
    commands: Vec<ControlCommand>,
    mode: AlgorithmMode,
    connection: ConnectionStatus,
    last_feed_mode: Option<FeedMode>,
    received_since_connect: bool,
    cursor: CursorSample,
    frame: u64,
    torn_down: bool,
}

impl Session {
    pub fn new(scene: &SceneDefinition, settings: SessionSettings, mailbox: Mailbox) -> Self {
        let mut voice = VoiceGrip::new(settings.voice_available);
        voice.set_active(settings.initial_mode == AlgorithmMode::Manual);
        let projection = ViewProjection::new(scene.view, settings.cursor_smoothing);
        let resolver = CursorResolver::new(settings.cursor_anchor);
        let cursor = CursorSample { position: projection.project(resolver.last()), gripping: false, tracking: false };
        let bursts = match settings.burst_seed {
            Some(seed) => Bursts::seeded(seed),
            None => Bursts::default(),
        };
        Self {
            connection: mailbox.status(),
            mailbox,
            feed: FeedAdapter::new(),
            resolver,
            projection,
            voice,
            registry: ObjectRegistry::new(scene, settings.rules, settings.respawn_delay),
            bursts,
            events: EventBus::default(),
            stats: SessionStats::default(),
            commands: Vec::new(),
            mode: settings.initial_mode,
            last_feed_mode: None,
            received_since_connect: false,
            cursor,
            frame: 0,
            torn_down: false,
        }
    }

    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub fn mode(&self) -> AlgorithmMode {
        self.mode
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn input(&self) -> &InputState {
        self.feed.current()
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Direct access for callers that drive the grab/score entry points themselves.
    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn voice(&self) -> &VoiceGrip {
        &self.voice
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn frame(&mut self, dt: Duration) -> FrameSnapshot {
        if self.torn_down {
            return self.snapshot();
        }
        self.frame += 1;

        let delivery = self.mailbox.take();
        self.stats.record_delivery(delivery.message.is_some(), delivery.superseded, delivery.rejected);
        if delivery.rejected > 0 {
            debug!(target: "handsort::session", rejected = delivery.rejected, "dropped malformed messages");
        }
        self.sync_connection(delivery.status);
        for batch in delivery.logs {
            for entry in &batch {
                debug!(target: "handsort::backend", "{entry}");
            }
            self.feed.push_logs(batch);
        }
        if let Some(message) = delivery.message {
            if self.connection != ConnectionStatus::Offline {
                self.feed.ingest(message);
                self.received_since_connect = true;
            }
        }
        self.sync_feed_mode();

        let input = self.feed.current();
        if input.mode.is_calibrating() && self.registry.force_release().is_some() {
            info!(target: "handsort::session", "calibration started, grab released");
        }
        let resolved = self.resolver.resolve(input, self.mode, self.voice.gripping());
        let mut cursor = self.projection.apply(resolved);
        if self.connection == ConnectionStatus::Offline {
            cursor.gripping = false;
            cursor.tracking = false;
        }
        self.cursor = cursor;

        let summary = self.registry.step(&cursor, dt);
        self.bursts.step();
        let events = self.registry.drain_events();
        for event in &events {
            if let InteractionEvent::Scored { position, color, .. } = event {
                self.bursts.spawn(*position, color);
            }
        }
        self.publish(events);
        self.stats.record_frame(dt.as_secs_f32(), &summary);
        self.snapshot()
    }

    pub fn set_mode(&mut self, mode: AlgorithmMode) {
        if mode == self.mode {
            return;
        }
        self.apply_mode(mode);
        self.commands.push(ControlCommand::SetMode(mode));
    }

    pub fn toggle_mode(&mut self) -> AlgorithmMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn start_calibration(&mut self) {
        self.registry.force_release();
        self.commands.push(ControlCommand::Calibrate);
        self.drain_registry_events();
        info!(target: "handsort::session", "calibration requested");
    }

    pub fn hear(&mut self, transcript: &str) -> Option<VoiceIntent> {
        let intent = self.voice.hear(transcript);
        if let Some(intent) = intent {
            debug!(target: "handsort::voice", transcript, ?intent, "voice command");
        }
        intent
    }

    /// Voice input has no source for the rest of the session; manual mode falls back to
    /// never gripping.
    pub fn mark_voice_unavailable(&mut self) {
        self.voice.mark_unavailable();
        warn!(target: "handsort::voice", "voice input unavailable");
    }

    pub fn reset(&mut self, keep_score: bool) {
        self.registry.reset(keep_score);
        self.bursts.clear();
        self.projection.reset();
        self.drain_registry_events();
        info!(target: "handsort::session", keep_score, "scene reset");
    }

    /// Stops everything deferred: respawn timers, the grab, voice capture and bursts.
    /// Later frames only return the last state.
    pub fn teardown(&mut self) -> usize {
        let cancelled = self.registry.cancel_respawns();
        self.registry.force_release();
        self.voice.set_active(false);
        self.bursts.clear();
        self.drain_registry_events();
        self.torn_down = true;
        info!(target: "handsort::session", cancelled, "session torn down");
        cancelled
    }

    pub fn take_events(&mut self) -> Vec<InteractionEvent> {
        self.events.drain()
    }

    pub fn take_commands(&mut self) -> Vec<ControlCommand> {
        std::mem::take(&mut self.commands)
    }

    fn apply_mode(&mut self, mode: AlgorithmMode) {
        self.mode = mode;
        self.registry.force_release();
        self.voice.set_active(mode == AlgorithmMode::Manual);
        self.projection.reset();
        self.drain_registry_events();
        self.publish(vec![InteractionEvent::ModeChanged { mode }]);
        info!(target: "handsort::session", mode = mode.label(), "algorithm mode changed");
    }

    fn sync_connection(&mut self, status: ConnectionStatus) {
        if status == self.connection {
            return;
        }
        let previous = std::mem::replace(&mut self.connection, status);
        match status {
            ConnectionStatus::Offline => {
                self.registry.force_release();
                self.feed.clear_hand();
                self.projection.reset();
                self.stats.record_disconnect();
                info!(target: "handsort::session", "perception feed offline");
            }
            ConnectionStatus::Connected => {
                self.received_since_connect = false;
                self.last_feed_mode = None;
                self.commands.push(ControlCommand::SetMode(self.mode));
                info!(target: "handsort::session", ?previous, "perception feed connected");
            }
            ConnectionStatus::Connecting => {}
        }
        self.drain_registry_events();
        self.publish(vec![InteractionEvent::ConnectionChanged { status }]);
    }

    /// Adopts a mode the backend switched to on its own. Only a change between two
    /// messages counts, so a stale message cannot undo a local switch.
    fn sync_feed_mode(&mut self) {
        let feed_mode = self.feed.current().mode;
        let changed = self.last_feed_mode.map_or(false, |last| last != feed_mode);
        self.last_feed_mode = Some(feed_mode);
        if !changed {
            return;
        }
        let backend_mode = match feed_mode {
            FeedMode::Ai => AlgorithmMode::Ai,
            FeedMode::Manual => AlgorithmMode::Manual,
            FeedMode::Calibrating(_) => return,
        };
        if backend_mode != self.mode {
            self.apply_mode(backend_mode);
        }
    }

    fn drain_registry_events(&mut self) {
        let events = self.registry.drain_events();
        self.publish(events);
    }

    fn publish(&mut self, events: Vec<InteractionEvent>) {
        self.stats.record_events(&events);
        self.events.extend(events);
    }

    fn system_status(&self) -> String {
        let input = self.feed.current();
        match self.connection {
            ConnectionStatus::Connected if !self.received_since_connect => "WAITING INPUT".to_string(),
            ConnectionStatus::Connected if input.mode.is_calibrating() => input.status_text.clone(),
            ConnectionStatus::Connected if input.has_hand() => "TRACKING ACTIVE".to_string(),
            ConnectionStatus::Connected => "SEARCHING...".to_string(),
            other => other.label().to_string(),
        }
    }

    fn snapshot(&self) -> FrameSnapshot {
        let input = self.feed.current();
        FrameSnapshot {
            frame: self.frame,
            connection: self.connection,
            system_status: self.system_status(),
            mode: self.mode,
            feed_mode: input.mode,
            cursor: self.cursor.position,
            gripping: self.cursor.gripping,
            tracking: self.cursor.tracking,
            handedness: input.handedness.clone(),
            confidence: input.confidence,
            score: self.registry.score(),
            holder: self.registry.holder(),
            bodies: self.registry.bodies().iter().map(BodySnapshot::from).collect(),
            bursts: self.bursts.live().to_vec(),
            logs: self.feed.logs().to_vec(),
            voice: VoiceSnapshot {
                status: self.voice.status(),
                gripping: self.voice.gripping(),
                last_heard: self.voice.last_heard().to_string(),
            },
        }
    }
}
