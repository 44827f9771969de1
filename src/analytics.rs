use crate::events::InteractionEvent;
use crate::registry::StepSummary;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub frames: u64,
    pub messages: u64,
    pub superseded: u64,
    pub rejected: u64,
    pub grabs: u64,
    pub releases: u64,
    pub scores: u64,
    pub fails: u64,
    pub respawns: u64,
    pub physics_resets: u64,
    pub floor_contacts: u64,
    pub disconnects: u64,
}

/// Rolling frame-time history plus counters for everything the session did.
#[derive(Debug, Serialize)]
pub struct SessionStats {
    frame_hist: VecDeque<f32>,
    #[serde(skip)]
    frame_capacity: usize,
    events: VecDeque<InteractionEvent>,
    #[serde(skip)]
    event_capacity: usize,
    counters: SessionCounters,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new(240, 64)
    }
}

impl SessionStats {
    pub fn new(frame_capacity: usize, event_capacity: usize) -> Self {
        Self {
            frame_hist: VecDeque::with_capacity(frame_capacity.min(1_024)),
            frame_capacity: frame_capacity.max(1),
            events: VecDeque::with_capacity(event_capacity.min(1_024)),
            event_capacity: event_capacity.max(1),
            counters: SessionCounters::default(),
        }
    }

    pub fn record_frame(&mut self, dt_seconds: f32, summary: &StepSummary) {
        self.frame_hist.push_back(dt_seconds * 1000.0);
        while self.frame_hist.len() > self.frame_capacity {
            self.frame_hist.pop_front();
        }
        let counters = &mut self.counters;
        counters.frames += 1;
        counters.floor_contacts += summary.floor_contacts as u64;
        counters.physics_resets += summary.resets as u64;
    }

    pub fn record_delivery(&mut self, received: bool, superseded: u64, rejected: u64) {
        if received {
            self.counters.messages += 1;
        }
        self.counters.superseded += superseded;
        self.counters.rejected += rejected;
    }

    pub fn record_disconnect(&mut self) {
        self.counters.disconnects += 1;
    }

    pub fn record_events<'a>(&mut self, events: impl IntoIterator<Item = &'a InteractionEvent>) {
        for event in events {
            let counters = &mut self.counters;
            match event {
                InteractionEvent::Grabbed { .. } => counters.grabs += 1,
                InteractionEvent::Released { .. } => counters.releases += 1,
                InteractionEvent::Scored { .. } => counters.scores += 1,
                InteractionEvent::Failed { .. } => counters.fails += 1,
                InteractionEvent::Respawned { .. } => counters.respawns += 1,
                InteractionEvent::ModeChanged { .. } | InteractionEvent::ConnectionChanged { .. } => {}
            }
            if self.events.len() == self.event_capacity {
                self.events.pop_front();
            }
            self.events.push_back(event.clone());
        }
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &InteractionEvent> {
        self.events.iter()
    }

    pub fn average_frame_ms(&self) -> Option<f32> {
        if self.frame_hist.is_empty() {
            return None;
        }
        Some(self.frame_hist.iter().sum::<f32>() / self.frame_hist.len() as f32)
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        write!(
            f,
            "frames={} messages={} superseded={} rejected={} grabs={} scores={} fails={} respawns={} disconnects={}",
            c.frames, c.messages, c.superseded, c.rejected, c.grabs, c.scores, c.fails, c.respawns, c.disconnects
        )?;
        if let Some(avg) = self.average_frame_ms() {
            write!(f, " avg_frame_ms={avg:.2}")?;
        }
        Ok(())
    }
}
