//! Voice grip override used in manual mode.
//!
//! Only the boolean result matters to the interaction core; the recogniser that turns
//! audio into transcripts lives outside the crate and feeds [`VoiceGrip::hear`].

use serde::Serialize;

const GRIP_WORDS: [&str; 4] = ["grab", "close", "lock", "up"];
const RELEASE_WORDS: [&str; 3] = ["release", "open", "drop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceIntent {
    Grip,
    Release,
}

impl VoiceIntent {
    /// Grip words win when a transcript contains both kinds.
    pub fn classify(transcript: &str) -> Option<Self> {
        let lowered = transcript.trim().to_lowercase();
        if GRIP_WORDS.iter().any(|word| lowered.contains(word)) {
            Some(VoiceIntent::Grip)
        } else if RELEASE_WORDS.iter().any(|word| lowered.contains(word)) {
            Some(VoiceIntent::Release)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningStatus {
    #[default]
    Off,
    Listening,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceGrip {
    available: bool,
    active: bool,
    gripping: bool,
    last_heard: String,
}

impl Default for VoiceGrip {
    fn default() -> Self {
        Self::new(true)
    }
}

impl VoiceGrip {
    pub fn new(available: bool) -> Self {
        Self { available, active: false, gripping: false, last_heard: String::new() }
    }

    pub fn unavailable() -> Self {
        Self::new(false)
    }

    /// Turning voice off always drops the grip so it cannot leak into another mode.
    pub fn set_active(&mut self, active: bool) {
        self.active = active && self.available;
        if !self.active {
            self.gripping = false;
        }
    }

    pub fn mark_unavailable(&mut self) {
        self.available = false;
        self.set_active(false);
    }

    pub fn hear(&mut self, transcript: &str) -> Option<VoiceIntent> {
        if !self.active {
            return None;
        }
        self.last_heard = transcript.trim().to_lowercase();
        let intent = VoiceIntent::classify(transcript)?;
        self.gripping = intent == VoiceIntent::Grip;
        Some(intent)
    }

    pub fn gripping(&self) -> bool {
        self.active && self.gripping
    }

    pub fn last_heard(&self) -> &str {
        &self.last_heard
    }

    pub fn status(&self) -> ListeningStatus {
        if !self.available {
            ListeningStatus::Unavailable
        } else if self.active {
            ListeningStatus::Listening
        } else {
            ListeningStatus::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_classify() {
        assert_eq!(VoiceIntent::classify("Grab it"), Some(VoiceIntent::Grip));
        assert_eq!(VoiceIntent::classify("pick it up"), Some(VoiceIntent::Grip));
        assert_eq!(VoiceIntent::classify("DROP"), Some(VoiceIntent::Release));
        assert_eq!(VoiceIntent::classify("hello there"), None);
    }

    #[test]
    fn deactivation_clears_grip() {
        let mut voice = VoiceGrip::default();
        voice.set_active(true);
        voice.hear("lock");
        assert!(voice.gripping());
        voice.set_active(false);
        assert!(!voice.gripping());
        voice.set_active(true);
        assert!(!voice.gripping(), "grip does not come back on reactivation");
    }

    #[test]
    fn missing_microphone_never_grips() {
        let mut voice = VoiceGrip::unavailable();
        voice.set_active(true);
        assert_eq!(voice.hear("grab"), None);
        assert!(!voice.gripping());
        assert_eq!(voice.status(), ListeningStatus::Unavailable);
    }

    #[test]
    fn unrelated_words_keep_state() {
        let mut voice = VoiceGrip::default();
        voice.set_active(true);
        voice.hear("close");
        assert_eq!(voice.hear("nice weather"), None);
        assert!(voice.gripping());
        assert_eq!(voice.last_heard(), "nice weather");
    }
}
