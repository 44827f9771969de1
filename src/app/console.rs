//! Line-based operator console on stdin. Lines that are not commands are treated as
//! voice transcripts, which makes the manual-mode voice grip drivable from a terminal.

use crate::cursor::AlgorithmMode;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    SetMode(AlgorithmMode),
    ToggleMode,
    Calibrate,
    Reset { keep_score: bool },
    Stats,
    Quit,
    Say(String),
}

impl ConsoleCommand {
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_ascii_lowercase();
        let command = match lowered.as_str() {
            "mode ai" => ConsoleCommand::SetMode(AlgorithmMode::Ai),
            "mode manual" => ConsoleCommand::SetMode(AlgorithmMode::Manual),
            "mode" | "toggle" => ConsoleCommand::ToggleMode,
            "calibrate" => ConsoleCommand::Calibrate,
            "reset" => ConsoleCommand::Reset { keep_score: true },
            "reset all" => ConsoleCommand::Reset { keep_score: false },
            "stats" => ConsoleCommand::Stats,
            "quit" | "exit" => ConsoleCommand::Quit,
            _ => ConsoleCommand::Say(trimmed.to_string()),
        };
        Some(command)
    }
}

/// Reads stdin on its own thread; the receiver disconnects at end of input.
pub(crate) fn spawn_console() -> io::Result<Receiver<ConsoleCommand>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new().name("handsort-console".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(command) = ConsoleCommand::parse(&line) {
                if tx.send(command).is_err() {
                    break;
                }
            }
        }
    })?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_transcripts() {
        assert_eq!(ConsoleCommand::parse("Mode Manual"), Some(ConsoleCommand::SetMode(AlgorithmMode::Manual)));
        assert_eq!(ConsoleCommand::parse("reset all"), Some(ConsoleCommand::Reset { keep_score: false }));
        assert_eq!(ConsoleCommand::parse("  "), None);
        assert_eq!(ConsoleCommand::parse("grab it"), Some(ConsoleCommand::Say("grab it".to_string())));
    }
}
