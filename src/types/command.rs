//! Discrete control-surface commands

use serde::{Deserialize, Serialize};

/// One command from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    StartSession,
    EndSession,
    Recalibrate,
    ResetResults,
    ToggleOverlay,
    Quit,
}

impl Command {
    /// Single-key alias used by the interactive CLI
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "s" => Some(Command::StartSession),
            "e" => Some(Command::EndSession),
            "c" => Some(Command::Recalibrate),
            "r" => Some(Command::ResetResults),
            "l" => Some(Command::ToggleOverlay),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::StartSession => "start_session",
            Command::EndSession => "end_session",
            Command::Recalibrate => "recalibrate",
            Command::ResetResults => "reset_results",
            Command::ToggleOverlay => "toggle_overlay",
            Command::Quit => "quit",
        };
        write!(f, "{}", name)
    }
}
