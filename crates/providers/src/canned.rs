//! Offline dialogue: a fixed list of ambient lines.

use async_trait::async_trait;
use brainstem_core::{DialogueError, DialogueProvider};
use rand::Rng;
use rand::seq::IndexedRandom;

const LINES: &[&str] = &[
    "Just checking on things around here.",
    "Exploring the area, feels cozy!",
    "Let me know if you need a hand with anything.",
    "I might go mine something shiny soon.",
];

/// Pick a random ambient line.
pub fn canned_line<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    LINES.choose(rng).copied().unwrap_or(LINES[0])
}

/// Provider that never touches the network.
#[derive(Debug, Default)]
pub struct CannedDialogue;

impl CannedDialogue {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DialogueProvider for CannedDialogue {
    fn name(&self) -> &str {
        "canned"
    }

    async fn chat(&self, _prompt: &str, _context: &str) -> Result<String, DialogueError> {
        Ok(canned_line(&mut rand::rng()).to_string())
    }
}
