//! Dialogue Provider trait — the abstraction over chat-line generation.
//!
//! The brain asks for a short line given a prompt and a context string. Any
//! failure (disabled, network, empty text, timeout) is answered with a canned
//! phrase by the caller, so implementations are free to fail.

use async_trait::async_trait;

use crate::error::DialogueError;

#[async_trait]
pub trait DialogueProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "canned").
    fn name(&self) -> &str;

    /// Generate a line of chat.
    async fn chat(&self, prompt: &str, context: &str) -> Result<String, DialogueError>;

    /// Record something the agent heard or experienced so later replies can
    /// refer to it. Default implementation keeps nothing.
    fn observe(&self, _note: &str) {}
}
