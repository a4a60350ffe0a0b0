//! Dialogue provider implementations for brainstem.
//!
//! All providers implement `brainstem_core::DialogueProvider`.
//! [`build_provider`] picks one from configuration.

pub mod canned;
pub mod openai;

pub use canned::{CannedDialogue, canned_line};
pub use openai::OpenAiDialogue;

use std::sync::Arc;

use brainstem_config::{DialogueBackend, DialogueConfig};
use brainstem_core::DialogueProvider;

/// Build the configured dialogue provider.
///
/// Falls back to [`CannedDialogue`] when the OpenAI backend is selected but
/// no API key is available.
pub fn build_provider(config: &DialogueConfig) -> Arc<dyn DialogueProvider> {
    match (config.backend, config.api_key.as_deref()) {
        (DialogueBackend::OpenAi, Some(key)) if !key.is_empty() => {
            tracing::info!(model = %config.model, "Dialogue provider enabled");
            Arc::new(OpenAiDialogue::from_config(config, key))
        }
        (DialogueBackend::OpenAi, _) => {
            tracing::warn!("Dialogue provider disabled: missing API key, using canned lines");
            Arc::new(CannedDialogue::new())
        }
        (DialogueBackend::Canned, _) => Arc::new(CannedDialogue::new()),
    }
}
