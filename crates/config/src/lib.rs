//! Configuration loading, validation, and management for brainstem.
//!
//! Loads configuration from `~/.brainstem/config.toml` with environment
//! variable overrides. Validates all settings at startup.

mod brain;

pub use brain::{
    BrainConfig, ChatDelayConfig, CombatConfig, GroupConfig, IdleConfig, MemoryConfig, RangeMs,
    SeekConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.brainstem/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent identity and server endpoint
    #[serde(default)]
    pub agent: AgentConfig,

    /// Decision engine tunables
    #[serde(default)]
    pub brain: BrainConfig,

    /// Dialogue provider
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_username() -> String {
    "Jarvis".into()
}
fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    25565
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which dialogue backend produces chat lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueBackend {
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
    /// Fixed phrase list, no network
    Canned,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    #[serde(default = "default_backend")]
    pub backend: DialogueBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Exchanges kept as rolling context
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_dialogue_timeout")]
    pub timeout_ms: u64,
}

fn default_backend() -> DialogueBackend {
    DialogueBackend::OpenAi
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.8
}
fn default_max_tokens() -> u32 {
    120
}
fn default_max_history() -> usize {
    10
}
fn default_system_prompt() -> String {
    "You are Jarvis, a friendly player in a block-building survival game. \
     Keep replies short, casual and in character. Never mention being an AI."
        .into()
}
fn default_dialogue_timeout() -> u64 {
    10_000
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_history: default_max_history(),
            system_prompt: default_system_prompt(),
            timeout_ms: default_dialogue_timeout(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for DialogueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueConfig")
            .field("backend", &self.backend)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_history", &self.max_history)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.brainstem/config.toml).
    ///
    /// Environment overrides:
    /// - `BRAINSTEM_API_KEY`, then `OPENAI_API_KEY`
    /// - `BRAINSTEM_MODEL`
    /// - `BRAINSTEM_USERNAME`
    /// - `BRAINSTEM_AUTONOMOUS` (`true`/`false`, `1`/`0`)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        if config.dialogue.api_key.is_none() {
            config.dialogue.api_key = std::env::var("BRAINSTEM_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("BRAINSTEM_MODEL") {
            config.dialogue.model = model;
        }

        if let Ok(username) = std::env::var("BRAINSTEM_USERNAME") {
            config.agent.username = username;
        }

        if let Ok(flag) = std::env::var("BRAINSTEM_AUTONOMOUS") {
            match parse_flag(&flag) {
                Some(enabled) => config.brain.enabled = enabled,
                None => tracing::warn!(value = %flag, "Ignoring unrecognized BRAINSTEM_AUTONOMOUS"),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".brainstem")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.username.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.username must not be empty".into(),
            ));
        }

        if self.dialogue.temperature < 0.0 || self.dialogue.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "dialogue.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.dialogue.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "dialogue.timeout_ms must be > 0".into(),
            ));
        }

        self.brain.validate().map_err(ConfigError::ValidationError)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.dialogue.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
