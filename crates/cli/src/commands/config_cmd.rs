//! `brainstem config` — Configuration management commands.

use brainstem_config::{AppConfig, DialogueBackend};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.dialogue.backend == DialogueBackend::OpenAi && !config.has_api_key() {
                warnings.push(
                    "No API key set (set BRAINSTEM_API_KEY or OPENAI_API_KEY); canned lines will be used",
                );
            }

            if !config.brain.enabled {
                warnings.push("Autonomy is disabled (brain.enabled = false); only chat commands will run");
            }

            if !config.brain.allow_mining && !config.brain.allow_wood && !config.brain.allow_collect {
                warnings.push("Mining, wood and item collection are all disabled");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Username:  {}", config.agent.username);
            println!("   Server:    {}:{}", config.agent.host, config.agent.port);
            println!("   Dialogue:  {:?} ({})", config.dialogue.backend, config.dialogue.model);
            println!("   Decide:    every {}ms", config.brain.decision_interval_ms);
            println!("   Autonomy:  {}", if config.brain.enabled { "on" } else { "off" });
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.dialogue.api_key.is_some() {
        config.dialogue.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
