//! `brainstem status` — Show the effective configuration.

use brainstem_config::AppConfig;

fn on_off(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let brain = &config.brain;

    println!("🧠 Brainstem Status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Username:     {}", config.agent.username);
    println!("  Server:       {}:{}", config.agent.host, config.agent.port);
    println!("  Autonomy:     {}", on_off(brain.enabled));
    println!(
        "  Cycles:       scan {}ms, decide {}ms, social {}ms, gesture {}ms",
        brain.scan_interval_ms,
        brain.decision_interval_ms,
        brain.social_interval_ms,
        brain.idle.gesture_interval_ms
    );
    println!("  Task timeout: {}ms", brain.task_timeout_ms);
    println!("  Combat:       {}", on_off(brain.combat.enabled));
    println!("  Mining:       {}", on_off(brain.allow_mining));
    println!("  Wood:         {}", on_off(brain.allow_wood));
    println!("  Items:        {}", on_off(brain.allow_collect));
    println!("  Groups:       {}", on_off(brain.group.enabled));
    println!("  Remote seek:  {}", on_off(brain.seek.enabled));
    println!("  Dialogue:     {:?} ({})", config.dialogue.backend, config.dialogue.model);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Log level:    {}", config.logging.level);

    if AppConfig::config_path().exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `brainstem onboard` first");
    }

    Ok(())
}
