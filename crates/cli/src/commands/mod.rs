pub mod ask;
pub mod config_cmd;
pub mod tools;

use mcpagent_agent::Agent;
use mcpagent_config::AppConfig;
use tracing::info;

/// Load the config and connect to the tool server and model.
pub async fn connect() -> Result<(AppConfig, Agent), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    MCPAGENT_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    info!(server = %config.mcp.url, model = %config.model.model_id, "Connecting");
    let agent = Agent::from_config(&config).await?;
    Ok((config, agent))
}
