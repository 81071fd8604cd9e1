//! `mcpagent config`: configuration management commands.

use mcpagent_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.has_api_key() {
                warnings.push("No API key set (set MCPAGENT_API_KEY or OPENAI_API_KEY)");
            }
            if config.mcp.auth.enabled && std::env::var(&config.mcp.auth.token_env).is_err() {
                warnings.push("Tool auth is enabled but the token variable is not set");
            }

            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Server:      {}", config.mcp.url);
            println!("   Model:       {}", config.model.model_id);
            println!("   Timeout:     {}s", config.mcp.timeout_secs);
            println!("   Iterations:  {}", config.agent.max_iterations);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{config:#?}");
    Ok(())
}

pub fn path() {
    println!("{}", AppConfig::config_dir().join("config.toml").display());
}

pub fn default() {
    println!("{}", AppConfig::default_toml());
}
