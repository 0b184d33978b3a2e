use anyhow::{Context, Result};
use std::path::PathBuf;

use tornwatch_runtime_config::{apply_compat_fallbacks, WatchConfig, CONFIG_FILE_NAME};

/// Get the config directory path (~/.config/tornwatch/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("tornwatch"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config from disk, returning defaults if the file does not exist.
pub fn load_config() -> Result<WatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(WatchConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: WatchConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    apply_compat_fallbacks(&mut config);
    Ok(config)
}

/// Save config to disk (in `tornwatch.toml`), creating the directory if needed.
pub fn save_config(config: &WatchConfig) -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config dir at {}", dir.display()))?;

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    let path = config_path()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

/// Print current config, eliding the stored API key.
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let path = config_path()?;
    println!("Config file: {}", path.display());
    println!();
    println!("[server]");
    println!("  url     = {}", config.server.url);
    println!(
        "  api_key = {}",
        if config.server.api_key.is_empty() {
            "(not set)".to_string()
        } else {
            format!(
                "{}...",
                &config.server.api_key[..4.min(config.server.api_key.len())]
            )
        }
    );
    println!();
    println!("[poll]");
    println!("  interval_secs        = {}", config.poll.interval_secs);
    println!(
        "  request_timeout_secs = {}",
        config.poll.request_timeout_secs
    );
    Ok(())
}

/// Update config with provided values.
pub fn set_config(
    api_key: Option<String>,
    server: Option<String>,
    interval: Option<u64>,
) -> Result<()> {
    let mut config = load_config()?;

    if let Some(key) = api_key {
        config.server.api_key = key;
    }
    if let Some(url) = server {
        config.server.url = url;
    }
    if let Some(secs) = interval {
        config.poll.interval_secs = secs;
    }

    apply_compat_fallbacks(&mut config);
    save_config(&config)?;
    println!("Configuration updated.");
    show_config()?;
    Ok(())
}
