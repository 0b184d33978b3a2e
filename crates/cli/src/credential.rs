use anyhow::Result;
use dialoguer::Input;
use tracing::debug;

use crate::config;

/// Pure read of the stored API key. Empty or whitespace-only means absent.
pub fn stored_api_key() -> Result<Option<String>> {
    let config = config::load_config()?;
    let key = config.server.api_key.trim().to_string();
    Ok(if key.is_empty() { None } else { Some(key) })
}

/// Get the stored API key, prompting for one if none is stored yet.
///
/// A supplied key is persisted before returning. Cancelling the prompt or
/// entering nothing returns `None`; callers must not retry on a tick timer,
/// acquisition is a startup-only affair.
pub fn acquire_api_key() -> Result<Option<String>> {
    if let Some(key) = stored_api_key()? {
        return Ok(Some(key));
    }

    println!("A Torn API key is required.");
    println!("  1. Go to https://www.torn.com/preferences.php#tab=api");
    println!("  2. Create a new API key with \"Public\" access");
    println!("  3. Paste the key below");

    let entered = match Input::<String>::new()
        .with_prompt("API key")
        .allow_empty(true)
        .interact_text()
    {
        Ok(value) => value,
        Err(e) => {
            debug!("API key prompt cancelled: {e}");
            return Ok(None);
        }
    };

    let key = entered.trim().to_string();
    if key.is_empty() {
        return Ok(None);
    }

    let mut config = config::load_config()?;
    config.server.api_key = key.clone();
    config::save_config(&config)?;
    Ok(Some(key))
}
