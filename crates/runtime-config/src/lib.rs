//! Persisted configuration types for tornwatch.
//!
//! The CLI reads and writes `tornwatch.toml` using these types. Path
//! resolution and prompting live in the CLI crate; this crate only defines
//! the schema and its defaults.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "tornwatch.toml";

/// Top-level configuration (persisted as `tornwatch.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatchConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Torn API base URL.
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Stored API key; empty means "not yet acquired".
    #[serde(default)]
    pub api_key: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Seconds between overlay refreshes.
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    /// Per-request timeout for the last-action fetch.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_api_url() -> String {
    "https://api.torn.com".to_string()
}
fn default_poll_interval() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    10
}

/// Normalize values a hand-edited config can break.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut WatchConfig) -> bool {
    let mut changed = false;

    if config.server.url.trim().is_empty() {
        config.server.url = default_api_url();
        changed = true;
    }

    if config.poll.interval_secs == 0 {
        config.poll.interval_secs = default_poll_interval();
        changed = true;
    }

    if config.poll.request_timeout_secs == 0 {
        config.poll.request_timeout_secs = default_request_timeout();
        changed = true;
    }

    changed
}
