use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

/// Upstream playback feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Fixed delay between reconnection attempts.  Never grows.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Player companion control API (transport commands and state snapshot).
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Cross-platform link aggregation endpoint.
    #[serde(default = "default_links_url")]
    pub links_url: String,
    /// Resolution token substituted into cover URLs, e.g. `320x320`.
    #[serde(default = "default_cover_resolution")]
    pub cover_resolution: String,
}

/// External presenter for the share dialog.
///
/// The presenter is spawned as `<command> <args...> <payload.json>`.  When
/// `command` is empty the share key only signals an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_share_dir")]
    pub temp_dir: PathBuf,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            temp_dir: default_share_dir(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            links_url: default_links_url(),
            cover_resolution: default_cover_resolution(),
        }
    }
}

fn default_feed_url() -> String {
    platform::feed_url()
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_api_base_url() -> String {
    platform::api_base_url()
}

fn default_links_url() -> String {
    "https://api.song.link/v1-alpha.1/links".to_string()
}

fn default_cover_resolution() -> String {
    "320x320".to_string()
}

fn default_share_dir() -> PathBuf {
    platform::temp_dir()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn reconnect_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.feed.reconnect_delay_secs)
    }
}
