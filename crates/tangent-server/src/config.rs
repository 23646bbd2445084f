use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tangent_core::rate_limit::RateLimitConfig;

/// Server configuration, loaded from a TOML file with CLI/env overrides
/// applied on top. Every section and field is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentConfig,
    pub rate_limit: RateLimitSettings,
    pub chat: ChatConfig,
    pub features: Features,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory scanned recursively for `*.md` documents.
    pub dir: PathBuf,
    /// Precomputed embeddings file; similarity features degrade gracefully
    /// when it is missing.
    pub embeddings_path: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            dir: PathBuf::from("content"),
            embeddings_path: PathBuf::from("public/embeddings.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        RateLimitSettings {
            max_requests: 10,
            window_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

impl RateLimitSettings {
    pub fn to_core(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Only ever populated from the environment, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            model: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: 1024,
            api_key: None,
        }
    }
}

/// Feature toggles; a disabled feature's endpoints return 404.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Features {
    pub chat: bool,
    pub graph: bool,
    pub stats: bool,
    pub mentions: bool,
}

impl Default for Features {
    fn default() -> Self {
        Features {
            chat: false,
            graph: true,
            stats: true,
            mentions: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config =
            toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }
}
