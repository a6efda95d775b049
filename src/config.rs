//! Resolver configuration loaded from `~/.config/embedscout/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunables for fetching and fan-out.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on every outbound fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// TCP + TLS connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// How many times a strategy may hand a URL back to the dispatcher.
    pub max_depth: usize,
    /// Number of embeds resolved concurrently.
    pub max_concurrency: usize,
    /// Fixed User-Agent. A random browser profile is used when unset.
    pub user_agent: Option<String>,
    /// Strategy names left out of the registry.
    pub disabled: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            connect_timeout_secs: 10,
            max_depth: 2,
            max_concurrency: 16,
            user_agent: None,
            disabled: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    /// Fan-out width, never zero.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }

    /// Load from the default location.
    ///
    /// Returns defaults if the file doesn't exist (the config is optional).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("embedscout")
        .join("config.toml")
}
