//! Beacon configuration loader.

use beacon_core::{DEFAULT_DEBOUNCE, DEFAULT_STALE_AFTER_SECS, StatusPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeaconConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub connect: ConnectConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Override for the REST base URL, e.g. a local mock.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Messages older than this are recreated instead of edited.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_stale_after_secs() -> u64 {
    DEFAULT_STALE_AFTER_SECS as u64
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Start requests beyond this many live sessions get a lockout warning.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

fn default_max_active() -> usize {
    25
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectConfig {
    #[serde(default)]
    pub host_url: String,
}

impl BeaconConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(default_config_path);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;

        let mut cfg: BeaconConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?;

        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = v;
        }
        if let Some(v) = get("BEACON_DEBOUNCE_MS") {
            self.status.debounce_ms = parse_override("BEACON_DEBOUNCE_MS", &v)?;
        }
        if let Some(v) = get("BEACON_STALE_AFTER_SECS") {
            self.status.stale_after_secs = parse_override("BEACON_STALE_AFTER_SECS", &v)?;
        }
        if let Some(v) = get("BEACON_MAX_ACTIVE_SESSIONS") {
            self.sessions.max_active = parse_override("BEACON_MAX_ACTIVE_SESSIONS", &v)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.status.debounce_ms == 0 {
            return Err(anyhow::anyhow!("status.debounce_ms must be > 0"));
        }
        if self.status.stale_after_secs == 0 {
            return Err(anyhow::anyhow!("status.stale_after_secs must be > 0"));
        }
        if self.sessions.max_active == 0 {
            return Err(anyhow::anyhow!("sessions.max_active must be > 0"));
        }
        self.status_policy()?;
        Ok(())
    }

    pub fn status_policy(&self) -> anyhow::Result<StatusPolicy> {
        StatusPolicy::from_config_values(self.status.debounce_ms, self.status.stale_after_secs)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "status.stale_after_secs out of range: {}",
                    self.status.stale_after_secs
                )
            })
    }

    pub fn require_bot_token(&self) -> anyhow::Result<&str> {
        let token = self.discord.bot_token.trim();
        if token.is_empty() {
            return Err(anyhow::anyhow!(
                "discord.bot_token is required (or set DISCORD_BOT_TOKEN)"
            ));
        }
        Ok(token)
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {key}={value:?}: {e}"))
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".beacon").join("config.toml")
}
