use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds; attempt n waits `base * 2^n`.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

/// How the caller-supplied credential is presented to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialHeader {
    /// `Authorization: Bearer <credential>`
    #[default]
    Bearer,
    /// `Cookie: <credential>` (session cookie copied from a browser).
    Cookie,
}

impl CredentialHeader {
    /// Render the request header line for `credential`.
    pub fn header_line(self, credential: &str) -> String {
        match self {
            CredentialHeader::Bearer => format!("Authorization: Bearer {}", credential.trim()),
            CredentialHeader::Cookie => format!("Cookie: {}", credential.trim()),
        }
    }
}

/// Global configuration loaded from `~/.config/shelf/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory for per-identity archives. Defaults to `~/.local/share/shelf`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Catalog endpoint; must answer `{ "items": [...] }`.
    pub catalog_url: String,
    /// Header used to send the credential.
    #[serde(default)]
    pub credential_header: CredentialHeader,
    /// Extension given to downloaded assets (without the dot).
    pub asset_extension: String,
    /// Number of parallel download workers per run.
    pub concurrency: usize,
    /// Pause before every asset fetch, per worker, in milliseconds.
    pub rate_limit_ms: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            catalog_url: "https://suno.com/api/library?limit=9999".to_string(),
            credential_header: CredentialHeader::default(),
            asset_extension: "mp3".to_string(),
            concurrency: 3,
            rate_limit_ms: 1000,
            retry: None,
        }
    }
}

impl ArchiveConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_else(|| RetryPolicy::from(&RetryConfig::default()))
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(Duration::from_millis(self.rate_limit_ms))
    }

    /// Directory holding every identity's archive: `data_dir` or the XDG data home.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("shelf")?;
        Ok(xdg_dirs.get_data_home())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shelf")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ArchiveConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ArchiveConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (no defaults file is written).
pub fn load_from_path(path: &Path) -> Result<ArchiveConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ArchiveConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
