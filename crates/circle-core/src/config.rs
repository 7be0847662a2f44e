//! Configuration management for circle.
//!
//! Loads configuration from ${CIRCLE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, value};

use crate::feed::SortMode;

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "CIRCLE_API_URL";

/// Commented starter config shipped in the binary.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for circle configuration and data directories.
    //!
    //! CIRCLE_HOME resolution order:
    //! 1. CIRCLE_HOME environment variable (if set)
    //! 2. ~/.config/circle (default)

    use std::path::PathBuf;

    /// Returns the circle home directory.
    ///
    /// Checks CIRCLE_HOME env var first, falls back to ~/.config/circle
    pub fn circle_home() -> PathBuf {
        if let Ok(home) = std::env::var("CIRCLE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("circle"))
            .expect("Could not determine home directory")
    }

    /// `$CIRCLE_HOME/config.toml`.
    pub fn config_path() -> PathBuf {
        circle_home().join("config.toml")
    }

    /// Returns the path to the persisted session token.
    pub fn session_path() -> PathBuf {
        circle_home().join("session.json")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        circle_home().join("logs")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: Option<String>,
    /// Write to a daily log file under `logs/` instead of stderr
    pub file: bool,
}

/// User settings read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the social API
    pub api_base_url: String,

    /// Request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Feed ordering used when none is requested
    pub default_sort: SortMode,

    /// Number of posts listed by the recent command
    pub recent_posts_limit: usize,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    const DEFAULT_API_BASE_URL: &str = "http://localhost:8888/api";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;
    const DEFAULT_RECENT_POSTS_LIMIT: usize = 5;

    /// Reads `$CIRCLE_HOME/config.toml`.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Reads the config at `path`, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        let Some(raw) = read_if_present(path)? else {
            return Ok(Self::default());
        };
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Resolves the API base URL with precedence: env > config > default.
    pub fn effective_base_url(&self) -> Result<String> {
        resolve_base_url(
            std::env::var(API_URL_ENV).ok().as_deref(),
            Some(&self.api_base_url),
        )
    }

    /// Returns the request timeout, or None if disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0)
            .then(|| Duration::from_secs(u64::from(self.request_timeout_secs)))
    }

    /// Persists `default_sort` to `$CIRCLE_HOME/config.toml`.
    pub fn save_default_sort(mode: SortMode) -> Result<()> {
        Self::save_default_sort_to(&paths::config_path(), mode)
    }

    /// Rewrites only the `default_sort` key at `path`.
    ///
    /// A missing file starts from the commented template; other keys and
    /// comments in an existing file are left as they are.
    pub fn save_default_sort_to(path: &Path, mode: SortMode) -> Result<()> {
        let raw = read_if_present(path)?.unwrap_or_else(|| default_config_template().to_string());
        let mut doc: DocumentMut = raw
            .parse()
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        doc["default_sort"] = value(mode.to_string());
        replace_file(path, &doc.to_string())
    }

    /// Writes the commented template to `path`; fails if a config is already there.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        replace_file(path, default_config_template())
    }

    /// Renders the template with every key set from `Config::default()`.
    pub fn generate() -> Result<String> {
        let defaults = Self::default();
        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        doc["api_base_url"] = value(defaults.api_base_url);
        doc["request_timeout_secs"] = value(i64::from(defaults.request_timeout_secs));
        doc["default_sort"] = value(defaults.default_sort.to_string());
        doc["recent_posts_limit"] = value(defaults.recent_posts_limit as i64);
        doc["log"]["file"] = value(defaults.log.file);
        if let Some(level) = defaults.log.level {
            doc["log"]["level"] = value(level);
        }

        Ok(doc.to_string())
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read config at {}", path.display()))
        }
    }
}

/// Swaps `content` in at `path` via a sibling `.tmp` file and a rename.
fn replace_file(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let staging = path.with_extension("toml.tmp");
    fs::write(&staging, content).with_context(|| format!("write {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("move {} into place at {}", staging.display(), path.display()))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            default_sort: SortMode::default(),
            recent_posts_limit: Self::DEFAULT_RECENT_POSTS_LIMIT,
            log: LogConfig::default(),
        }
    }
}

/// Resolves a base URL with precedence: env value > config value > default.
fn resolve_base_url(env_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
    for candidate in [env_url, config_url].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(Config::DEFAULT_API_BASE_URL.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(())
}
