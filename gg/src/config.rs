//! Gourmet Grill configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use templatecache::{MODE_ENV_VAR, Mode};
use tracing::{debug, info, warn};

/// Environment variable overriding `server.port`
pub const PORT_ENV_VAR: &str = "PORT";

/// Project-local config file name
pub const LOCAL_CONFIG: &str = "gourmetgrill.yml";

/// Main site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Site-wide values injected into every page
    pub site: SiteConfig,

    /// Template, static and snapshot directories
    pub paths: PathsConfig,

    /// Template cache mode; `APP_ENV` wins when set
    pub mode: Mode,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_file(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./gourmetgrill.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/gourmetgrill/gourmetgrill.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("gourmetgrill").join(LOCAL_CONFIG);
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `PORT` and `APP_ENV` overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(PORT_ENV_VAR) {
            match raw.trim().parse::<u16>() {
                Ok(port) => {
                    debug!(%port, "Config::apply_env: port override");
                    self.server.port = port;
                }
                Err(e) => warn!("Invalid {} value '{}': {}", PORT_ENV_VAR, raw, e),
            }
        }

        if let Some(raw) = lookup(MODE_ENV_VAR) {
            self.mode = Mode::from_env_value(Some(&raw));
            debug!(mode = %self.mode, "Config::apply_env: mode override");
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Values shared by every page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Injected into every page as `site_name`
    pub name: String,

    /// Dictionary used for the `t` helper (en, ur)
    pub locale: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Gourmet Grill".to_string(),
            locale: "en".to_string(),
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Page templates; partials live in `partials/` below it
    pub templates: PathBuf,

    /// Served under `/static`
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Published snapshots, served under `/snapshots`
    pub snapshots: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            snapshots: PathBuf::from("public/snapshots"),
        }
    }
}
