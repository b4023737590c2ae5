//! Configuration loading and config file resolution
//!
//! Config file location follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SETLIST_CONFIG` environment variable
//! 3. OS-dependent default (`~/.config/setlist/setlist.toml` on Linux)
//!
//! A missing default file is not an error: every section has built-in
//! defaults. A file that was named explicitly must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SETLIST_CONFIG";

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "setlist.toml";

/// Upper bound the catalog accepts for a recommendation request
pub const MAX_TRACK_COUNT: u32 = 100;

/// Complete TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Language-model service settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Catalog/playlist service settings
    #[serde(default)]
    pub spotify: SpotifyConfig,

    /// Pipeline tuning values
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// OpenAI chat completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (ENV `OPENAI_API_KEY` takes priority)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            temperature: default_temperature(),
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Spotify Web API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Pre-obtained user access token (skips the refresh exchange)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Long-lived refresh token from the authorization code flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default = "default_spotify_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_spotify_accounts_url")]
    pub accounts_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side request quota
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            api_base_url: default_spotify_api_base_url(),
            accounts_url: default_spotify_accounts_url(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Pipeline tuning values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum energy (0.0-1.0) a track needs to survive the mood filter
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f32,

    /// Recommendation count used when the request names none
    #[serde(default = "default_num_songs")]
    pub default_num_songs: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            energy_threshold: default_energy_threshold(),
            default_num_songs: default_num_songs(),
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.energy_threshold) {
            return Err(Error::Config(format!(
                "pipeline.energy_threshold must be within 0.0-1.0, got {}",
                self.energy_threshold
            )));
        }

        if self.default_num_songs == 0 || self.default_num_songs > MAX_TRACK_COUNT {
            return Err(Error::Config(format!(
                "pipeline.default_num_songs must be within 1-{}, got {}",
                MAX_TRACK_COUNT, self.default_num_songs
            )));
        }

        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_spotify_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_energy_threshold() -> f32 {
    0.7
}

fn default_num_songs() -> u32 {
    10
}

/// Where the active config file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` argument
    CommandLine(PathBuf),
    /// `SETLIST_CONFIG` environment variable
    Environment(PathBuf),
    /// OS-dependent default location
    Default(PathBuf),
    /// No config directory could be determined
    None,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p) | ConfigSource::Environment(p) | ConfigSource::Default(p) => {
                Some(p.as_path())
            }
            ConfigSource::None => None,
        }
    }

    /// Whether the file was named explicitly and therefore must exist
    pub fn is_explicit(&self) -> bool {
        matches!(self, ConfigSource::CommandLine(_) | ConfigSource::Environment(_))
    }
}

/// Resolve the config file location (CLI → ENV → OS default)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> ConfigSource {
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    match default_config_path() {
        Some(path) => ConfigSource::Default(path),
        None => ConfigSource::None,
    }
}

/// OS-dependent default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("setlist").join(CONFIG_FILE_NAME))
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration from the resolved source
///
/// Missing default files degrade to built-in defaults with a warning;
/// explicitly named files must exist.
pub fn load_config(source: &ConfigSource) -> Result<TomlConfig> {
    let Some(path) = source.path() else {
        warn!("No config directory available, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        if source.is_explicit() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("No config file at {}, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(path)?;
    config.pipeline.validate()?;

    #[cfg(unix)]
    {
        if check_toml_permissions_loose(path).unwrap_or(false) {
            warn!(
                "Config file {} is readable by other users and may contain secrets; consider chmod 600",
                path.display()
            );
        }
    }

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Write config to TOML file atomically
///
/// Serializes to a sibling temp file, restricts its permissions to 0600
/// on Unix, then renames it over the target.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }

    debug!("Config written to {}", path.display());
    Ok(())
}

/// Check whether group/other can read the config file
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}
