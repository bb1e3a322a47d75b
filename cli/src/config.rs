use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub executor: ExecutorSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    #[serde(default = "default_registry_timeout")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            timeout_secs: default_registry_timeout(),
        }
    }
}

fn default_registry_url() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_registry_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Concurrent registry lookups during dependency resolution.
    #[serde(default = "default_deps_concurrency")]
    pub deps_concurrency: usize,

    /// Concurrent file writes during project generation.
    #[serde(default = "default_files_concurrency")]
    pub files_concurrency: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-task timeout applied to registry and filesystem work.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            deps_concurrency: default_deps_concurrency(),
            files_concurrency: default_files_concurrency(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            task_timeout_secs: default_task_timeout(),
        }
    }
}

fn default_deps_concurrency() -> usize {
    8
}

fn default_files_concurrency() -> usize {
    4
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_task_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs additionally go to daily-rotated files in this
    /// directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The per-user armature data directory: `~/.armature`.
pub fn data_dir() -> Result<PathBuf, CliError> {
    dirs::home_dir()
        .map(|home| home.join(".armature"))
        .ok_or_else(|| CliError::Config("cannot determine home directory".to_string()))
}

/// Where user-provided templates live: `~/.armature/templates`.
pub fn templates_dir() -> Result<PathBuf, CliError> {
    Ok(data_dir()?.join("templates"))
}

/// Load configuration with the usual priority: `~/.armature/config.toml`
/// first, then `./config.toml`, then built-in defaults.
pub fn load_default() -> Result<AppConfig, CliError> {
    let user_config = data_dir()?.join("config.toml");
    let local_config = Path::new("config.toml");

    let cfg = if user_config.exists() {
        parse_file(&user_config)?
    } else if local_config.exists() {
        parse_file(local_config)?
    } else {
        AppConfig::default()
    };

    Ok(cfg)
}

fn parse_file(path: &Path) -> Result<AppConfig, CliError> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}
