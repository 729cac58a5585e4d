//! Bootstrap configuration loading
//!
//! Configuration sources, highest priority first:
//! 1. Explicit path (command-line `--config`)
//! 2. `RECIPE_MERGE_CONFIG` environment variable
//! 3. Platform config file (`<config_dir>/recipe-merge/config.toml`)
//! 4. Compiled defaults
//!
//! A missing or malformed config file never aborts a run: the resolver falls
//! back to the compiled defaults and records why, to be logged as a warning
//! once tracing is up.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RECIPE_MERGE_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the source recipe corpus
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Directory merged records are written into
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Path of the run statistics artifact (JSON)
    #[serde(default)]
    pub stats_file: Option<PathBuf>,

    /// Minimum bucket size kept by the matcher
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Fingerprint records across worker threads
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Number of largest duplicate groups listed in the run statistics
    #[serde(default = "default_top_groups")]
    pub top_groups: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
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

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            stats_file: None,
            min_group_size: default_min_group_size(),
            parallel: default_parallel(),
            top_groups: default_top_groups(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_min_group_size() -> usize {
    1
}

fn default_parallel() -> bool {
    true
}

fn default_top_groups() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed for {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.min_group_size == 0 {
            return Err(Error::Config(
                "min_group_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// No config file found
    Defaults,
    /// A config file was found but could not be used
    Fallback { path: PathBuf, reason: String },
}

/// Resolved configuration plus its provenance
///
/// Resolution runs before tracing is installed, so the outcome is reported
/// separately through [`ResolvedConfig::log_source`].
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl ResolvedConfig {
    /// Log where the configuration came from
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => info!(path = %path.display(), "Loaded configuration"),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::Fallback { path, reason } => warn!(
                path = %path.display(),
                error = %reason,
                "Config file unusable, using compiled defaults"
            ),
        }
    }
}

/// Resolves which config file (if any) to load
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Locate the highest-priority config file candidate
    pub fn locate(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config file
        dirs::config_dir()
            .map(|d| d.join("recipe-merge").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Resolve configuration, falling back to defaults on any failure
    pub fn resolve(&self) -> ResolvedConfig {
        let Some(path) = self.locate() else {
            return ResolvedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Defaults,
            };
        };

        match TomlConfig::load(&path) {
            Ok(config) => ResolvedConfig {
                config,
                source: ConfigSource::File(path),
            },
            Err(e) => ResolvedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Fallback {
                    path,
                    reason: e.to_string(),
                },
            },
        }
    }
}
