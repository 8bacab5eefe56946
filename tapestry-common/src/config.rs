//! Configuration loading and database path resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the shared database file
pub const DATABASE_ENV_VAR: &str = "TAPESTRY_DB";

/// Optional TOML configuration file
///
/// Searched at `$XDG_CONFIG_HOME/tapestry/config.toml` then
/// `/etc/tapestry/config.toml` unless an explicit path is given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the shared SQLite database
    pub database: Option<String>,
    /// Engine parameter overrides
    #[serde(default)]
    pub engine: EngineSection,
}

/// `[engine]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    pub min_diversity: Option<usize>,
    pub max_categories: Option<usize>,
    pub overuse_threshold: Option<u64>,
    pub commit_mode: Option<String>,
    pub parallelism: Option<usize>,
}

impl TomlConfig {
    /// Load configuration from an explicit file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration from the default search locations
    ///
    /// Returns `Ok(None)` when no config file exists; a file that exists
    /// but fails to parse is an error, not silence.
    pub fn load_default() -> Result<Option<Self>> {
        for path in default_config_paths() {
            if path.exists() {
                return Self::load_from(&path).map(Some);
            }
        }
        Ok(None)
    }
}

/// Default config file locations, in priority order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("tapestry").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/tapestry/config.toml"));
    }
    paths
}

/// Resolve the shared database path following the standard priority order:
/// 1. Command-line argument (highest priority)
/// 2. `TAPESTRY_DB` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
///
/// Logs a warning when more than one source supplies a value, since a
/// forgotten environment variable silently shadowing a config file is a
/// common misconfiguration.
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: Option<&TomlConfig>) -> PathBuf {
    let env_value = std::env::var(DATABASE_ENV_VAR).ok();
    let toml_value = toml_config.and_then(|c| c.database.clone());

    let sources = [
        cli_arg.map(|_| "command line"),
        env_value.as_deref().map(|_| "environment"),
        toml_value.as_deref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if sources.len() > 1 {
        tracing::warn!(
            "Database path found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = env_value {
        return PathBuf::from(path);
    }
    if let Some(path) = toml_value {
        return PathBuf::from(path);
    }
    default_database_path()
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tapestry").join("tapestry.db"))
        .unwrap_or_else(|| PathBuf::from("tapestry.db"))
}
