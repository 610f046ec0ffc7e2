//! Configuration discovery and resolution

use super::types::{Config, ConflictPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const LOCAL_CONFIG_NAME: &str = ".signage.toml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value from the environment could not be interpreted
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override store root
    pub root: Option<PathBuf>,
    /// Override conflict policy
    pub conflict_policy: Option<ConflictPolicy>,
    /// Override automatic migration
    pub auto_migrate: Option<bool>,
}

/// One config file. Only keys present in the file override lower layers.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    storage: StorageLayer,
    #[serde(default)]
    conflicts: ConflictLayer,
    #[serde(default)]
    migrations: MigrationLayer,
}

#[derive(Debug, Default, Deserialize)]
struct StorageLayer {
    root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConflictLayer {
    policy: Option<ConflictPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct MigrationLayer {
    auto_run: Option<bool>,
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Command-line overrides
/// 2. Environment variables
/// 3. Repo-local config (.signage.toml in current dir or up to the git root)
/// 4. Global config (~/.config/signage/config.toml)
/// 5. Defaults
///
/// A relative `storage.root` in a file is resolved against that file's
/// directory. Unreadable config files are logged and skipped; malformed
/// environment values are errors.
pub fn resolve_config(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // 4. Global config
    let global_config_path = home_dir.join(".config/signage/config.toml");
    if global_config_path.exists() {
        match load_config_file(&global_config_path) {
            Ok(layer) => merge_layer(&mut config, layer, &global_config_path),
            Err(e) => warn!(path = %global_config_path.display(), error = %e, "Failed to load global config"),
        }
    }

    // 3. Repo-local config
    if let Some(repo_config) = find_repo_local_config(current_dir) {
        match load_config_file(&repo_config) {
            Ok(layer) => merge_layer(&mut config, layer, &repo_config),
            Err(e) => warn!(path = %repo_config.display(), error = %e, "Failed to load repo config"),
        }
    }

    // 2. Environment
    apply_env_overrides(&mut config)?;

    // 1. Command line
    apply_cli_overrides(&mut config, overrides);

    Ok(config)
}

/// Find repo-local config file
///
/// Searches current directory and parent directories up to git root
fn find_repo_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(LOCAL_CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

fn load_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let layer: ConfigLayer = toml::from_str(&contents)?;
    Ok(layer)
}

fn merge_layer(base: &mut Config, layer: ConfigLayer, source: &Path) {
    debug!(path = %source.display(), "Merging config file");

    if let Some(root) = layer.storage.root {
        base.storage.root = Some(match source.parent() {
            Some(dir) if root.is_relative() => dir.join(root),
            _ => root,
        });
    }
    if let Some(policy) = layer.conflicts.policy {
        base.conflicts.policy = policy;
    }
    if let Some(auto_run) = layer.migrations.auto_run {
        base.migrations.auto_run = auto_run;
    }
}

fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(root) = non_empty_env("SIGNAGE_STORE_ROOT") {
        config.storage.root = Some(PathBuf::from(root));
    }

    if let Some(policy) = non_empty_env("SIGNAGE_CONFLICT_POLICY") {
        config.conflicts.policy = policy.parse().map_err(|message| ConfigError::InvalidValue {
            key: "SIGNAGE_CONFLICT_POLICY".to_string(),
            message,
        })?;
    }

    if let Some(flag) = non_empty_env("SIGNAGE_AUTO_MIGRATE") {
        config.migrations.auto_run = parse_flag(&flag).ok_or_else(|| ConfigError::InvalidValue {
            key: "SIGNAGE_AUTO_MIGRATE".to_string(),
            message: format!("expected a boolean, got '{flag}'"),
        })?;
    }

    Ok(())
}

fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(ref root) = overrides.root {
        config.storage.root = Some(root.clone());
    }

    if let Some(policy) = overrides.conflict_policy {
        config.conflicts.policy = policy;
    }

    if let Some(auto_migrate) = overrides.auto_migrate {
        config.migrations.auto_run = auto_migrate;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
