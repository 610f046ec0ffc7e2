//! Configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storage location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Concurrent-edit handling
    #[serde(default)]
    pub conflicts: ConflictConfig,
    /// Schema migrations
    #[serde(default)]
    pub migrations: MigrationConfig,
}

impl Config {
    /// Store root, falling back to `<home>/.config/signage/store`
    pub fn store_root(&self, home_dir: &Path) -> PathBuf {
        match &self.storage.root {
            Some(root) => root.clone(),
            None => home_dir.join(".config/signage/store"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Conflict configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictConfig {
    #[serde(default)]
    pub policy: ConflictPolicy,
}

/// What an update does when the stored record changed since this session read it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Log a warning and overwrite
    #[default]
    Warn,
    /// Fail with a conflict error
    Reject,
    /// Overwrite silently
    Ignore,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Warn => "warn",
            ConflictPolicy::Reject => "reject",
            ConflictPolicy::Ignore => "ignore",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(ConflictPolicy::Warn),
            "reject" => Ok(ConflictPolicy::Reject),
            "ignore" => Ok(ConflictPolicy::Ignore),
            other => Err(format!("unknown conflict policy '{other}' (expected warn, reject or ignore)")),
        }
    }
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Run pending migrations when a session opens
    #[serde(default = "default_auto_run")]
    pub auto_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            auto_run: default_auto_run(),
        }
    }
}

fn default_auto_run() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.storage.root.is_none());
        assert_eq!(config.conflicts.policy, ConflictPolicy::Warn);
        assert!(config.migrations.auto_run);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.storage.root = Some(PathBuf::from("/var/lib/signage"));
        config.conflicts.policy = ConflictPolicy::Reject;

        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[conflicts]\npolicy = \"ignore\"\n").unwrap();
        assert_eq!(config.conflicts.policy, ConflictPolicy::Ignore);
        assert!(config.migrations.auto_run);
        assert!(config.storage.root.is_none());
    }

    #[test]
    fn test_store_root_default() {
        let config = Config::default();
        assert_eq!(
            config.store_root(Path::new("/home/kiosk")),
            PathBuf::from("/home/kiosk/.config/signage/store")
        );
    }

    #[test]
    fn test_conflict_policy_from_str() {
        assert_eq!("REJECT".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Reject);
        assert_eq!(" warn ".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Warn);
        assert!("sometimes".parse::<ConflictPolicy>().is_err());
    }
}
