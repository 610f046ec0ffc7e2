//! Home directory resolution
//!
//! Every default path (global config, default store root) hangs off the home
//! directory returned here.
//!
//! # Precedence
//!
//! 1. `SIGNAGE_HOME` environment variable (if set and non-empty)
//! 2. `dirs::home_dir()` platform default
//!
//! Integration tests set `SIGNAGE_HOME` to a temp dir so they never touch the
//! real user config:
//!
//! ```ignore
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("signage");
//! cmd.env("SIGNAGE_HOME", temp_dir.path());
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the home directory
pub const HOME_ENV: &str = "SIGNAGE_HOME";

/// Get the home directory for signage configuration and data
///
/// Surrounding whitespace in `SIGNAGE_HOME` is trimmed; an empty or
/// whitespace-only value falls back to the platform default.
///
/// # Errors
///
/// Fails only when `SIGNAGE_HOME` is unset and the platform home directory
/// cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().context("Could not determine home directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Run `f` with `SIGNAGE_HOME` set to `value`, restoring the previous value after
    fn with_home_env(value: Option<&str>, f: impl FnOnce()) {
        let original = env::var(HOME_ENV).ok();
        unsafe {
            match value {
                Some(v) => env::set_var(HOME_ENV, v),
                None => env::remove_var(HOME_ENV),
            }
        }

        f();

        unsafe {
            match original {
                Some(v) => env::set_var(HOME_ENV, v),
                None => env::remove_var(HOME_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_signage_home_set() {
        with_home_env(Some("/custom/home"), || {
            assert_eq!(get_home_dir().unwrap(), PathBuf::from("/custom/home"));
        });
    }

    #[test]
    #[serial]
    fn test_signage_home_not_set_uses_platform_default() {
        with_home_env(None, || {
            assert_eq!(get_home_dir().unwrap(), dirs::home_dir().unwrap());
        });
    }

    #[test]
    #[serial]
    fn test_blank_signage_home_uses_platform_default() {
        for blank in ["", "   "] {
            with_home_env(Some(blank), || {
                assert_eq!(get_home_dir().unwrap(), dirs::home_dir().unwrap());
            });
        }
    }

    #[test]
    #[serial]
    fn test_signage_home_is_trimmed() {
        with_home_env(Some("  /path with spaces/home  "), || {
            assert_eq!(get_home_dir().unwrap(), PathBuf::from("/path with spaces/home"));
        });
    }
}
