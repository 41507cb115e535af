//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::{write_atomic, CONFIG_FILE};
use crate::task::DEFAULT_DUE_SOON_DAYS;

/// Largest accepted due-soon window, in days.
pub const MAX_DUE_SOON_DAYS: i64 = 365;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Window used by `due-soon` when `--days` is not given
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,

    /// Whether `list` shows completed tasks by default
    #[serde(default = "default_show_completed")]
    pub show_completed: bool,

    /// Project opened when none is selected explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            show_completed: default_show_completed(),
            default_project: None,
        }
    }
}

fn default_due_soon_days() -> i64 {
    DEFAULT_DUE_SOON_DAYS
}

fn default_show_completed() -> bool {
    true
}

impl Config {
    /// Load configuration from a `config.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        Self::load(&config_path).unwrap_or_else(|err| {
            tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
            Self::default()
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_DUE_SOON_DAYS).contains(&self.due_soon_days) {
            return Err(Error::InvalidConfig(format!(
                "due_soon_days must be between 0 and {MAX_DUE_SOON_DAYS}, got {}",
                self.due_soon_days
            )));
        }
        if let Some(project) = &self.default_project {
            if project.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "default_project cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.due_soon_days, 3);
        assert!(cfg.show_completed);
        assert!(cfg.default_project.is_none());
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
due_soon_days = 7
show_completed = false
default_project = "work"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.due_soon_days, 7);
        assert!(!cfg.show_completed);
        assert_eq!(cfg.default_project.as_deref(), Some("work"));
    }

    #[test]
    fn out_of_range_window_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "due_soon_days = 400").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(message) => assert!(message.contains("due_soon_days")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing_or_broken() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Config::load_from_dir(dir.path()), Config::default());

        fs::write(dir.path().join(CONFIG_FILE), "due_soon_days = \"soon\"").expect("write");
        assert_eq!(Config::load_from_dir(dir.path()), Config::default());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let cfg = Config {
            due_soon_days: 10,
            show_completed: false,
            default_project: None,
        };
        cfg.save(&path).expect("save");
        assert_eq!(Config::load(&path).expect("load"), cfg);
    }
}
