use crate::aggregate::{REVIEW_BACKLOG_LIMIT, WIP_LIMIT};
use crate::error::Result;
use crate::paths;
use crate::transition::GuardMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TransitionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Guard applied by update commands. Pick commands are always guarded.
    #[serde(default)]
    pub update_guard: GuardMode,
}

// ---------------------------------------------------------------------------
// SprintConfig
// ---------------------------------------------------------------------------

/// A shell command run by `sprint-report` (test runner, linter, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintConfig {
    #[serde(default = "default_wip_limit")]
    pub wip_limit: usize,
    #[serde(default = "default_review_backlog_limit")]
    pub review_backlog_limit: usize,
    /// `0` waits indefinitely.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

fn default_wip_limit() -> usize {
    WIP_LIMIT
}

fn default_review_backlog_limit() -> usize {
    REVIEW_BACKLOG_LIMIT
}

fn default_command_timeout() -> u64 {
    30
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            wip_limit: default_wip_limit(),
            review_backlog_limit: default_review_backlog_limit(),
            command_timeout_seconds: default_command_timeout(),
            checks: Vec::new(),
        }
    }
}

impl SprintConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        match self.command_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default)]
    pub transitions: TransitionConfig,
    #[serde(default)]
    pub sprint: SprintConfig,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_TEMPLATES_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            transitions: TransitionConfig::default(),
            sprint: SprintConfig::default(),
        }
    }
}

impl Config {
    /// Load `docket.yaml` from `root`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.templates_dir.is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "templates_dir '{}' is absolute; it is resolved inside the project root",
                    self.templates_dir.display()
                ),
            });
        }

        if self.sprint.wip_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "sprint.wip_limit is 0: every in-progress item is flagged".to_string(),
            });
        }

        for check in &self.sprint.checks {
            if check.command.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("sprint check '{}' has an empty command", check.name),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.templates_dir, PathBuf::from("templates"));
        assert_eq!(cfg.transitions.update_guard, GuardMode::Permissive);
        assert_eq!(cfg.sprint.wip_limit, WIP_LIMIT);
        assert_eq!(cfg.sprint.command_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("docket.yaml"),
            "transitions:\n  update_guard: guarded\nsprint:\n  command_timeout_seconds: 0\n  checks:\n    - name: tests\n      command: cargo test\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.transitions.update_guard, GuardMode::Guarded);
        assert_eq!(cfg.sprint.command_timeout(), None);
        assert_eq!(cfg.sprint.review_backlog_limit, REVIEW_BACKLOG_LIMIT);
        assert_eq!(cfg.sprint.checks.len(), 1);
        assert_eq!(cfg.templates_dir, PathBuf::from("templates"));
    }

    #[test]
    fn validate_flags_empty_check_command() {
        let mut cfg = Config::default();
        cfg.sprint.checks.push(CheckDefinition {
            name: "lint".to_string(),
            command: "  ".to_string(),
        });
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }
}
