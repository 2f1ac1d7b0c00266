use crate::error::{DocketError, Result};
use crate::process;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Lightweight version-control metadata shown in the sprint report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VcsSnapshot {
    pub branch: String,
    pub commit_count: u64,
    pub has_uncommitted: bool,
}

pub trait VersionControl {
    fn snapshot(&self, root: &Path) -> Result<VcsSnapshot>;
}

/// Reads metadata through the `git` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct Git {
    timeout: Option<Duration>,
}

impl Git {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn git(&self, root: &Path, args: &[&str]) -> Result<String> {
        let out = process::run("git", args, root, self.timeout)?;
        if !out.success {
            return Err(DocketError::ExternalTool {
                tool: format!("git {}", args.join(" ")),
                message: out.stderr.trim().to_string(),
            });
        }
        Ok(out.stdout.trim().to_string())
    }
}

impl VersionControl for Git {
    fn snapshot(&self, root: &Path) -> Result<VcsSnapshot> {
        if which::which("git").is_err() {
            return Err(DocketError::ExternalTool {
                tool: "git".to_string(),
                message: "git not found on PATH".to_string(),
            });
        }
        // symbolic-ref works on unborn branches; detached HEADs fall back to the hash.
        let branch = self
            .git(root, &["symbolic-ref", "--short", "HEAD"])
            .or_else(|_| self.git(root, &["rev-parse", "--short", "HEAD"]))?;
        let commit_count = self
            .git(root, &["rev-list", "--count", "HEAD"])
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let has_uncommitted = !self.git(root, &["status", "--porcelain"])?.is_empty();
        Ok(VcsSnapshot {
            branch,
            commit_count,
            has_uncommitted,
        })
    }
}
