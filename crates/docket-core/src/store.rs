//! Document storage.
//!
//! Every path handed to a [`Store`] is relative to the project root, e.g.
//! `tickets/TICKET-001-fix-login.md`. The filesystem is the only source of
//! truth: nothing is cached between calls, so every listing re-scans.

use crate::error::Result;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub trait Store {
    /// Markdown files directly inside `dir` (not recursive), sorted by path.
    /// A missing directory lists as empty.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> Result<String>;

    /// Write `content` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, content: &str) -> Result<()>;

    fn remove(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir(&self, dir: &Path) -> Result<()>;
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

/// Store backed by a project directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Store for FsStore {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let abs = self.root.join(dir);
        if !abs.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&abs)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let rel = dir.join(entry.file_name());
            if is_markdown(&rel) {
                out.push(rel);
            }
        }
        out.sort();
        Ok(out)
    }

    fn read(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(path))?)
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        crate::io::atomic_write(&self.root.join(path), content.as_bytes())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(self.root.join(path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        crate::io::ensure_dir(&self.root.join(dir))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store used by tests. Directories are implicit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), content.into());
        self
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl Store for MemoryStore {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir) && is_markdown(p))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
            .into()
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match self.files.borrow_mut().remove(path) {
            Some(_) => Ok(()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
            .into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn create_dir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
