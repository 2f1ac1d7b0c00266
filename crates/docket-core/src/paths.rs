use crate::types::{Bucket, EntityKind};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TICKETS_DIR: &str = "tickets";
pub const TICKETS_ARCHIVE_DIR: &str = "tickets/archive";
pub const STORIES_DIR: &str = "stories";
pub const STORIES_ARCHIVE_DIR: &str = "stories/archive";
pub const PRD_ACTIVE_DIR: &str = "docs/prd/active";
pub const PRD_ARCHIVE_DIR: &str = "docs/prd/archive";
pub const ISSUES_DIR: &str = "issues";
pub const ISSUES_ARCHIVE_DIR: &str = "issues/archive";

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const CONFIG_FILE: &str = "docket.yaml";
/// Numbers of permanently deleted or renumbered documents, per kind.
pub const RETIRED_IDS_FILE: &str = ".docket/retired-ids.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Storage directory of `kind` in `bucket`, relative to the project root.
pub fn entity_dir(kind: EntityKind, bucket: Bucket) -> &'static Path {
    let dir = match (kind, bucket) {
        (EntityKind::Ticket, Bucket::Active) => TICKETS_DIR,
        (EntityKind::Ticket, Bucket::Archive) => TICKETS_ARCHIVE_DIR,
        (EntityKind::Story, Bucket::Active) => STORIES_DIR,
        (EntityKind::Story, Bucket::Archive) => STORIES_ARCHIVE_DIR,
        (EntityKind::Prd, Bucket::Active) => PRD_ACTIVE_DIR,
        (EntityKind::Prd, Bucket::Archive) => PRD_ARCHIVE_DIR,
        (EntityKind::Issue, Bucket::Active) => ISSUES_DIR,
        (EntityKind::Issue, Bucket::Archive) => ISSUES_ARCHIVE_DIR,
    };
    Path::new(dir)
}

pub fn entity_path(kind: EntityKind, bucket: Bucket, file_name: &str) -> PathBuf {
    entity_dir(kind, bucket).join(file_name)
}

pub fn template_path(templates_dir: &Path, name: &str) -> PathBuf {
    templates_dir.join(format!("{name}.md"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
