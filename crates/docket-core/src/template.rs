use crate::error::{DocketError, Result};
use crate::id::{EntityId, ID_WIDTH};
use crate::paths;
use crate::store::Store;
use crate::types::EntityKind;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Placeholder values keyed by token name (`TITLE` for `{{TITLE}}`).
pub type Vars = BTreeMap<&'static str, String>;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").unwrap())
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub body: String,
}

impl Template {
    /// Load `<templates_dir>/<name>.md`.
    pub fn load<S: Store + ?Sized>(store: &S, templates_dir: &Path, name: &str) -> Result<Self> {
        let path = paths::template_path(templates_dir, name);
        if !store.exists(&path) {
            return Err(DocketError::TemplateMissing(path.display().to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            body: store.read(&path)?,
        })
    }

    /// Substitute `{{KEY}}` tokens in one pass. Unknown tokens are left in
    /// place and substituted values are never rescanned.
    pub fn render(&self, vars: &Vars) -> String {
        token_re()
            .replace_all(&self.body, |caps: &Captures<'_>| {
                vars.get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Lower-case, whitespace to hyphens, drop anything outside `[a-z0-9-]`,
/// collapse repeated hyphens and trim them from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

/// `{filePrefix}-{paddedId}-{slug}.md`, e.g. `prd-001-user-dashboard.md`.
pub fn file_name(id: EntityId, title: &str) -> String {
    format!(
        "{}-{:0width$}-{}.md",
        id.kind.file_prefix(),
        id.number,
        slugify(title),
        width = ID_WIDTH
    )
}

// ---------------------------------------------------------------------------
// Default templates
// ---------------------------------------------------------------------------

pub const TICKET_TEMPLATE: &str = "# {{ID}}: {{TITLE}}

## Created
{{DATE}}

## Status
{{STATUS_BLOCK}}

## Priority
{{PRIORITY_EMOJI}} {{PRIORITY}}

## Description
{{DESCRIPTION}}

## Acceptance Criteria
{{ACCEPTANCE_CRITERIA}}
";

pub const STORY_TEMPLATE: &str = "# {{ID}}: {{TITLE}}

## Created
{{DATE}}

## Status
{{STATUS_BLOCK}}

## Priority
{{PRIORITY_EMOJI}} {{PRIORITY}}

## Story Points
{{STORY_POINTS}}

## PRD
{{PRD_ID}}

## Description
{{DESCRIPTION}}

## Acceptance Criteria
{{ACCEPTANCE_CRITERIA}}
";

pub const PRD_TEMPLATE: &str = "# {{ID}}: {{TITLE}}

## Created
{{DATE}}

## Status
{{STATUS_BLOCK}}

## Priority
{{PRIORITY_EMOJI}} {{PRIORITY}}

## Overview
{{DESCRIPTION}}

## Goals
-

## User Stories
Describe each story as a `### STORY-XXX: <title>` block with story points,
priority and an acceptance-criteria checklist, then run `docket generate-stories {{ID}}`.

## Out of Scope
-
";

pub const ISSUE_TEMPLATE: &str = "# {{ID}}: {{TITLE}}

## Created
{{DATE}}

## Status
{{STATUS_BLOCK}}

## Severity
{{SEVERITY_EMOJI}} {{SEVERITY}}

## Description
{{DESCRIPTION}}

## Steps to Reproduce
1.
";

pub fn default_template(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Ticket => TICKET_TEMPLATE,
        EntityKind::Story => STORY_TEMPLATE,
        EntityKind::Prd => PRD_TEMPLATE,
        EntityKind::Issue => ISSUE_TEMPLATE,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
