use crate::document::{self, Criterion, Document};
use crate::id::{self, EntityId};
use crate::types::{EntityKind, Priority, Status};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// The machine-readable view of one entity document.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub title: String,
    pub status: Status,
    #[serde(skip)]
    pub status_ambiguous: bool,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Priority>,
    pub created: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prd: Option<EntityId>,
    pub acceptance_criteria: Vec<Criterion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stories: Vec<PrdStory>,
}

impl Entity {
    /// Extract an entity from document text.
    ///
    /// The id comes from the level-1 heading, or from the number in the file
    /// name when the heading is missing; `None` only when neither yields one.
    /// Every other field falls back to a default rather than failing.
    pub fn parse(kind: EntityKind, text: &str, path: &Path) -> Option<Self> {
        let doc = Document::parse(text);
        let heading = doc.heading.and_then(|h| document::parse_heading(kind, h));

        let (number, title) = match heading {
            Some(h) => (h.number, h.title),
            None => {
                let number = id::number_from_file_name(kind, path)?;
                tracing::debug!(path = %path.display(), "no identity heading, using file name");
                (number, title_from_file_name(path))
            }
        };
        let id = EntityId::new(kind, number);

        let parsed = document::parse_status(kind, &doc);
        if parsed.ambiguous {
            tracing::warn!(
                %id,
                status = %parsed.status,
                "several status lines are checked; using the first in scan order"
            );
        }

        let severity = match kind {
            EntityKind::Issue => Some(document::parse_level(&doc, "Severity").unwrap_or_default()),
            _ => None,
        };
        let description = doc
            .section_text("Description")
            .or_else(|| doc.section_text("Overview"));

        Some(Self {
            id,
            kind,
            title,
            status: parsed.status,
            status_ambiguous: parsed.ambiguous,
            priority: document::parse_level(&doc, "Priority").unwrap_or_default(),
            severity,
            created: document::parse_created(&doc),
            description,
            story_points: document::parse_story_points(&doc),
            prd: document::parse_prd_ref(&doc),
            acceptance_criteria: document::parse_criteria(&doc),
            stories: match kind {
                EntityKind::Prd => PrdStory::parse_all(text),
                _ => Vec::new(),
            },
        })
    }

    /// Priority for tickets, stories and PRDs; severity for issues.
    pub fn level(&self) -> Priority {
        self.severity.unwrap_or(self.priority)
    }

    pub fn story_points_label(&self) -> String {
        points_label(self.story_points)
    }
}

pub fn points_label(points: Option<u32>) -> String {
    points
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// `TICKET-004-fix-login-bug.md` → `fix login bug`.
fn title_from_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut parts = stem.splitn(3, '-');
    let _prefix = parts.next();
    let _number = parts.next();
    parts.next().unwrap_or(stem).replace('-', " ")
}

// ---------------------------------------------------------------------------
// PrdStory
// ---------------------------------------------------------------------------

static STORY_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static POINTS_RE: OnceLock<Regex> = OnceLock::new();
static PRIORITY_LABEL_RE: OnceLock<Regex> = OnceLock::new();

fn story_block_re() -> &'static Regex {
    STORY_BLOCK_RE
        .get_or_init(|| Regex::new(r"^###\s+(STORY-[0-9A-Za-z]+)\s*:\s*(.+?)\s*$").unwrap())
}

fn points_re() -> &'static Regex {
    POINTS_RE.get_or_init(|| Regex::new(r"(?i)\bpoints\b\W*(\d+)").unwrap())
}

fn priority_label_re() -> &'static Regex {
    PRIORITY_LABEL_RE
        .get_or_init(|| Regex::new(r"(?i)^[-*\s]*priority\s*\**\s*:\s*\**").unwrap())
}

/// A story described inside a PRD as a `### STORY-XXX: <title>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrdStory {
    /// Id as written in the PRD (`STORY-XXX` placeholders are common).
    pub declared_id: String,
    pub title: String,
    pub story_points: Option<u32>,
    pub priority: Priority,
    pub description: Option<String>,
    pub acceptance_criteria: Vec<Criterion>,
}

impl PrdStory {
    /// Every story block in the document, in order of appearance.
    pub fn parse_all(text: &str) -> Vec<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let mut stories = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let Some(caps) = story_block_re().captures(lines[i]) else {
                i += 1;
                continue;
            };
            let end = lines[i + 1..]
                .iter()
                .position(|l| l.starts_with('#'))
                .map(|offset| i + 1 + offset)
                .unwrap_or(lines.len());
            stories.push(Self::from_block(&caps[1], &caps[2], &lines[i + 1..end]));
            i = end;
        }
        stories
    }

    fn from_block(declared_id: &str, title: &str, body: &[&str]) -> Self {
        let mut story_points = None;
        let mut priority = None;
        let mut description = Vec::new();

        for &line in body {
            let trimmed = line.trim();
            if trimmed.is_empty() || document::checkbox(line).is_some() {
                continue;
            }
            if story_points.is_none() {
                if let Some(caps) = points_re().captures(trimmed) {
                    story_points = caps[1].parse().ok();
                    continue;
                }
            }
            if trimmed.to_ascii_lowercase().contains("story points") {
                continue;
            }
            if priority.is_none() {
                if let Some(m) = priority_label_re().find(trimmed) {
                    priority = document::parse_level_line(&trimmed[m.end()..], false);
                    continue;
                }
                if let Some(level) = document::parse_level_line(trimmed, true) {
                    priority = Some(level);
                    continue;
                }
            }
            let plain = trimmed.trim_matches('*').trim_end_matches(':');
            if plain.eq_ignore_ascii_case("acceptance criteria") {
                continue;
            }
            description.push(trimmed);
        }

        Self {
            declared_id: declared_id.to_string(),
            title: title.to_string(),
            story_points,
            priority: priority.unwrap_or_default(),
            description: if description.is_empty() {
                None
            } else {
                Some(description.join(" "))
            },
            acceptance_criteria: document::parse_criteria_lines(body),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
