//! Ordered-section grammar for entity documents.
//!
//! ```text
//! # <PREFIX>-<digits>: <title>      level-1 heading (identity)
//! ## <Section>                      level-2 sections, in order
//! <body lines>
//! ### <Block>                       sub-blocks inside a section (PRD stories)
//! ```
//!
//! Parsing is tolerant: every extractor returns an `Option` or a documented
//! default instead of failing, so reports stay usable on hand-edited files.
//! Rewriting helpers are strict about the one section they touch and leave
//! every other byte of the document alone.

use crate::id::EntityId;
use crate::types::{EntityKind, Priority, Status};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();
static DATE_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^#\s+([A-Za-z]+)-(\d+)\s*:\s*(.*?)\s*$").unwrap())
}

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+\[([ xX])\]\s*(.*?)\s*$").unwrap())
}

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap())
}

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"\b(\d+)\b").unwrap())
}

fn is_level1(line: &str) -> bool {
    line.starts_with("# ")
}

fn is_level2(line: &str) -> bool {
    line.starts_with("## ")
}

pub(crate) fn is_level3(line: &str) -> bool {
    line.starts_with("### ")
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub name: &'a str,
    pub lines: Vec<&'a str>,
}

impl Section<'_> {
    /// Body with surrounding blank lines removed.
    pub fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

/// A document split into its level-1 heading and level-2 sections.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub heading: Option<&'a str>,
    pub sections: Vec<Section<'a>>,
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    pub fn parse(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut heading = None;
        let mut sections: Vec<Section<'a>> = Vec::new();

        for &line in &lines {
            if is_level1(line) {
                if heading.is_none() {
                    heading = Some(line);
                }
                continue;
            }
            if is_level2(line) {
                sections.push(Section {
                    name: line[3..].trim(),
                    lines: Vec::new(),
                });
                continue;
            }
            if let Some(current) = sections.last_mut() {
                current.lines.push(line);
            }
        }

        Self {
            heading,
            sections,
            lines,
        }
    }

    /// First section whose name matches case-insensitively.
    pub fn section(&self, name: &str) -> Option<&Section<'a>> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn section_text(&self, name: &str) -> Option<String> {
        self.section(name)
            .map(|s| s.text())
            .filter(|t| !t.is_empty())
    }

    pub fn all_lines(&self) -> &[&'a str] {
        &self.lines
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub number: u32,
    pub title: String,
}

/// Parse `# <PREFIX>-<digits>: <title>` for `kind`. The prefix is matched
/// case-insensitively; a heading with another kind's prefix is ignored.
pub fn parse_heading(kind: EntityKind, line: &str) -> Option<Heading> {
    let caps = heading_re().captures(line)?;
    if !caps[1].eq_ignore_ascii_case(kind.id_prefix()) {
        return None;
    }
    let number = caps[2].parse().ok()?;
    Some(Heading {
        number,
        title: caps[3].to_string(),
    })
}

/// Number from the first level-1 heading of `text`, if it belongs to `kind`.
pub fn heading_number(kind: EntityKind, text: &str) -> Option<u32> {
    let line = text.lines().find(|l| is_level1(l))?;
    parse_heading(kind, line).map(|h| h.number)
}

// ---------------------------------------------------------------------------
// Checkboxes and status
// ---------------------------------------------------------------------------

/// `- [x] label` → `(true, "label")`.
pub fn checkbox(line: &str) -> Option<(bool, &str)> {
    let caps = checkbox_re().captures(line)?;
    let checked = !caps[1].trim().is_empty();
    let label = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((checked, label))
}

/// True when `text` is `label`, or starts with `label` followed by a
/// non-alphanumeric character. `Review` matches `Review (pending)` but
/// never `In Review` or `Reviewed`.
fn label_matches(text: &str, label: &str) -> bool {
    let Some(head) = text.get(..label.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(label) {
        return false;
    }
    text[label.len()..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedStatus {
    pub status: Status,
    /// More than one status line was checked; the first in scan order won.
    pub ambiguous: bool,
    /// No checked status line was found; `status` is the kind's initial one.
    pub defaulted: bool,
}

/// Resolve the checked status of a document.
///
/// Checkbox lines in `## Status` are scanned in the kind's fixed status
/// order; the first checked label wins. Without a `## Status` section every
/// checkbox line of the document is considered.
pub fn parse_status(kind: EntityKind, doc: &Document<'_>) -> ParsedStatus {
    let lines: Vec<&str> = match doc.section("Status") {
        Some(section) => section.lines.clone(),
        None => doc.all_lines().to_vec(),
    };
    let checked: Vec<&str> = lines
        .iter()
        .filter_map(|l| checkbox(l))
        .filter(|(on, _)| *on)
        .map(|(_, label)| label)
        .collect();

    let matches: Vec<Status> = kind
        .statuses()
        .iter()
        .copied()
        .filter(|s| checked.iter().any(|label| label_matches(label, s.label())))
        .collect();

    match matches.first() {
        Some(&status) => ParsedStatus {
            status,
            ambiguous: matches.len() > 1,
            defaulted: false,
        },
        None => ParsedStatus {
            status: kind.initial_status(),
            ambiguous: false,
            defaulted: true,
        },
    }
}

/// Canonical checkbox block with exactly `active` checked.
pub fn render_status_block(kind: EntityKind, active: Status) -> String {
    kind.statuses()
        .iter()
        .map(|s| {
            let mark = if *s == active { 'x' } else { ' ' };
            format!("- [{mark}] {}", s.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Priority / severity
// ---------------------------------------------------------------------------

/// Parse a level line: `🟠 High`, `High`, `**Priority:** 🔴 Critical`.
/// Only the emoji form is accepted when `require_emoji` is set.
pub fn parse_level_line(line: &str, require_emoji: bool) -> Option<Priority> {
    let line = line.trim();
    for &level in Priority::all() {
        if let Some(pos) = line.find(level.emoji()) {
            let rest = line[pos + level.emoji().len()..].trim_start();
            let word = rest
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or("");
            return Some(word.parse().unwrap_or(level));
        }
    }
    if require_emoji {
        return None;
    }
    let word = line
        .trim_start_matches(['-', '*', ' '])
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("");
    word.parse().ok()
}

/// Level from the named section, falling back to any emoji-prefixed level
/// line in the document.
pub fn parse_level(doc: &Document<'_>, section: &str) -> Option<Priority> {
    if let Some(s) = doc.section(section) {
        if let Some(level) = s.lines.iter().find_map(|l| parse_level_line(l, false)) {
            return Some(level);
        }
    }
    doc.all_lines()
        .iter()
        .filter(|l| !is_level1(l) && !is_level2(l) && !is_level3(l))
        .find_map(|l| parse_level_line(l, true))
}

// ---------------------------------------------------------------------------
// Other fields
// ---------------------------------------------------------------------------

pub fn parse_created(doc: &Document<'_>) -> Option<NaiveDate> {
    doc.section("Created")?.lines.iter().find_map(|l| {
        let caps = date_re().captures(l)?;
        NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
    })
}

/// First integer in `## Story Points`; `Unknown` or no number is `None`.
pub fn parse_story_points(doc: &Document<'_>) -> Option<u32> {
    doc.section("Story Points")?
        .lines
        .iter()
        .find_map(|l| number_re().captures(l)?[1].parse().ok())
}

/// First `PRD-<digits>` token in `## PRD`.
pub fn parse_prd_ref(doc: &Document<'_>) -> Option<EntityId> {
    doc.section("PRD")?.lines.iter().find_map(|l| {
        l.split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .find_map(|token| EntityId::parse(token).ok())
            .filter(|id| id.kind == EntityKind::Prd)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub text: String,
    pub done: bool,
}

pub fn parse_criteria_lines(lines: &[&str]) -> Vec<Criterion> {
    lines
        .iter()
        .filter_map(|l| checkbox(l))
        .filter(|(_, text)| !text.is_empty())
        .map(|(done, text)| Criterion {
            text: text.to_string(),
            done,
        })
        .collect()
}

pub fn parse_criteria(doc: &Document<'_>) -> Vec<Criterion> {
    doc.section("Acceptance Criteria")
        .map(|s| parse_criteria_lines(&s.lines))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Line index range `(heading, end)` of section `name`; `end` is exclusive
/// and points at the next level-1/level-2 heading or the end of input.
fn section_bounds(lines: &[&str], name: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| is_level2(l) && l[3..].trim().eq_ignore_ascii_case(name))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| is_level1(l) || is_level2(l))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());
    Some((start, end))
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}

/// Replace the checkbox lines of `## Status` with the canonical block for
/// `kind`, `active` checked. Non-checkbox lines in the section are kept.
/// Returns `None` when the document has no `## Status` section.
pub fn replace_status_block(text: &str, kind: EntityKind, active: Status) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = section_bounds(&lines, "Status")?;

    let block = render_status_block(kind, active);
    let mut out: Vec<String> = lines[..=start].iter().map(|l| l.to_string()).collect();
    let mut inserted = false;
    for &line in &lines[start + 1..end] {
        if checkbox(line).is_some() {
            if !inserted {
                out.push(block.clone());
                inserted = true;
            }
            continue;
        }
        out.push(line.to_string());
    }
    if !inserted {
        // Empty status section: put the block right under the heading.
        out.insert(start + 1, block);
    }
    out.extend(lines[end..].iter().map(|l| l.to_string()));
    Some(join_lines(&out, text.ends_with('\n')))
}

/// Replace (or prepend) the level-1 heading with `# <id>: <title>`.
pub fn replace_heading(text: &str, id: EntityId, title: &str) -> String {
    let heading = format!("# {id}: {title}");
    let mut lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    match lines.iter().position(|l| is_level1(l)) {
        Some(i) => lines[i] = heading,
        None => {
            lines.insert(0, String::new());
            lines.insert(0, heading);
        }
    }
    join_lines(&lines, text.ends_with('\n') || text.is_empty())
}

/// Replace the body of section `name` with `body`, or append the section
/// when it does not exist.
pub fn replace_section_body(text: &str, name: &str, body: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);
    match section_bounds(&lines, name) {
        Some((start, end)) => {
            out.extend(lines[..=start].iter().map(|l| l.to_string()));
            out.push(body.trim_end().to_string());
            if end < lines.len() {
                out.push(String::new());
            }
            out.extend(lines[end..].iter().map(|l| l.to_string()));
        }
        None => {
            out.extend(lines.iter().map(|l| l.to_string()));
            if out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push(String::new());
            }
            out.push(format!("## {name}"));
            out.push(body.trim_end().to_string());
        }
    }
    join_lines(&out, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TICKET: &str = "# TICKET-007: Fix login redirect

## Created
2024-03-05

## Status
- [ ] Not Started
- [x] In Progress
- [ ] Review
- [ ] Complete

## Priority
🟠 High

## Description
Users land on a blank page.

## Acceptance Criteria
- [x] Redirect to dashboard
- [ ] Add regression test
";

    #[test]
    fn splits_sections_in_order() {
        let doc = Document::parse(TICKET);
        let names: Vec<&str> = doc.sections.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "Created",
                "Status",
                "Priority",
                "Description",
                "Acceptance Criteria"
            ]
        );
        assert_eq!(
            doc.section_text("description").as_deref(),
            Some("Users land on a blank page.")
        );
    }

    #[test]
    fn heading_matches_kind_prefix_only() {
        let h = parse_heading(EntityKind::Ticket, "# TICKET-007: Fix login redirect").unwrap();
        assert_eq!(h.number, 7);
        assert_eq!(h.title, "Fix login redirect");
        assert!(parse_heading(EntityKind::Story, "# TICKET-007: Fix").is_none());
        assert_eq!(
            parse_heading(EntityKind::Prd, "# prd-12: lower").map(|h| h.number),
            Some(12)
        );
    }

    #[test]
    fn extracts_fields() {
        let doc = Document::parse(TICKET);
        let status = parse_status(EntityKind::Ticket, &doc);
        assert_eq!(status.status, Status::InProgress);
        assert!(!status.ambiguous);
        assert_eq!(parse_level(&doc, "Priority"), Some(Priority::High));
        assert_eq!(
            parse_created(&doc),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        let criteria = parse_criteria(&doc);
        assert_eq!(criteria.len(), 2);
        assert!(criteria[0].done);
        assert!(!criteria[1].done);
    }

    #[test]
    fn multiple_checked_takes_first_in_scan_order() {
        let text = "# TICKET-1: x\n\n## Status\n- [x] Complete\n- [x] In Progress\n";
        let status = parse_status(EntityKind::Ticket, &Document::parse(text));
        assert_eq!(status.status, Status::InProgress);
        assert!(status.ambiguous);
    }

    #[test]
    fn review_does_not_match_in_review() {
        let text = "## Status\n- [ ] Draft\n- [x] In Review\n";
        let doc = Document::parse(text);
        assert_eq!(parse_status(EntityKind::Prd, &doc).status, Status::InReview);
        // "In Review" is not a ticket status, so the ticket defaults.
        let ticket = parse_status(EntityKind::Ticket, &doc);
        assert_eq!(ticket.status, Status::NotStarted);
        assert!(ticket.defaulted);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let doc = Document::parse("# STORY-3: Bare\n\nsome text\n");
        let status = parse_status(EntityKind::Story, &doc);
        assert_eq!(status.status, Status::NotStarted);
        assert!(status.defaulted);
        assert_eq!(parse_level(&doc, "Priority"), None);
        assert_eq!(parse_story_points(&doc), None);
        assert_eq!(parse_prd_ref(&doc), None);
        assert!(parse_criteria(&doc).is_empty());
        assert_eq!(parse_created(&doc), None);
    }

    #[test]
    fn level_falls_back_to_any_emoji_line() {
        let doc = Document::parse("# TICKET-4: x\n\n## Notes\nUrgency: 🔴 Critical\n");
        assert_eq!(parse_level(&doc, "Priority"), Some(Priority::Critical));

        // A section without a readable level also falls through.
        let doc = Document::parse("## Priority\nsoon\n\n## Notes\n🟢 Low\n");
        assert_eq!(parse_level(&doc, "Priority"), Some(Priority::Low));

        // Plain words outside the section are not levels.
        let doc = Document::parse("## Notes\nHigh\n");
        assert_eq!(parse_level(&doc, "Priority"), None);
    }

    #[test]
    fn checkboxes_without_status_section_are_scanned() {
        let doc = Document::parse("# TICKET-2: x\n- [ ] Not Started\n- [x] Review\n");
        assert_eq!(parse_status(EntityKind::Ticket, &doc).status, Status::Review);
    }

    #[test]
    fn story_points_and_prd_ref() {
        let text = "## Story Points\n5\n\n## PRD\nPRD-004 (User Dashboard)\n";
        let doc = Document::parse(text);
        assert_eq!(parse_story_points(&doc), Some(5));
        assert_eq!(parse_prd_ref(&doc).map(|id| id.number), Some(4));

        let unknown = Document::parse("## Story Points\nUnknown\n");
        assert_eq!(parse_story_points(&unknown), None);
    }

    #[test]
    fn level_line_variants() {
        assert_eq!(parse_level_line("🔴 Critical", true), Some(Priority::Critical));
        assert_eq!(parse_level_line("**Priority:** 🟢 Low", true), Some(Priority::Low));
        assert_eq!(parse_level_line("High", false), Some(Priority::High));
        assert_eq!(parse_level_line("High", true), None);
        // Emoji without a readable word falls back to the emoji's level.
        assert_eq!(parse_level_line("🟠", true), Some(Priority::High));
    }

    #[test]
    fn replace_status_block_marks_exactly_one() {
        let updated = replace_status_block(TICKET, EntityKind::Ticket, Status::Review).unwrap();
        let doc = Document::parse(&updated);
        let checked: Vec<_> = doc
            .section("Status")
            .unwrap()
            .lines
            .iter()
            .filter_map(|l| checkbox(l))
            .filter(|(on, _)| *on)
            .collect();
        assert_eq!(checked.len(), 1);
        assert_eq!(checked[0].1, "Review");
        // Untouched sections survive byte-for-byte.
        assert!(updated.contains("## Acceptance Criteria\n- [x] Redirect to dashboard\n"));
        assert!(updated.ends_with('\n'));
    }

    #[test]
    fn replace_status_block_requires_section() {
        assert!(replace_status_block("# TICKET-1: x\n", EntityKind::Ticket, Status::Complete).is_none());
    }

    #[test]
    fn replace_status_block_normalises_malformed_block() {
        let text = "# TICKET-1: x\n\n## Status\n- [x] Complete\n- [x] Not Started\n\n## Priority\nLow\n";
        let updated = replace_status_block(text, EntityKind::Ticket, Status::InProgress).unwrap();
        assert!(updated.contains(
            "## Status\n- [ ] Not Started\n- [x] In Progress\n- [ ] Review\n- [ ] Complete\n\n## Priority"
        ));
    }

    #[test]
    fn replace_heading_and_section() {
        let id = EntityId::new(EntityKind::Ticket, 9);
        let renamed = replace_heading(TICKET, id, "New title");
        assert!(renamed.starts_with("# TICKET-009: New title\n"));

        let described = replace_section_body(TICKET, "Description", "Rewritten.");
        assert!(described.contains("## Description\nRewritten.\n\n## Acceptance Criteria"));

        let appended = replace_section_body("# TICKET-1: x\n", "Description", "Added.");
        assert!(appended.ends_with("## Description\nAdded.\n"));
    }
}
