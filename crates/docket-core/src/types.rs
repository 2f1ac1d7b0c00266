use crate::error::DocketError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Ticket,
    Story,
    Prd,
    Issue,
}

impl EntityKind {
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Ticket,
            EntityKind::Story,
            EntityKind::Prd,
            EntityKind::Issue,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Ticket => "ticket",
            EntityKind::Story => "story",
            EntityKind::Prd => "prd",
            EntityKind::Issue => "issue",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Ticket => "tickets",
            EntityKind::Story => "stories",
            EntityKind::Prd => "PRDs",
            EntityKind::Issue => "issues",
        }
    }

    /// Prefix used in ids and document headings (`# TICKET-001: ...`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            EntityKind::Ticket => "TICKET",
            EntityKind::Story => "STORY",
            EntityKind::Prd => "PRD",
            EntityKind::Issue => "BUG",
        }
    }

    /// Prefix used in generated file names. PRD files are lower case
    /// (`prd-001-user-dashboard.md`); the others keep the id prefix.
    pub fn file_prefix(self) -> &'static str {
        match self {
            EntityKind::Prd => "prd",
            other => other.id_prefix(),
        }
    }

    pub fn template_name(self) -> &'static str {
        self.as_str()
    }

    /// Ordered status set. The parser scans and the transition engine
    /// rewrites checkbox blocks in exactly this order.
    pub fn statuses(self) -> &'static [Status] {
        match self {
            EntityKind::Ticket | EntityKind::Story => &[
                Status::NotStarted,
                Status::InProgress,
                Status::Review,
                Status::Complete,
            ],
            EntityKind::Prd => &[
                Status::Draft,
                Status::InReview,
                Status::Approved,
                Status::InDevelopment,
                Status::Complete,
                Status::Deprecated,
            ],
            EntityKind::Issue => &[Status::Open, Status::InProgress, Status::Resolved],
        }
    }

    pub fn initial_status(self) -> Status {
        self.statuses()[0]
    }

    pub fn accepts(self, status: Status) -> bool {
        self.statuses().contains(&status)
    }

    /// Parse a status name and check it belongs to this kind.
    pub fn parse_status(self, s: &str) -> Result<Status, DocketError> {
        let status: Status = s.parse()?;
        if !self.accepts(status) {
            return Err(DocketError::InvalidStatus {
                kind: self.as_str().to_string(),
                value: s.to_string(),
            });
        }
        Ok(status)
    }

    pub fn from_id_prefix(prefix: &str) -> Option<EntityKind> {
        EntityKind::all()
            .iter()
            .copied()
            .find(|k| k.id_prefix().eq_ignore_ascii_case(prefix))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Active,
    Archive,
}

impl Bucket {
    pub fn all() -> &'static [Bucket] {
        &[Bucket::Active, Bucket::Archive]
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bucket::Active => "active",
            Bucket::Archive => "archive",
        })
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Review,
    Complete,
    Draft,
    InReview,
    Approved,
    InDevelopment,
    Deprecated,
    Open,
    Resolved,
}

impl Status {
    /// Label as it appears in a checkbox block.
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Review => "Review",
            Status::Complete => "Complete",
            Status::Draft => "Draft",
            Status::InReview => "In Review",
            Status::Approved => "Approved",
            Status::InDevelopment => "In Development",
            Status::Deprecated => "Deprecated",
            Status::Open => "Open",
            Status::Resolved => "Resolved",
        }
    }

    /// Counts toward completion percentages.
    pub fn is_completed(self) -> bool {
        matches!(self, Status::Complete | Status::Resolved)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Complete | Status::Resolved | Status::Deprecated)
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, Status::InProgress | Status::InDevelopment)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Status {
    type Err = DocketError;

    /// Accepts labels and identifiers in any case or separator style:
    /// `In Progress`, `in-progress`, `in_progress`, `InProgress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "notstarted" | "todo" => Ok(Status::NotStarted),
            "inprogress" => Ok(Status::InProgress),
            "review" => Ok(Status::Review),
            "complete" | "completed" | "done" => Ok(Status::Complete),
            "draft" => Ok(Status::Draft),
            "inreview" => Ok(Status::InReview),
            "approved" => Ok(Status::Approved),
            "indevelopment" => Ok(Status::InDevelopment),
            "deprecated" => Ok(Status::Deprecated),
            "open" => Ok(Status::Open),
            "resolved" => Ok(Status::Resolved),
            _ => Err(DocketError::InvalidStatus {
                kind: "status".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Four-level scale shared by priority and issue severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🟠",
            Priority::Critical => "🔴",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Priority {
    type Err = DocketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(DocketError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
