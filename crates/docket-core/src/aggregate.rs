use crate::entity::Entity;
use crate::error::Result;
use crate::process::StepResult;
use crate::types::{EntityKind, Priority, Status};
use crate::vcs::VcsSnapshot;
use serde::Serialize;

/// Tickets plus stories in progress above this count are flagged.
pub const WIP_LIMIT: usize = 3;
/// Tickets plus stories waiting in review at or above this count are flagged.
pub const REVIEW_BACKLOG_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// KindSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Count {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub kind: EntityKind,
    pub total: usize,
    pub completed: usize,
    pub completion_pct: f64,
    /// Every status of the kind, in checkbox order, zero counts included.
    pub by_status: Vec<Count>,
    /// Priority for most kinds, severity for issues; highest first.
    pub by_priority: Vec<Count>,
}

impl KindSummary {
    pub fn status_count(&self, status: Status) -> usize {
        self.by_status
            .iter()
            .find(|c| c.name == status.label())
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn priority_count(&self, level: Priority) -> usize {
        self.by_priority
            .iter()
            .find(|c| c.name == level.label())
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// `completed / total * 100`, one decimal; `0` when there is nothing to count.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = completed as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

pub fn summarize(kind: EntityKind, entities: &[Entity]) -> KindSummary {
    let total = entities.len();
    let completed = entities.iter().filter(|e| e.status.is_completed()).count();

    let by_status = kind
        .statuses()
        .iter()
        .map(|&s| Count {
            name: s.label().to_string(),
            count: entities.iter().filter(|e| e.status == s).count(),
        })
        .collect();

    let by_priority = Priority::all()
        .iter()
        .rev()
        .map(|&p| Count {
            name: p.label().to_string(),
            count: entities.iter().filter(|e| e.level() == p).count(),
        })
        .collect();

    KindSummary {
        kind,
        total,
        completed,
        completion_pct: completion_percentage(completed, total),
        by_status,
        by_priority,
    }
}

// ---------------------------------------------------------------------------
// StatusReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub kinds: Vec<KindSummary>,
    /// Entities whose status block had more than one checked line.
    pub ambiguous: Vec<String>,
}

pub fn status_report(groups: &[(EntityKind, Vec<Entity>)]) -> StatusReport {
    StatusReport {
        kinds: groups
            .iter()
            .map(|(kind, entities)| summarize(*kind, entities))
            .collect(),
        ambiguous: groups
            .iter()
            .flat_map(|(_, entities)| entities.iter())
            .filter(|e| e.status_ambiguous)
            .map(|e| e.id.to_string())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// SprintReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub wip_limit: usize,
    pub review_backlog_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            wip_limit: WIP_LIMIT,
            review_backlog_limit: REVIEW_BACKLOG_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub rule: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SprintReport {
    pub tickets: KindSummary,
    pub stories: KindSummary,
    pub issues: KindSummary,
    pub vcs: Option<VcsSnapshot>,
    pub steps: Vec<StepResult>,
    pub recommendations: Vec<Recommendation>,
}

impl SprintReport {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.passed)
    }
}

pub struct SprintInputs<'a> {
    pub tickets: &'a [Entity],
    pub stories: &'a [Entity],
    pub issues: &'a [Entity],
    pub vcs: Result<VcsSnapshot>,
    pub steps: Vec<StepResult>,
}

/// Merge ticket/story/issue aggregates with collaborator results. A failed
/// version-control lookup becomes a failed `git` step, not an error.
pub fn sprint_report(inputs: SprintInputs<'_>, thresholds: &Thresholds) -> SprintReport {
    let mut steps = Vec::with_capacity(inputs.steps.len() + 1);
    let vcs = match inputs.vcs {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            steps.push(StepResult {
                name: "git".to_string(),
                passed: false,
                output: e.to_string(),
                duration_ms: 0,
            });
            None
        }
    };
    steps.extend(inputs.steps);

    let mut report = SprintReport {
        tickets: summarize(EntityKind::Ticket, inputs.tickets),
        stories: summarize(EntityKind::Story, inputs.stories),
        issues: summarize(EntityKind::Issue, inputs.issues),
        vcs,
        steps,
        recommendations: Vec::new(),
    };
    report.recommendations = recommendations(&report, inputs.issues, thresholds);
    report
}

/// Fixed rule set; thresholds come from [`Thresholds`].
pub fn recommendations(
    report: &SprintReport,
    issues: &[Entity],
    thresholds: &Thresholds,
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let work = [&report.tickets, &report.stories];
    let in_progress: usize = work.iter().map(|s| s.status_count(Status::InProgress)).sum();
    let in_review: usize = work.iter().map(|s| s.status_count(Status::Review)).sum();
    let not_started: usize = work.iter().map(|s| s.status_count(Status::NotStarted)).sum();

    if in_progress > thresholds.wip_limit {
        out.push(Recommendation {
            rule: "wip-limit",
            message: format!(
                "{in_progress} items in progress (limit {}): finish work before picking more",
                thresholds.wip_limit
            ),
        });
    }

    if in_review >= thresholds.review_backlog_limit && in_review > 0 {
        out.push(Recommendation {
            rule: "review-backlog",
            message: format!("{in_review} items waiting in review: clear the review queue"),
        });
    }

    let urgent: Vec<String> = issues
        .iter()
        .filter(|e| !e.status.is_completed() && e.level() >= Priority::High)
        .map(|e| e.id.to_string())
        .collect();
    if !urgent.is_empty() {
        out.push(Recommendation {
            rule: "urgent-issues",
            message: format!("unresolved high-severity issues: {}", urgent.join(", ")),
        });
    }

    if report.vcs.as_ref().is_some_and(|v| v.has_uncommitted) {
        out.push(Recommendation {
            rule: "uncommitted-changes",
            message: "working tree has uncommitted changes: commit or stash them".to_string(),
        });
    }

    let failed: Vec<&str> = report.failed_steps().map(|s| s.name.as_str()).collect();
    if !failed.is_empty() {
        out.push(Recommendation {
            rule: "failed-checks",
            message: format!("failing checks: {}", failed.join(", ")),
        });
    }

    if in_progress == 0 && not_started > 0 {
        out.push(Recommendation {
            rule: "idle",
            message: "nothing in progress: run pick-ticket or pick-story".to_string(),
        });
    }

    let total = report.tickets.total + report.stories.total;
    let completed = report.tickets.completed + report.stories.completed;
    if total > 0 && completed == total {
        out.push(Recommendation {
            rule: "sprint-complete",
            message: "all tickets and stories are complete".to_string(),
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocketError;
    use crate::id::EntityId;

    fn entity(kind: EntityKind, n: u32, status: Status, priority: Priority) -> Entity {
        Entity {
            id: EntityId::new(kind, n),
            kind,
            title: format!("{kind} {n}"),
            status,
            status_ambiguous: false,
            priority,
            severity: (kind == EntityKind::Issue).then_some(priority),
            created: None,
            description: None,
            story_points: None,
            prd: None,
            acceptance_criteria: Vec::new(),
            stories: Vec::new(),
        }
    }

    fn no_vcs() -> Result<VcsSnapshot> {
        Err(DocketError::ExternalTool {
            tool: "git".to_string(),
            message: "git not found on PATH".to_string(),
        })
    }

    #[test]
    fn empty_kind_is_zero_percent() {
        let summary = summarize(EntityKind::Ticket, &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_pct, 0.0);
        assert!(!summary.completion_pct.is_nan());
        assert_eq!(summary.by_status.len(), 4);
        assert!(summary.by_status.iter().all(|c| c.count == 0));
    }

    #[test]
    fn counts_by_status_and_priority() {
        let tickets = vec![
            entity(EntityKind::Ticket, 1, Status::Complete, Priority::High),
            entity(EntityKind::Ticket, 2, Status::InProgress, Priority::High),
            entity(EntityKind::Ticket, 3, Status::NotStarted, Priority::Low),
        ];
        let s = summarize(EntityKind::Ticket, &tickets);
        assert_eq!(s.total, 3);
        assert_eq!(s.completed, 1);
        assert_eq!(s.completion_pct, 33.3);
        assert_eq!(s.status_count(Status::InProgress), 1);
        assert_eq!(s.priority_count(Priority::High), 2);
        assert_eq!(s.by_priority[0].name, "Critical");
    }

    #[test]
    fn issues_complete_when_resolved() {
        let issues = vec![
            entity(EntityKind::Issue, 1, Status::Resolved, Priority::Low),
            entity(EntityKind::Issue, 2, Status::Open, Priority::Low),
        ];
        assert_eq!(summarize(EntityKind::Issue, &issues).completion_pct, 50.0);
    }

    #[test]
    fn status_report_lists_ambiguous_entities() {
        let mut t = entity(EntityKind::Ticket, 4, Status::InProgress, Priority::Medium);
        t.status_ambiguous = true;
        let report = status_report(&[(EntityKind::Ticket, vec![t]), (EntityKind::Prd, vec![])]);
        assert_eq!(report.kinds.len(), 2);
        assert_eq!(report.ambiguous, vec!["TICKET-004".to_string()]);
        assert_eq!(report.kinds[1].completion_pct, 0.0);
    }

    #[test]
    fn sprint_flags_wip_and_failed_git() {
        let tickets: Vec<Entity> = (1..=4)
            .map(|n| entity(EntityKind::Ticket, n, Status::InProgress, Priority::Medium))
            .collect();
        let report = sprint_report(
            SprintInputs {
                tickets: &tickets,
                stories: &[],
                issues: &[],
                vcs: no_vcs(),
                steps: Vec::new(),
            },
            &Thresholds::default(),
        );
        assert!(report.vcs.is_none());
        assert_eq!(report.steps.len(), 1);
        assert!(!report.steps[0].passed);
        let rules: Vec<&str> = report.recommendations.iter().map(|r| r.rule).collect();
        assert!(rules.contains(&"wip-limit"));
        assert!(rules.contains(&"failed-checks"));
        assert!(!rules.contains(&"idle"));
    }

    #[test]
    fn sprint_recommends_picking_when_idle() {
        let tickets = vec![entity(EntityKind::Ticket, 1, Status::NotStarted, Priority::Low)];
        let issues = vec![entity(EntityKind::Issue, 1, Status::Open, Priority::Critical)];
        let report = sprint_report(
            SprintInputs {
                tickets: &tickets,
                stories: &[],
                issues: &issues,
                vcs: Ok(VcsSnapshot {
                    branch: "main".to_string(),
                    commit_count: 3,
                    has_uncommitted: true,
                }),
                steps: Vec::new(),
            },
            &Thresholds::default(),
        );
        let rules: Vec<&str> = report.recommendations.iter().map(|r| r.rule).collect();
        assert_eq!(rules, vec!["urgent-issues", "uncommitted-changes", "idle"]);
    }

    #[test]
    fn sprint_complete_when_everything_done() {
        let tickets = vec![entity(EntityKind::Ticket, 1, Status::Complete, Priority::Low)];
        let stories = vec![entity(EntityKind::Story, 1, Status::Complete, Priority::Low)];
        let report = sprint_report(
            SprintInputs {
                tickets: &tickets,
                stories: &stories,
                issues: &[],
                vcs: Ok(VcsSnapshot {
                    branch: "main".to_string(),
                    commit_count: 10,
                    has_uncommitted: false,
                }),
                steps: Vec::new(),
            },
            &Thresholds::default(),
        );
        let rules: Vec<&str> = report.recommendations.iter().map(|r| r.rule).collect();
        assert_eq!(rules, vec!["sprint-complete"]);
    }
}
