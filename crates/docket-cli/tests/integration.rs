#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn docket(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docket").unwrap();
    cmd.current_dir(dir.path()).env("DOCKET_ROOT", dir.path());
    cmd
}

fn init_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    docket(&dir).arg("init").assert().success();
    dir
}

fn read(dir: &TempDir, rel: &str) -> String {
    std::fs::read_to_string(dir.path().join(rel)).unwrap()
}

fn json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let out = docket(dir).arg("--json").args(args).output().unwrap();
    assert!(out.status.success(), "{args:?} failed: {:?}", out);
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// docket init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_layout() {
    let dir = init_project();
    for sub in [
        "tickets",
        "tickets/archive",
        "stories",
        "stories/archive",
        "docs/prd/active",
        "docs/prd/archive",
        "issues",
        "issues/archive",
    ] {
        assert!(dir.path().join(sub).is_dir(), "{sub} missing");
    }
    for name in ["ticket", "story", "prd", "issue"] {
        assert!(dir.path().join(format!("templates/{name}.md")).exists());
    }
    assert!(dir.path().join("docket.yaml").exists());
}

#[test]
fn init_keeps_custom_templates() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();
    std::fs::write(dir.path().join("templates/ticket.md"), "custom\n").unwrap();
    docket(&dir).arg("init").assert().success();
    docket(&dir).arg("init").assert().success();
    assert_eq!(read(&dir, "templates/ticket.md"), "custom\n");
}

// ---------------------------------------------------------------------------
// creation
// ---------------------------------------------------------------------------

#[test]
fn create_prd_writes_lower_case_file() {
    let dir = init_project();
    docket(&dir)
        .args(["create-prd", "User Dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRD-001"));

    let text = read(&dir, "docs/prd/active/prd-001-user-dashboard.md");
    assert!(text.starts_with("# PRD-001: User Dashboard\n"));
    assert!(text.contains("- [x] Draft"));
}

#[test]
fn create_ticket_then_list() {
    let dir = init_project();
    docket(&dir)
        .args(["create-ticket", "Fix Bug", "Login fails on Safari", "high"])
        .assert()
        .success();

    docket(&dir)
        .arg("list-tickets")
        .assert()
        .success()
        .stdout(predicate::str::contains("TICKET-001"))
        .stdout(predicate::str::contains("Fix Bug"))
        .stdout(predicate::str::contains("High"))
        .stdout(predicate::str::contains("Not Started"));

    let listed = json(&dir, &["list-tickets"]);
    assert_eq!(listed[0]["id"], "TICKET-001");
    assert_eq!(listed[0]["priority"], "high");
    assert_eq!(listed[0]["status"], "not_started");
}

#[test]
fn ids_increase_and_deleted_ids_leave_gaps() {
    let dir = init_project();
    for title in ["One", "Two", "Three"] {
        docket(&dir)
            .args(["create-ticket", title, "desc"])
            .assert()
            .success();
    }
    assert!(dir.path().join("tickets/TICKET-003-three.md").exists());

    docket(&dir)
        .args(["clear-tickets", "TICKET-001", "--yes", "--no-archive"])
        .assert()
        .success();
    assert!(!dir.path().join("tickets/TICKET-001-one.md").exists());

    docket(&dir)
        .args(["create-ticket", "Four", "desc"])
        .assert()
        .success();
    assert!(dir.path().join("tickets/TICKET-004-four.md").exists());
}

#[test]
fn permanently_deleted_highest_id_is_not_reused() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir).args(["create-ticket", "B", "d"]).assert().success();
    docket(&dir)
        .args(["clear-tickets", "TICKET-002", "--yes", "--no-archive"])
        .assert()
        .success();
    assert!(!dir.path().join("tickets/TICKET-002-b.md").exists());
    assert!(!dir.path().join("tickets/archive/TICKET-002-b.md").exists());

    docket(&dir).args(["create-ticket", "C", "d"]).assert().success();
    assert!(dir.path().join("tickets/TICKET-003-c.md").exists());
    assert!(!dir.path().join("tickets/TICKET-002-c.md").exists());
}

#[test]
fn cleared_tickets_are_archived_and_ids_stay_reserved() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir)
        .args(["clear-tickets", "ALL", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TICKET-001"));
    assert!(dir.path().join("tickets/archive/TICKET-001-a.md").exists());

    docket(&dir).args(["create-ticket", "B", "d"]).assert().success();
    assert!(dir.path().join("tickets/TICKET-002-b.md").exists());
}

#[test]
fn clear_tickets_declined_deletes_nothing() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir)
        .args(["clear-tickets", "ALL"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));
    assert!(dir.path().join("tickets/TICKET-001-a.md").exists());
}

#[test]
fn missing_template_fails() {
    let dir = init_project();
    std::fs::remove_file(dir.path().join("templates/ticket.md")).unwrap();
    docket(&dir)
        .args(["create-ticket", "A", "d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template not found"));
    assert_eq!(std::fs::read_dir(dir.path().join("tickets")).unwrap().count(), 1);
}

#[test]
fn missing_arguments_print_usage_without_writing() {
    let dir = init_project();
    docket(&dir)
        .arg("create-ticket")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    docket(&dir)
        .args(["create-ticket", "A", "d", "urgent"])
        .assert()
        .failure();
    assert!(!dir.path().join("tickets/TICKET-001-a.md").exists());
}

#[test]
fn create_issue_with_severity() {
    let dir = init_project();
    docket(&dir)
        .args(["create-issue", "Crash on save", "critical", "--description", "Boom"])
        .assert()
        .success();
    let shown = json(&dir, &["show", "BUG-001"]);
    assert_eq!(shown["severity"], "critical");
    assert_eq!(shown["status"], "open");
    assert_eq!(shown["path"], "issues/BUG-001-crash-on-save.md");
}

// ---------------------------------------------------------------------------
// stories
// ---------------------------------------------------------------------------

const STORY_BLOCKS: &str = "### STORY-XXX: View widgets
**Story Points:** 5
**Priority:** 🟠 High

As a user I want widgets.

- [ ] Widgets render

### STORY-XXX: Rearrange widgets
Points: 3
";

#[test]
fn generate_stories_from_prd() {
    let dir = init_project();
    docket(&dir).args(["create-prd", "Dashboard"]).assert().success();
    let path = dir.path().join("docs/prd/active/prd-001-dashboard.md");
    let text = std::fs::read_to_string(&path).unwrap();
    let text = text.replace("## Out of Scope", &format!("{STORY_BLOCKS}\n## Out of Scope"));
    std::fs::write(&path, text).unwrap();

    docket(&dir)
        .args(["generate-stories", "PRD-001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STORY-001"))
        .stdout(predicate::str::contains("STORY-002"));

    let story = read(&dir, "stories/STORY-001-view-widgets.md");
    assert!(story.contains("PRD-001"));
    assert!(story.contains("🟠 High"));

    docket(&dir)
        .args(["generate-stories", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));
    assert!(!dir.path().join("stories/STORY-003-view-widgets.md").exists());

    let stories = json(&dir, &["list-stories"]);
    assert_eq!(stories.as_array().unwrap().len(), 2);
    assert_eq!(stories[0]["story_points"], 5);
    assert_eq!(stories[0]["prd"], "PRD-001");
}

// ---------------------------------------------------------------------------
// transitions
// ---------------------------------------------------------------------------

#[test]
fn pick_ticket_moves_to_in_progress() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "Low", "d", "low"]).assert().success();
    docket(&dir).args(["create-ticket", "Urgent", "d", "critical"]).assert().success();

    docket(&dir)
        .arg("pick-ticket")
        .assert()
        .success()
        .stdout(predicate::str::contains("Picked TICKET-002"));
    let text = read(&dir, "tickets/TICKET-002-urgent.md");
    assert!(text.contains("- [x] In Progress"));
    assert!(text.contains("- [ ] Not Started"));
}

#[test]
fn picking_active_ticket_is_a_noop() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir).args(["pick-ticket", "--ticket", "TICKET-001"]).assert().success();
    let before = read(&dir, "tickets/TICKET-001-a.md");

    docket(&dir)
        .args(["pick-ticket", "--ticket=1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already in progress"));
    assert_eq!(read(&dir, "tickets/TICKET-001-a.md"), before);
}

#[test]
fn pick_story_with_nothing_available() {
    let dir = init_project();
    docket(&dir)
        .arg("pick-story")
        .assert()
        .success()
        .stdout(predicate::str::contains("No Not Started stories"));
}

#[test]
fn update_ticket_renames_file() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "Fix Bug", "old"]).assert().success();
    docket(&dir)
        .args([
            "update-ticket",
            "--id=TICKET-001",
            "--status=review",
            "--name=Fix login bug",
            "--description=Now with steps",
        ])
        .assert()
        .success();

    assert!(!dir.path().join("tickets/TICKET-001-fix-bug.md").exists());
    let text = read(&dir, "tickets/TICKET-001-fix-login-bug.md");
    assert!(text.starts_with("# TICKET-001: Fix login bug\n"));
    assert!(text.contains("- [x] Review"));
    assert!(text.contains("Now with steps"));
}

#[test]
fn update_ticket_rejects_taken_id() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir).args(["create-ticket", "B", "d"]).assert().success();
    docket(&dir)
        .args(["update-ticket", "--id", "1", "--newid", "TICKET-002"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));
    assert!(dir.path().join("tickets/TICKET-001-a.md").exists());
}

#[test]
fn update_ticket_without_changes_prints_usage() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    let before = read(&dir, "tickets/TICKET-001-a.md");
    docket(&dir)
        .args(["update-ticket", "--id=TICKET-001"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage"));
    assert_eq!(read(&dir, "tickets/TICKET-001-a.md"), before);
}

#[test]
fn set_status_without_status_section_fails_and_leaves_file() {
    let dir = init_project();
    let bare = "# TICKET-001: Bare\n\n## Description\nNo status here.\n";
    std::fs::write(dir.path().join("tickets/TICKET-001-bare.md"), bare).unwrap();
    docket(&dir)
        .args(["set-status", "TICKET-001", "complete"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed document"));
    assert_eq!(read(&dir, "tickets/TICKET-001-bare.md"), bare);
}

#[test]
fn set_status_rejects_foreign_status() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir)
        .args(["set-status", "TICKET-001", "approved"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status"));
    docket(&dir)
        .args(["set-status", "TICKET-001", "complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not Started -> Complete"));
}

#[test]
fn guarded_mode_rejects_reopening() {
    let dir = init_project();
    std::fs::write(
        dir.path().join("docket.yaml"),
        "transitions:\n  update_guard: guarded\n",
    )
    .unwrap();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir)
        .args(["set-status", "TICKET-001", "complete"])
        .assert()
        .success();
    docket(&dir)
        .args(["set-status", "TICKET-001", "not-started"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("terminal"));
}

#[test]
fn unknown_id_lists_alternatives_and_exits_zero() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir)
        .args(["show", "TICKET-042"])
        .assert()
        .success()
        .stderr(predicate::str::contains("TICKET-042 not found"))
        .stderr(predicate::str::contains("available: TICKET-001"));
}

#[test]
fn archive_prd_moves_and_lists_with_flag() {
    let dir = init_project();
    docket(&dir).args(["create-prd", "Old idea"]).assert().success();
    docket(&dir).args(["archive-prd", "PRD-001"]).assert().success();
    assert!(dir.path().join("docs/prd/archive/prd-001-old-idea.md").exists());

    docket(&dir)
        .arg("list-prds")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PRDs found"));
    docket(&dir)
        .args(["list-prds", "--archived"])
        .assert()
        .success()
        .stdout(predicate::str::contains("archive"));
}

// ---------------------------------------------------------------------------
// reports
// ---------------------------------------------------------------------------

#[test]
fn status_report_on_empty_project_is_zero_percent() {
    let dir = init_project();
    let report = json(&dir, &["status-report"]);
    for kind in report["kinds"].as_array().unwrap() {
        assert_eq!(kind["total"], 0);
        assert_eq!(kind["completion_pct"], 0.0);
    }
}

#[test]
fn status_report_counts_completion() {
    let dir = init_project();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();
    docket(&dir).args(["create-ticket", "B", "d"]).assert().success();
    docket(&dir)
        .args(["set-status", "TICKET-001", "complete"])
        .assert()
        .success();
    docket(&dir)
        .arg("status-report")
        .assert()
        .success()
        .stdout(predicate::str::contains("TICKETS  2 total | 1 complete (50.0%)"));
}

#[test]
fn sprint_report_survives_failing_collaborators() {
    let dir = init_project();
    std::fs::write(
        dir.path().join("docket.yaml"),
        "sprint:\n  command_timeout_seconds: 10\n  checks:\n    - name: tests\n      command: \"true\"\n    - name: lint\n      command: \"exit 1\"\n",
    )
    .unwrap();
    docket(&dir).args(["create-ticket", "A", "d"]).assert().success();

    let report = json(&dir, &["sprint-report"]);
    let steps = report["steps"].as_array().unwrap();
    let step = |name: &str| steps.iter().find(|s| s["name"] == name).cloned().unwrap();
    assert_eq!(step("tests")["passed"], true);
    assert_eq!(step("lint")["passed"], false);
    assert_eq!(report["tickets"]["total"], 1);

    let rules: Vec<&str> = report["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["rule"].as_str())
        .collect();
    assert!(rules.contains(&"failed-checks"));
    assert!(rules.contains(&"idle"));

    docket(&dir)
        .arg("sprint-report")
        .assert()
        .success()
        .stdout(predicate::str::contains("RECOMMENDATIONS"));
}
