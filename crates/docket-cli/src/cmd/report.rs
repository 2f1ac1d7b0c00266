use crate::output::print_json;
use anyhow::Context;
use docket_core::aggregate::KindSummary;
use docket_core::vcs::Git;
use std::path::Path;

pub fn status(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let report = ws.status_report().context("failed to build status report")?;

    if json {
        return print_json(&report);
    }

    println!("Project: {}", root.display());
    println!();
    for summary in &report.kinds {
        print_summary(summary);
        println!();
    }
    if !report.ambiguous.is_empty() {
        println!(
            "AMBIGUOUS STATUS  {} (first checked status used)",
            report.ambiguous.join(", ")
        );
    }
    Ok(())
}

pub fn sprint(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let git = Git::new(ws.config().sprint.command_timeout());
    let report = ws
        .sprint_report(&git, root)
        .context("failed to build sprint report")?;

    if json {
        return print_json(&report);
    }

    match &report.vcs {
        Some(vcs) => println!(
            "Branch: {}   Commits: {}   Uncommitted changes: {}",
            vcs.branch,
            vcs.commit_count,
            if vcs.has_uncommitted { "yes" } else { "no" }
        ),
        None => println!("Branch: unknown"),
    }
    println!();

    for summary in [&report.tickets, &report.stories, &report.issues] {
        print_summary(summary);
        println!();
    }

    if !report.steps.is_empty() {
        println!("CHECKS");
        for step in &report.steps {
            let mark = if step.passed { "pass" } else { "FAIL" };
            println!("  [{mark}] {} ({} ms)", step.name, step.duration_ms);
            if !step.passed {
                let lines: Vec<&str> = step.output.lines().collect();
                for line in &lines[lines.len().saturating_sub(5)..] {
                    println!("         {line}");
                }
            }
        }
        println!();
    }

    if report.recommendations.is_empty() {
        println!("RECOMMENDATIONS  none");
    } else {
        println!("RECOMMENDATIONS");
        for rec in &report.recommendations {
            println!("  - {}", rec.message);
        }
    }
    Ok(())
}

fn print_summary(summary: &KindSummary) {
    println!(
        "{}  {} total | {} complete ({:.1}%)",
        summary.kind.plural().to_uppercase(),
        summary.total,
        summary.completed,
        summary.completion_pct
    );
    for count in &summary.by_status {
        println!("  {:<16} {}", count.name, count.count);
    }
    let levels: Vec<String> = summary
        .by_priority
        .iter()
        .map(|c| format!("{} {}", c.name, c.count))
        .collect();
    println!("  {:<16} {}", "by level", levels.join(" | "));
}
