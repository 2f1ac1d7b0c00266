use crate::output::print_json;
use docket_core::entity::points_label;
use docket_core::id::EntityId;
use docket_core::types::EntityKind;
use std::path::Path;

pub fn run(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let id = EntityId::parse(id)?;
    let stored = ws.find(id)?;

    if json {
        return print_json(&stored);
    }

    let e = &stored.entity;
    println!("{}: {}", e.id, e.title);
    println!("  File:     {} ({})", stored.path.display(), stored.bucket);
    println!("  Status:   {}", e.status);
    match e.severity {
        Some(severity) => println!("  Severity: {} {}", severity.emoji(), severity),
        None => println!("  Priority: {} {}", e.priority.emoji(), e.priority),
    }
    if let Some(created) = e.created {
        println!("  Created:  {created}");
    }
    if e.kind == EntityKind::Story {
        println!("  Points:   {}", e.story_points_label());
        if let Some(prd) = e.prd {
            println!("  PRD:      {prd}");
        }
    }
    if let Some(description) = &e.description {
        println!();
        println!("{description}");
    }
    if !e.acceptance_criteria.is_empty() {
        println!();
        println!("Acceptance criteria:");
        for c in &e.acceptance_criteria {
            println!("  [{}] {}", if c.done { 'x' } else { ' ' }, c.text);
        }
    }
    if !e.stories.is_empty() {
        println!();
        println!("Stories:");
        for s in &e.stories {
            println!(
                "  {} ({} points, {})",
                s.title,
                points_label(s.story_points),
                s.priority
            );
        }
    }
    Ok(())
}
