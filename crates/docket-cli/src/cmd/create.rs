use crate::output::{print_json, print_table};
use anyhow::Context;
use docket_core::entity::points_label;
use docket_core::id::EntityId;
use docket_core::types::{EntityKind, Priority};
use docket_core::workspace::StoredEntity;
use std::path::Path;

pub fn prd(root: &Path, title: &str, priority: Priority, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let created = ws
        .create_prd(title, priority)
        .with_context(|| format!("failed to create PRD '{title}'"))?;
    report_created(&created, json)
}

pub fn ticket(
    root: &Path,
    title: &str,
    description: &str,
    priority: Priority,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let created = ws
        .create_ticket(title, description, priority)
        .with_context(|| format!("failed to create ticket '{title}'"))?;
    report_created(&created, json)
}

pub fn issue(
    root: &Path,
    title: &str,
    severity: Priority,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let created = ws
        .create_issue(title, severity, description)
        .with_context(|| format!("failed to create issue '{title}'"))?;
    report_created(&created, json)
}

fn report_created(created: &StoredEntity, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(created);
    }
    println!(
        "Created {}: {} ({})",
        created.entity.id,
        created.entity.title,
        created.path.display()
    );
    Ok(())
}

pub fn generate_stories(root: &Path, prd_id: &str, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let prd_id = EntityId::parse_for(EntityKind::Prd, prd_id)?;
    let generated = ws
        .generate_stories(prd_id)
        .with_context(|| format!("failed to generate stories for {prd_id}"))?;

    if json {
        return print_json(&generated);
    }

    for title in &generated.skipped {
        println!("Skipped '{title}': story already exists for {prd_id}");
    }
    if generated.created.is_empty() {
        println!("No new stories generated from {prd_id}.");
        return Ok(());
    }

    let rows = generated
        .created
        .iter()
        .map(|s| {
            vec![
                s.entity.id.to_string(),
                s.entity.title.clone(),
                points_label(s.entity.story_points),
                s.entity.priority.to_string(),
            ]
        })
        .collect();
    println!(
        "Generated {} stories from {prd_id}:",
        generated.created.len()
    );
    print_table(&["ID", "TITLE", "POINTS", "PRIORITY"], rows);
    Ok(())
}
