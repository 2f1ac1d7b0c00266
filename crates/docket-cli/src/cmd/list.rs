use crate::output::{print_json, print_table};
use anyhow::Context;
use docket_core::types::{Bucket, EntityKind};
use docket_core::workspace::StoredEntity;
use std::path::Path;

pub fn run(
    root: &Path,
    kind: EntityKind,
    status: Option<&str>,
    include_archive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let status = status.map(|s| kind.parse_status(s)).transpose()?;

    let buckets: &[Bucket] = if include_archive {
        Bucket::all()
    } else {
        &[Bucket::Active]
    };
    let mut entities = Vec::new();
    for &bucket in buckets {
        entities.extend(
            ws.list_in(kind, bucket)
                .with_context(|| format!("failed to list {}", kind.plural()))?,
        );
    }
    if let Some(status) = status {
        entities.retain(|s| s.entity.status == status);
    }

    if json {
        return print_json(&entities);
    }

    if entities.is_empty() {
        println!("No {} found.", kind.plural());
        return Ok(());
    }

    let (headers, rows) = table(kind, &entities, include_archive);
    print_table(&headers, rows);
    Ok(())
}

fn table(
    kind: EntityKind,
    entities: &[StoredEntity],
    show_bucket: bool,
) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let mut headers = vec!["ID", "TITLE", "STATUS"];
    headers.push(match kind {
        EntityKind::Issue => "SEVERITY",
        _ => "PRIORITY",
    });
    match kind {
        EntityKind::Story => headers.extend(["POINTS", "PRD"]),
        EntityKind::Prd => headers.push("STORIES"),
        EntityKind::Ticket | EntityKind::Issue => headers.push("CREATED"),
    }
    if show_bucket {
        headers.push("BUCKET");
    }

    let rows = entities
        .iter()
        .map(|stored| {
            let e = &stored.entity;
            let mut row = vec![
                e.id.to_string(),
                e.title.clone(),
                e.status.to_string(),
                format!("{} {}", e.level().emoji(), e.level()),
            ];
            match kind {
                EntityKind::Story => {
                    row.push(e.story_points_label());
                    row.push(e.prd.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()));
                }
                EntityKind::Prd => row.push(e.stories.len().to_string()),
                EntityKind::Ticket | EntityKind::Issue => row.push(
                    e.created
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            }
            if show_bucket {
                row.push(stored.bucket.to_string());
            }
            row
        })
        .collect();
    (headers, rows)
}
