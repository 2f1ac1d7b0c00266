use crate::output::print_json;
use anyhow::Context;
use docket_core::id::EntityId;
use docket_core::types::EntityKind;
use docket_core::workspace::ClearTarget;
use std::io::Write;
use std::path::Path;

pub fn clear_tickets(
    root: &Path,
    target: &str,
    yes: bool,
    archive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let target = if target.eq_ignore_ascii_case("all") {
        ClearTarget::All
    } else {
        ClearTarget::One(EntityId::parse_for(EntityKind::Ticket, target)?)
    };

    if !yes {
        let what = match target {
            ClearTarget::All => "ALL active tickets".to_string(),
            ClearTarget::One(id) => id.to_string(),
        };
        let suffix = if archive {
            " (a copy is kept in tickets/archive)"
        } else {
            " permanently"
        };
        if !confirm(&format!("Delete {what}{suffix}?"))? {
            println!("Aborted; nothing deleted.");
            return Ok(());
        }
    }

    let cleared = ws
        .clear_tickets(target, archive)
        .context("failed to clear tickets")?;

    if json {
        return print_json(&serde_json::json!({ "cleared": cleared, "archived": archive }));
    }
    if cleared.is_empty() {
        println!("No tickets to clear.");
    } else {
        let ids: Vec<String> = cleared.iter().map(|id| id.to_string()).collect();
        println!("Cleared {}", ids.join(", "));
    }
    Ok(())
}

pub fn archive_prd(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let id = EntityId::parse_for(EntityKind::Prd, id)?;
    let archived = ws
        .archive_prd(id)
        .with_context(|| format!("failed to archive {id}"))?;

    if json {
        return print_json(&archived);
    }
    println!("Archived {} ({})", archived.entity.id, archived.path.display());
    Ok(())
}

/// Ask on stderr, read the answer from stdin. Anything but y/yes is a no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("failed to read confirmation from stdin")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
