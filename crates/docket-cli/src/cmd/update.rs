use crate::output::print_json;
use anyhow::Context;
use docket_core::id::EntityId;
use docket_core::types::EntityKind;
use docket_core::workspace::TicketUpdate;
use std::path::Path;

pub struct TicketArgs {
    pub status: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub newid: Option<String>,
}

pub fn ticket(root: &Path, id: &str, args: TicketArgs, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let id = EntityId::parse_for(EntityKind::Ticket, id)?;
    let update = TicketUpdate {
        status: args
            .status
            .as_deref()
            .map(|s| EntityKind::Ticket.parse_status(s))
            .transpose()?,
        title: args.name,
        description: args.description,
        new_id: args
            .newid
            .as_deref()
            .map(|s| EntityId::parse_for(EntityKind::Ticket, s))
            .transpose()?,
    };
    if update.is_empty() {
        eprintln!("nothing to update for {id}");
        eprintln!(
            "Usage: docket update-ticket --id=<id> [--status=<status>] [--name=<title>] \
             [--description=<text>] [--newid=<id>]"
        );
        return Ok(());
    }

    let updated = ws
        .update_ticket(id, update)
        .with_context(|| format!("failed to update {id}"))?;

    if json {
        return print_json(&updated);
    }
    if updated.entity.id != id {
        println!("Renumbered {id} to {}", updated.entity.id);
    }
    println!(
        "Updated {}: {} [{}] ({})",
        updated.entity.id,
        updated.entity.title,
        updated.entity.status,
        updated.path.display()
    );
    Ok(())
}

pub fn set_status(root: &Path, id: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let id = EntityId::parse(id)?;
    let status = id.kind.parse_status(status)?;

    let change = ws
        .set_status(id, status)
        .with_context(|| format!("failed to set status of {id}"))?;

    if json {
        return print_json(&change);
    }
    println!("{id}: {} -> {}", change.from, change.updated.entity.status);
    Ok(())
}
