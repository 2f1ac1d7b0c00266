use crate::output::print_json;
use docket_core::id::EntityId;
use docket_core::types::EntityKind;
use docket_core::workspace::PickOutcome;
use std::path::Path;

pub fn run(root: &Path, kind: EntityKind, id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let id = id.map(|s| EntityId::parse_for(kind, s)).transpose()?;

    match ws.pick(kind, id)? {
        PickOutcome::Picked(stored) => {
            if json {
                print_json(&serde_json::json!({ "picked": true, "entity": stored }))?;
            } else {
                println!(
                    "Picked {}: {} (now {})",
                    stored.entity.id, stored.entity.title, stored.entity.status
                );
            }
        }
        PickOutcome::Blocked { entity, reason } => {
            // A refused pick is a no-op, not a failure.
            eprintln!("warning: {} not picked: {reason}", entity.entity.id);
            if json {
                print_json(&serde_json::json!({
                    "picked": false,
                    "id": entity.entity.id,
                    "reason": reason,
                }))?;
            }
        }
        PickOutcome::NothingAvailable => {
            if json {
                print_json(&serde_json::json!({ "picked": false, "reason": "nothing available" }))?;
            } else {
                println!("No Not Started {} to pick.", kind.plural());
            }
        }
    }
    Ok(())
}
