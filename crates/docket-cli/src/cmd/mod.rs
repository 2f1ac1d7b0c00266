pub mod create;
pub mod init;
pub mod list;
pub mod pick;
pub mod remove;
pub mod report;
pub mod show;
pub mod update;

use anyhow::Context;
use docket_core::store::FsStore;
use docket_core::workspace::Workspace;
use docket_core::DocketError;
use std::path::Path;

pub fn open(root: &Path) -> anyhow::Result<Workspace<FsStore>> {
    Workspace::open(root)
        .with_context(|| format!("failed to open project at {}", root.display()))
}

/// A missing entity is reported with the ids that do exist, and the
/// command still exits successfully.
pub fn recover_not_found(result: anyhow::Result<()>) -> anyhow::Result<()> {
    let Err(e) = result else {
        return Ok(());
    };
    match e.downcast_ref::<DocketError>() {
        Some(DocketError::NotFound { id, available }) => {
            eprintln!("error: {id} not found");
            if available.is_empty() {
                eprintln!("available: none");
            } else {
                eprintln!("available: {}", available.join(", "));
            }
            Ok(())
        }
        _ => Err(e),
    }
}
