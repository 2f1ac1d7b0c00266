use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let report = ws
        .init()
        .with_context(|| format!("failed to initialize {}", root.display()))?;

    if json {
        return print_json(&report);
    }

    println!("Initialized docket project at {}", root.display());
    if report.templates_written.is_empty() {
        println!("  templates: all present, none written");
    } else {
        println!("  templates: {}", report.templates_written.join(", "));
    }
    if report.config_written {
        println!("  wrote docket.yaml");
    }
    Ok(())
}
