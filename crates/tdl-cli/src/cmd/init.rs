use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tdl_core::init::{init_docs, InitAction};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let entries = init_docs(root)
        .with_context(|| format!("failed to initialize TDL docs in {}", root.display()))?;

    if json {
        return print_json(&entries);
    }

    println!("Initializing TDL docs in: {}", root.display());
    for e in &entries {
        let label = match e.action {
            InitAction::Created => "created:",
            InitAction::Exists => "exists: ",
        };
        println!("  {label} {}", e.path.display());
    }

    println!("\nNext steps:");
    println!("  tdl new analysis \"Topic\"");
    println!("  tdl new requirement \"Title\" [--kind nfr]");
    println!("  tdl new adr \"Decision\" [--lite]");
    println!("  tdl new task topic-name --requirements FR-xxxxx");
    println!("  tdl scan");
    Ok(())
}
