use crate::output::print_json;
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;
use tdl_core::{config::Config, ident};

pub fn run(root: &Path, prefix: Option<&str>, no_check: bool, json: bool) -> anyhow::Result<()> {
    let existing = if no_check {
        HashSet::new()
    } else {
        let config = Config::load(root).context("failed to load config")?;
        let docs = config.docs_path(root);
        ident::existing_payloads(&docs)
            .with_context(|| format!("failed to index ids under {}", docs.display()))?
    };

    let id = ident::generate_id(prefix, &existing)?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "checked_against": existing.len(),
        }))?;
    } else {
        println!("{id}");
    }
    Ok(())
}
