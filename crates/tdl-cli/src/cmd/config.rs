use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use tdl_core::config::{Config, Direction, WarnLevel};
use tdl_core::paths;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (defaults applied)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    let source = if paths::config_path(root).exists() {
        paths::CONFIG_FILE
    } else {
        "defaults (no config file)"
    };
    println!("Config:   {source}");
    println!("Docs dir: {}", config.docs_dir);

    println!("\nExpectations:");
    let rows = config
        .trace
        .expectations
        .iter()
        .map(|e| {
            vec![
                e.subject.to_string(),
                match e.direction {
                    Direction::Inbound => "inbound".to_string(),
                    Direction::Outbound => "outbound".to_string(),
                },
                e.peers
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                if e.categories.is_empty() {
                    "any".to_string()
                } else {
                    e.categories.join(", ")
                },
            ]
        })
        .collect();
    print_table(&["SUBJECT", "DIRECTION", "PEERS", "CATEGORIES"], rows);

    println!("\nRequired links:");
    let rows = config
        .trace
        .required_links
        .iter()
        .map(|(t, cats)| vec![t.to_string(), cats.join(", ")])
        .collect();
    print_table(&["TYPE", "CATEGORIES"], rows);

    if !config.trace.external_prefixes.is_empty() {
        println!(
            "\nExternal prefixes: {}",
            config.trace.external_prefixes.join(", ")
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
