use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use tdl_core::{
    config::Config,
    create::{create_document, parse_requirement_ids, Created, NewDocument},
    types::{DocType, Prefix},
};

#[derive(Subcommand)]
pub enum NewSubcommand {
    /// Create an analysis (AN-xxxxx)
    Analysis {
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Create a functional or non-functional requirement (FR-/NFR-xxxxx)
    Requirement {
        #[arg(required = true)]
        title: Vec<String>,
        /// Requirement kind: fr or nfr
        #[arg(long, short = 'k', default_value = "fr")]
        kind: String,
        /// Category, e.g. Performance, Security
        #[arg(long, short = 'c', default_value = "General")]
        category: String,
    },
    /// Create an architecture decision record (ADR-xxxxx)
    Adr {
        #[arg(required = true)]
        title: Vec<String>,
        /// Use the short template for tactical decisions
        #[arg(long, short = 'l')]
        lite: bool,
    },
    /// Create a task directory with design.md and plan.md (T-xxxxx)
    Task {
        /// Topic, e.g. implement-user-auth
        #[arg(required = true)]
        topic: Vec<String>,
        /// Comma-separated requirement ids, e.g. FR-a1b2c,NFR-d3e4f
        #[arg(long, short = 'r')]
        requirements: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: NewSubcommand, json: bool) -> anyhow::Result<()> {
    let new = match subcmd {
        NewSubcommand::Analysis { title } => NewDocument::Analysis {
            title: title.join(" "),
        },
        NewSubcommand::Requirement {
            title,
            kind,
            category,
        } => {
            let prefix: Prefix = kind.parse()?;
            if prefix.doc_type() != DocType::Requirement {
                anyhow::bail!("invalid requirement kind '{kind}': expected fr or nfr");
            }
            NewDocument::Requirement {
                title: title.join(" "),
                prefix,
                category,
            }
        }
        NewSubcommand::Adr { title, lite } => NewDocument::Adr {
            title: title.join(" "),
            lite,
        },
        NewSubcommand::Task {
            topic,
            requirements,
        } => NewDocument::Task {
            topic: topic.join(" "),
            requirements: requirements
                .as_deref()
                .map(parse_requirement_ids)
                .transpose()
                .context("invalid --requirements")?
                .unwrap_or_default(),
        },
    };

    let config = Config::load(root).context("failed to load config")?;
    let docs = config.docs_path(root);
    let created = create_document(&docs, &new)
        .with_context(|| format!("failed to create {}", new.prefix().type_name()))?;

    if json {
        print_json(&created)?;
    } else {
        print_created(root, &created);
    }
    Ok(())
}

fn print_created(root: &Path, created: &Created) {
    let show = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();
    println!("Created {}: {}", created.type_name, show(created.path.as_path()));
    println!("ID: {}", created.id);
    if created.doc_type == DocType::Task {
        for f in &created.files {
            println!("  - {}", show(f.as_path()));
        }
    }
    println!("\nNext: fill in the template and update its Links section.");
}
