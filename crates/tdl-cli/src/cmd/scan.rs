use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tdl_core::{
    config::Config,
    corpus,
    report::Format,
    scan::{scan, Report},
};

pub struct ScanArgs {
    pub verbose: bool,
    pub check: bool,
    pub strict: bool,
    pub format: String,
}

pub fn run(root: &Path, args: ScanArgs, json: bool) -> anyhow::Result<()> {
    let format: Format = args.format.parse()?;
    let config = Config::load(root).context("failed to load config")?;
    let docs_dir = config.docs_path(root);

    let mut documents = corpus::load_documents(&docs_dir)
        .with_context(|| format!("failed to read documents under {}", docs_dir.display()))?;
    corpus::relativize(&mut documents, root);
    let report = scan(&documents, &config.trace);
    tracing::debug!(
        total = report.total,
        broken = report.broken_links.len(),
        orphans = report.orphans.len(),
        "scan complete"
    );

    if json {
        print_json(&report)?;
    } else if report.is_empty() {
        println!("No TDL documents found under {}", display_rel(root, &docs_dir));
    } else {
        print!("{}", report.render(format, args.verbose));
    }

    if args.check {
        enforce(&report, args.strict)?;
    }
    Ok(())
}

fn enforce(report: &Report, strict: bool) -> anyhow::Result<()> {
    if report.has_gaps {
        anyhow::bail!(
            "traceability gaps detected: {} broken link(s), {} orphan(s)",
            report.broken_links.len(),
            report.orphans.len()
        );
    }
    if strict && report.has_defects() {
        anyhow::bail!(
            "document defects detected: {} structural, {} link",
            report.structural_defects.len(),
            report.link_defects.len()
        );
    }
    Ok(())
}

fn display_rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
