use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tdl_core::{
    config::Config,
    trace::{trace_references, Hit, TraceOptions},
};

/// Lines shown per section in verbose mode before eliding.
const VERBOSE_LIMIT: usize = 10;

pub fn run(
    root: &Path,
    query: &str,
    search_term: bool,
    verbose: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let opts = TraceOptions {
        search_term,
        git: true,
        docs_dir: config.docs_dir,
    };
    let result = trace_references(root, query, &opts)
        .with_context(|| format!("failed to trace '{query}'"))?;

    if json {
        return print_json(&result);
    }

    println!("Tracing: {query}\n");
    if verbose {
        print_hits("Documentation references", &result.documentation, None);
        print_hits("Source code references", &result.source, Some(VERBOSE_LIMIT));
        print_hits("Test references", &result.tests, Some(VERBOSE_LIMIT));
        println!("Git commits:");
        if !result.git_available {
            println!("  (git not found on PATH)");
        } else if result.commits.is_empty() {
            println!("  none");
        }
        for c in result.commits.iter().take(VERBOSE_LIMIT) {
            println!("  {c}");
        }
        if result.commits.len() > VERBOSE_LIMIT {
            println!("  ... and {} more", result.commits.len() - VERBOSE_LIMIT);
        }
        println!();
    }

    print_table(
        &["SOURCE", "REFERENCES"],
        vec![
            vec!["documentation".into(), result.documentation.len().to_string()],
            vec!["source code".into(), result.source.len().to_string()],
            vec!["tests".into(), result.tests.len().to_string()],
            vec!["git commits".into(), result.commits.len().to_string()],
        ],
    );
    println!("\nTotal references: {}", result.total());
    Ok(())
}

fn print_hits(title: &str, hits: &[Hit], limit: Option<usize>) {
    println!("{title}:");
    if hits.is_empty() {
        println!("  none\n");
        return;
    }
    let shown = limit.unwrap_or(hits.len()).min(hits.len());
    for hit in &hits[..shown] {
        println!("  {hit}");
    }
    if hits.len() > shown {
        println!("  ... and {} more", hits.len() - shown);
    }
    println!();
}
