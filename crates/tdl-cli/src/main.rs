mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, new::NewSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tdl",
    about = "Traceable Development Lifecycle: mint document ids and check docs/ traceability",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .tdl/, docs/ or .git/)
    #[arg(long, global = true, env = "TDL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the docs/ tree, READMEs, templates and .tdl/config.yaml
    Init,

    /// Print a fresh document id
    #[command(alias = "generate-id")]
    Id {
        /// Id prefix (AN, FR, NFR, ADR, T or any other letters)
        #[arg(long, short = 'p')]
        prefix: Option<String>,

        /// Skip the check against ids already under docs/
        #[arg(long)]
        no_check: bool,
    },

    /// Create a new document from its template
    New {
        #[command(subcommand)]
        subcommand: NewSubcommand,
    },

    /// Check links between documents and report gaps
    Scan {
        /// List every finding and document
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Exit 1 when broken links or orphans exist
        #[arg(long)]
        check: bool,

        /// With --check, also fail on structural and link defects
        #[arg(long, requires = "check")]
        strict: bool,

        /// Report format: text or markdown
        #[arg(long, short = 'f', default_value = "text")]
        format: String,
    },

    /// Find references to an id across docs, code, tests and git history
    Trace {
        /// TDL id (e.g. FR-a3bf2) or, with --search-term, free text
        query: String,

        /// Treat the query as a literal search term
        #[arg(long, short = 's')]
        search_term: bool,

        /// Show every matching line
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Inspect and validate .tdl/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Id { prefix, no_check } => {
            cmd::id::run(&root, prefix.as_deref(), no_check, cli.json)
        }
        Commands::New { subcommand } => cmd::new::run(&root, subcommand, cli.json),
        Commands::Scan {
            verbose,
            check,
            strict,
            format,
        } => cmd::scan::run(
            &root,
            cmd::scan::ScanArgs {
                verbose,
                check,
                strict,
                format,
            },
            cli.json,
        ),
        Commands::Trace {
            query,
            search_term,
            verbose,
        } => cmd::trace::run(&root, &query, search_term, verbose, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
