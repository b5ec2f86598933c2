use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// picopip - resolve Python wheel requirements and install them
#[derive(Parser)]
#[command(name = "picopip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve requirements and install the wheels
    Install {
        /// Requirements (e.g. "pytest>=7.0", "pkg[extra]", or a wheel URL)
        requirements: Vec<String>,

        /// Allow pre-release versions
        #[arg(long)]
        pre: bool,

        /// Do not follow dependencies
        #[arg(long)]
        no_deps: bool,

        /// Report all failing requirements instead of stopping at the first
        #[arg(long)]
        keep_going: bool,

        /// Index base URL (defaults to the configured index)
        #[arg(long)]
        index_url: Option<String>,

        /// Directory to install into
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// List installed packages
    List {
        /// Directory to inspect
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Print a JSON snapshot of the installed packages
    Freeze {
        /// Directory to inspect
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "picopip=info",
        _ => "picopip=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Install {
            requirements,
            pre,
            no_deps,
            keep_going,
            index_url,
            target,
        } => commands::install::run(requirements, pre, no_deps, keep_going, index_url, target),
        Commands::List { target } => commands::list::run(target),
        Commands::Freeze { target } => commands::freeze::run(target),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
