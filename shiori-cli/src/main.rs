//! Shiori CLI - track reading progress across serialized works

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shiori")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file
    #[arg(short, long, default_value = "shiori.json", global = true)]
    settings: PathBuf,

    /// Library file to use instead of the configured one
    #[arg(long, global = true)]
    manga_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a title
    Add {
        /// Title name
        name: String,
    },

    /// Check all sources for unseen chapters
    Check {
        /// Source fetch parallelism: 0 is one task per source, 1 sequential
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Mark detected updates as read
    Read {
        /// Only titles starting with this prefix (case-insensitive)
        prefix: Option<String>,

        /// Source fetch parallelism: 0 is one task per source, 1 sequential
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Reconcile the library file with the database
    Sync,

    /// Create the database schema and register the reader
    Setup {
        /// Reader first name, used when bootstrapping a new library
        #[arg(long)]
        firstname: Option<String>,

        /// Reader last name, used when bootstrapping a new library
        #[arg(long)]
        lastname: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "shiori_cli=debug,shiori_core=debug,shiori_store=debug,shiori_sources=debug"
    } else {
        "shiori_cli=info,shiori_core=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::Settings::load(&cli.settings)?;
    let manga_file = cli.manga_file.as_deref();

    match cli.command {
        Commands::Add { name } => commands::add(&settings, manga_file, &name),

        Commands::Check { jobs } => commands::check(&settings, manga_file, jobs).await,

        Commands::Read { prefix, jobs } => {
            commands::read(&settings, manga_file, prefix.as_deref(), jobs).await
        }

        Commands::Sync => commands::sync(&settings, manga_file),

        Commands::Setup {
            firstname,
            lastname,
        } => commands::setup(
            &settings,
            manga_file,
            firstname.as_deref(),
            lastname.as_deref(),
        ),
    }
}
