//! SchemaLens CLI - Database schema analysis and usage classification
//!
//! A command-line interface for inspecting relational databases: schema
//! structure, dependency graphs, quality findings, and usage classification.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a database and print the report
//! schemalens analyze app.db
//!
//! # Full result as JSON
//! schemalens analyze app.db --json
//!
//! # Usage classification only
//! schemalens usage app.db --level unused
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod progress;

/// SchemaLens - Schema analysis and usage classification
#[derive(Parser, Debug)]
#[command(name = "schemalens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// SQL dialect of the target (sqlite, sqlserver, postgres, mysql)
    #[arg(long, short = 'd', global = true, env = "SCHEMALENS_DIALECT")]
    dialect: Option<String>,

    /// Target database name (server mode when omitted and the backend
    /// supports it)
    #[arg(long, global = true, env = "SCHEMALENS_DATABASE")]
    database: Option<String>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    fn to_config_overrides(&self) -> schemalens_config::ConfigOverrides {
        schemalens_config::ConfigOverrides {
            dialect: self.dialect.clone(),
            database: self.database.clone(),
            log_level: if self.verbose {
                Some("debug".to_string())
            } else {
                None
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full analysis pipeline and print the report
    Analyze(commands::analyze::AnalyzeArgs),

    /// Classify object usage and list the results
    Usage(commands::usage::UsageArgs),
}

fn init_logging(global: &GlobalOptions, config_level: &str) {
    let level = if global.quiet {
        Level::ERROR
    } else if global.verbose {
        Level::DEBUG
    } else {
        config_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.global)?;
    init_logging(&cli.global, &config.logging.level);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, cli.global, config).await,
        Commands::Usage(args) => commands::usage::execute(args, cli.global, config).await,
    }
}
