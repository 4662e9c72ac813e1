//! Usage command - usage classification listing

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use schemalens_config::LensConfig;
use schemalens_session::{AnalyzerKind, SessionRegistry};
use schemalens_usage::UsageLevel;

use super::{connect, print_info};
use crate::GlobalOptions;

/// Arguments for the usage command
#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Connection target (for sqlite: path to the database file)
    target: String,

    /// Only list objects at this usage level
    #[arg(long, short = 'l')]
    level: Option<LevelFilter>,

    /// Show the evidence trail for each object
    #[arg(long)]
    evidence: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelFilter {
    Active,
    Low,
    Unused,
    Unknown,
}

impl From<LevelFilter> for UsageLevel {
    fn from(f: LevelFilter) -> Self {
        match f {
            LevelFilter::Active => UsageLevel::Active,
            LevelFilter::Low => UsageLevel::Low,
            LevelFilter::Unused => UsageLevel::Unused,
            LevelFilter::Unknown => UsageLevel::Unknown,
        }
    }
}

/// Execute the usage command
pub async fn execute(args: UsageArgs, global: GlobalOptions, config: LensConfig) -> Result<()> {
    let registry = SessionRegistry::new();
    let info = connect(&registry, &args.target, &config).await?;
    print_info(&format!("Connected to '{}'", info.server_name), global.quiet);

    // Schema is the precursor; usage is the only downstream stage we need.
    let result = registry
        .run_analysis(
            info.session_id,
            Some(&[AnalyzerKind::Schema, AnalyzerKind::Usage]),
            None,
        )
        .await
        .context("Usage analysis failed")?;

    let filter: Option<UsageLevel> = args.level.map(Into::into);
    for db in &result.results {
        let Some(usage) = &db.usage else { continue };

        if let Some(name) = &db.database {
            println!("=== {name} ===");
        }
        for entry in usage {
            if filter.is_some_and(|f| entry.level != f) {
                continue;
            }
            println!(
                "{:8} {:>6.1}  {}",
                entry.level.as_str(),
                entry.score,
                entry.object.canonical_key()
            );
            if args.evidence {
                for line in &entry.evidence {
                    println!("           {line}");
                }
            }
        }
    }

    registry.disconnect(info.session_id).await;
    Ok(())
}
