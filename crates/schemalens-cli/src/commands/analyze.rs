//! Analyze command - full pipeline run and report

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use schemalens_config::LensConfig;
use schemalens_session::{
    AnalysisResult, AnalyzerKind, DatabaseAnalysis, SessionRegistry,
};
use schemalens_usage::UsageLevel;

use super::{connect, print_info};
use crate::progress::IndicatifSink;
use crate::GlobalOptions;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Connection target (for sqlite: path to the database file)
    target: String,

    /// Analyzers to run (schema, profile, quality, relationships, usage);
    /// repeatable, default all
    #[arg(long, short = 'a', value_name = "ANALYZER")]
    analyzer: Vec<String>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// How many top-importance objects to list
    #[arg(long, default_value = "10")]
    top: usize,
}

/// Execute the analyze command
pub async fn execute(args: AnalyzeArgs, global: GlobalOptions, config: LensConfig) -> Result<()> {
    let registry = SessionRegistry::new();
    let info = connect(&registry, &args.target, &config).await?;
    print_info(
        &format!(
            "Connected to '{}' ({})",
            info.server_name,
            if info.server_mode {
                "server mode".to_string()
            } else {
                info.database.clone().unwrap_or_default()
            }
        ),
        global.quiet,
    );

    let kinds = parse_analyzers(&args.analyzer, &config)?;

    let sink = IndicatifSink::new(global.quiet || args.json).map(Arc::new);
    let result = registry
        .run_analysis(
            info.session_id,
            kinds.as_deref(),
            sink.clone()
                .map(|s| s as Arc<dyn schemalens_session::ProgressSink>),
        )
        .await
        .context("Analysis failed")?;
    if let Some(sink) = sink {
        sink.finish();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result, &config, args.top);
    }

    registry.disconnect(info.session_id).await;
    Ok(())
}

/// Parse analyzer selections from flags, falling back to config.
fn parse_analyzers(
    flags: &[String],
    config: &LensConfig,
) -> Result<Option<Vec<AnalyzerKind>>> {
    let names: &[String] = if !flags.is_empty() {
        flags
    } else {
        &config.analysis.analyzers
    };

    if names.is_empty() {
        return Ok(None);
    }

    let kinds = names
        .iter()
        .map(|n| n.parse::<AnalyzerKind>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid analyzer name")?;
    Ok(Some(kinds))
}

fn print_report(result: &AnalysisResult, config: &LensConfig, top: usize) {
    println!("Server:    {} ({})", result.server_name, result.dialect);
    println!(
        "Databases: {} analyzed, {} failed",
        result.databases.len(),
        result.failed_databases.len()
    );
    for failure in &result.failed_databases {
        println!("  ! {}: {}", failure.database, failure.error);
    }

    for db in &result.results {
        print_database(db, config, top);
    }
}

fn print_database(db: &DatabaseAnalysis, config: &LensConfig, top: usize) {
    let name = db.database.as_deref().unwrap_or("(default)");
    println!("\n=== {name} ===");
    println!(
        "{} tables, {} other objects",
        db.schema.tables().len(),
        db.schema.objects().len()
    );

    if let Some(relationships) = &db.relationships {
        let graph = &relationships.graph;
        println!(
            "\nDependency graph: {} connected objects, {} standalone",
            graph.dependencies.len(),
            graph.standalone.len()
        );

        if !graph.cycles.is_empty() {
            println!("Cycles:");
            for cycle in &graph.cycles {
                println!("  {}", cycle.join(" -> "));
            }
        }

        println!("Most important objects:");
        for dep in graph.dependencies.iter().take(top) {
            println!(
                "  {:>4}  {}  (referenced by {}, impacts {})",
                dep.importance_score,
                dep.object.canonical_key(),
                dep.referenced_by.len(),
                dep.transitive_impact.len()
            );
        }

        let shown: Vec<_> = relationships
            .implicit
            .iter()
            .filter(|c| c.confidence >= config.inference.min_confidence)
            .take(if config.inference.max_candidates == 0 {
                usize::MAX
            } else {
                config.inference.max_candidates
            })
            .collect();
        if !shown.is_empty() {
            println!("\nUndeclared relationship candidates:");
            for candidate in shown {
                println!(
                    "  {:.0}%  {}.{} -> {}.{}",
                    candidate.confidence * 100.0,
                    candidate.from_table.name,
                    candidate.from_column,
                    candidate.to_table.name,
                    candidate.to_column
                );
                println!("        {}", candidate.suggested_constraint);
            }
        }
    }

    if let Some(quality) = &db.quality {
        if !quality.is_empty() {
            println!("\nQuality findings:");
            for finding in quality {
                println!(
                    "  [{:?}] {}: {}",
                    finding.severity,
                    finding.object.canonical_key(),
                    finding.message
                );
            }
        }
    }

    if let Some(usage) = &db.usage {
        let count = |level: UsageLevel| usage.iter().filter(|u| u.level == level).count();
        println!(
            "\nUsage: {} active, {} low, {} unused, {} unknown",
            count(UsageLevel::Active),
            count(UsageLevel::Low),
            count(UsageLevel::Unused),
            count(UsageLevel::Unknown)
        );
    }
}
