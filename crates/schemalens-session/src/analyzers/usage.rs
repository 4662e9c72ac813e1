//! Usage analyzer stage.
//!
//! Bridges the orchestrator to the signal aggregation engine: collects the
//! dependency fact set, fetches server uptime once, and hands both to the
//! signal evaluators. An unavailable uptime only mutes the uptime-gated
//! signals, never the stage.

use async_trait::async_trait;
use schemalens_provider::ServerQueries;
use schemalens_usage::{SignalContext, UsageAnalyzer};
use tracing::warn;

use crate::analyzers::{collect_dependency_edges, Analyzer, AnalyzerContext, AnalyzerKind};
use crate::error::SessionError;
use crate::result::AnalyzerSlice;

/// Usage classification stage.
pub struct UsageAnalyzerStage;

#[async_trait]
impl Analyzer for UsageAnalyzerStage {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Usage
    }

    async fn run(&self, ctx: &AnalyzerContext<'_>) -> Result<AnalyzerSlice, SessionError> {
        let edges = collect_dependency_edges(ctx).await?;
        ctx.cancel.check()?;

        let uptime_secs = match ctx.provider.server_info().await {
            Ok(info) => info.uptime_secs,
            Err(e) if e.is_degradable() => {
                warn!("server uptime unavailable, uptime-gated signals stay silent: {e}");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let signal_ctx = SignalContext {
            schema: ctx.schema,
            provider: ctx.provider,
            edges: &edges,
            uptime_secs,
            cancel: ctx.cancel,
        };

        let usages = UsageAnalyzer::new().analyze(&signal_ctx).await?;
        Ok(AnalyzerSlice::Usage(usages))
    }
}
