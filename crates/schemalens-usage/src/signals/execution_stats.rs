//! Execution-telemetry signal.
//!
//! Reads live execution counters for procedures and functions. Recorded
//! executions are strong positive evidence; the absence of any execution is
//! strong negative evidence only once the engine has been up long enough,
//! otherwise the signal stays silent for that object.

use std::collections::HashMap;

use async_trait::async_trait;
use schemalens_core::ObjectKind;
use schemalens_provider::PerformanceQueries;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Live execution counter evaluator.
pub struct ExecutionStatsSignal;

#[async_trait]
impl UsageSignal for ExecutionStatsSignal {
    fn name(&self) -> &'static str {
        "execution-stats"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;
        let stats = ctx.provider.execution_stats().await?;

        let counts: HashMap<(String, String), i64> = stats
            .into_iter()
            .map(|s| {
                (
                    (s.schema.to_ascii_lowercase(), s.name.to_ascii_lowercase()),
                    s.execution_count,
                )
            })
            .collect();

        let uptime_qualifies = ctx
            .uptime_secs
            .is_some_and(|u| u >= policy::MIN_UPTIME_FOR_NEVER_EXECUTED_SECS);

        let mut results = Vec::new();
        for object in ctx.schema.objects() {
            let reference = &object.reference;
            if !matches!(reference.kind, ObjectKind::Procedure | ObjectKind::Function) {
                continue;
            }

            let key = (
                reference.schema.to_ascii_lowercase(),
                reference.name.to_ascii_lowercase(),
            );
            match counts.get(&key).copied().unwrap_or(0) {
                n if n > 0 => results.push(SignalResult::new(
                    reference.clone(),
                    policy::WEIGHT_EXECUTED,
                    format!("{n} executions recorded since engine start"),
                )),
                _ if uptime_qualifies => results.push(SignalResult::new(
                    reference.clone(),
                    policy::WEIGHT_NEVER_EXECUTED,
                    "no executions recorded despite sufficient engine uptime",
                )),
                // Too little uptime for absence to mean anything: no signal.
                _ => {}
            }
        }

        Ok(results)
    }
}
