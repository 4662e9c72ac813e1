//! Naming-pattern signal.
//!
//! Flags names carrying scratch-object tokens (`tmp`, `bak`, `backup`,
//! `deprecated`, ...). Pure and always available; the token lists live in
//! [`crate::policy`].

use async_trait::async_trait;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Suspicious-name evaluator.
pub struct NamingPatternSignal;

#[async_trait]
impl UsageSignal for NamingPatternSignal {
    fn name(&self) -> &'static str {
        "naming-pattern"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;

        let mut results = Vec::new();
        for reference in ctx.schema.all_refs() {
            let lower = reference.name.to_ascii_lowercase();

            let token = policy::SUSPICIOUS_PREFIXES
                .iter()
                .find(|p| lower.starts_with(**p))
                .or_else(|| {
                    policy::SUSPICIOUS_SUBSTRINGS
                        .iter()
                        .find(|s| lower.contains(**s))
                });

            if let Some(token) = token {
                results.push(SignalResult::new(
                    reference,
                    policy::WEIGHT_SUSPICIOUS_NAME,
                    format!("name matches suspicious token '{token}'"),
                ));
            }
        }

        Ok(results)
    }
}
