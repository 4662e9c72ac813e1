//! Signal error types.

use schemalens_provider::ProviderError;
use thiserror::Error;

/// Errors from one signal evaluator.
///
/// The aggregator catches these per evaluator: cancellation propagates,
/// everything else degrades to "no evidence from this source".
#[derive(Error, Debug)]
pub enum SignalError {
    /// Underlying provider call failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl SignalError {
    /// Add context to any error.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether this is a cancellation observation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::Cancelled))
    }
}
