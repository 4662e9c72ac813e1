//! Session error types.

use schemalens_provider::ProviderError;
use schemalens_usage::SignalError;
use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Cancellation is a distinct outcome, not a failure; signal-level and
/// per-database failures never appear here; they are recorded as data in
/// the analysis result instead.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Could not reach or authenticate to the backend
    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    /// Operation against a missing or expired session
    #[error("unknown session '{0}'")]
    UnknownSession(String),

    /// Downstream analyzer requested before a schema snapshot exists
    #[error("no schema snapshot cached; run the schema analyzer first")]
    PrecursorMissing,

    /// A second run was requested while one is in flight
    #[error("an analysis is already in progress for this session")]
    AnalysisInProgress,

    /// The run observed a cancellation request
    #[error("analysis cancelled")]
    Cancelled,

    /// Analyzer name not recognized
    #[error("unknown analyzer '{0}'")]
    UnknownAnalyzer(String),

    /// Requested database is not part of this session's result
    #[error("database '{0}' not present in this session")]
    UnknownDatabase(String),

    /// Underlying provider failure
    #[error("provider error: {0}")]
    Provider(ProviderError),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl SessionError {
    /// Add context to any error.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }
}

// Provider cancellation becomes the session-level Cancelled outcome; every
// other provider error keeps its identity.
impl From<ProviderError> for SessionError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Cancelled => SessionError::Cancelled,
            other => SessionError::Provider(other),
        }
    }
}

impl From<SignalError> for SessionError {
    fn from(e: SignalError) -> Self {
        match e {
            SignalError::Provider(p) => p.into(),
            other => SessionError::with_context("signal evaluation", other.to_string()),
        }
    }
}
