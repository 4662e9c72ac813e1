//! Provider error types.

use thiserror::Error;

/// Errors that can occur while talking to a database backend.
///
/// The degradable variants ([`ProviderError::PrivilegeDenied`] and
/// [`ProviderError::FeatureUnavailable`]) mean one evidence source is
/// absent, not that the run failed; callers check [`ProviderError::is_degradable`]
/// and downgrade instead of propagating.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The login lacks the privilege for a catalog or telemetry query
    #[error("privilege denied for {operation}")]
    PrivilegeDenied { operation: String },

    /// The engine or engine version does not expose this feature
    #[error("feature unavailable: {feature}")]
    FeatureUnavailable { feature: String },

    /// Could not reach or authenticate to the backend
    #[error("connection failed: {0}")]
    Connection(String),

    /// A query failed at the engine
    #[error("query failed: {message}")]
    Query { message: String },

    /// Dialect not supported by this build
    #[error("unsupported dialect '{0}'")]
    UnsupportedDialect(String),

    /// The operation observed a cancellation request
    #[error("operation cancelled")]
    Cancelled,

    /// SQLite driver error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl ProviderError {
    /// Create a PrivilegeDenied error.
    pub fn privilege_denied(operation: impl Into<String>) -> Self {
        Self::PrivilegeDenied {
            operation: operation.into(),
        }
    }

    /// Create a FeatureUnavailable error.
    pub fn feature_unavailable(feature: impl Into<String>) -> Self {
        Self::FeatureUnavailable {
            feature: feature.into(),
        }
    }

    /// Create a Connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a Query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Add context to any error.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "evidence source absent" rather than
    /// "operation failed".
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::PrivilegeDenied { .. } | Self::FeatureUnavailable { .. }
        )
    }
}
