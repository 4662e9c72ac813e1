//! SchemaLens Session - Analysis orchestration
//!
//! This crate owns session lifecycle and pipeline scheduling:
//! - [`SessionRegistry`]: connect / run / query / disconnect, the surface a
//!   transport layer exposes remotely
//! - [`AnalysisSession`]: per-session state with a single-flight run guard
//! - The analyzer pipeline: schema extraction first, then the mutually
//!   independent downstream analyzers concurrently; per-database isolation
//!   in server mode
//! - [`ProgressSink`]: injected progress events; runs behave identically
//!   with no sink attached
//!
//! ## Example
//!
//! ```ignore
//! use schemalens_session::SessionRegistry;
//! use schemalens_provider::Dialect;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SessionRegistry::new();
//!     let info = registry.connect("app.db", Dialect::Sqlite).await?;
//!     let result = registry.run_analysis(info.session_id, None, None).await?;
//!     println!("{} databases analyzed", result.databases.len());
//!     registry.disconnect(info.session_id).await;
//!     Ok(())
//! }
//! ```

pub mod analyzers;
mod error;
mod orchestrator;
mod progress;
mod registry;
mod result;
mod session;

pub use analyzers::{Analyzer, AnalyzerContext, AnalyzerKind};
pub use error::SessionError;
pub use progress::{ChannelSink, NullSink, ProgressEvent, ProgressSink};
pub use registry::{ConnectInfo, SessionRegistry};
pub use result::{
    AnalysisResult, AnalyzerSlice, DatabaseAnalysis, DatabaseFailure, ProfileEntry,
    QualityFinding, RelationshipAnalysis, Severity,
};
pub use session::{AnalysisSession, AnalyzerStatus, SessionId, SessionState};

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
