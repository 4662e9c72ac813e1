//! SchemaLens Provider - Dialect abstraction layer
//!
//! This crate provides a unified interface for talking to one database
//! engine:
//! - [`DialectProvider`]: query execution plus the three capability
//!   interfaces ([`CatalogQueries`], [`PerformanceQueries`], [`ServerQueries`])
//! - [`SqliteProvider`]: a concrete dialect over `rusqlite`
//! - [`MockProvider`]: scriptable in-memory provider for tests
//! - [`extract_schema`]: catalog rows → validated [`DatabaseSchema`] snapshot
//!
//! Capability calls may fail with [`ProviderError::PrivilegeDenied`] or
//! [`ProviderError::FeatureUnavailable`]; callers must treat those as
//! *signal unavailable*, never as fatal to an analysis run. Every call is
//! independently read-only and idempotent; there is no ambient transaction.
//!
//! ## Example
//!
//! ```ignore
//! use schemalens_provider::{extract_schema, CancellationToken, SqliteProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = SqliteProvider::open("app.db")?;
//!     let schema = extract_schema(&provider, &CancellationToken::new(), false).await?;
//!     println!("{} tables", schema.tables().len());
//!     Ok(())
//! }
//! ```

mod cancel;
mod error;
mod extract;
mod mock;
mod sqlite;
mod traits;
mod types;

use schemalens_core::DatabaseSchema;

pub use cancel::CancellationToken;
pub use error::ProviderError;
pub use extract::{extract_schema, reference_edges};
pub use mock::{MockCapability, MockData, MockProvider};
pub use sqlite::SqliteProvider;
pub use traits::{CatalogQueries, DialectProvider, PerformanceQueries, ServerQueries};
pub use types::*;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Re-exported for downstream convenience: extraction produces this.
pub type Schema = DatabaseSchema;
