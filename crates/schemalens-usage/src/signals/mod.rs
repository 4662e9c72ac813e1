//! Signal evaluator implementations.
//!
//! Each evaluator is one independent evidence source. Telemetry-backed
//! evaluators degrade when their source is denied or absent; the structural
//! ones (row count, dependency orphan, naming pattern) are always available.

mod access_stats;
mod dependency;
mod execution_stats;
mod naming;
mod query_store;
mod row_count;

pub use access_stats::AccessStatsSignal;
pub use dependency::DependencyOrphanSignal;
pub use execution_stats::ExecutionStatsSignal;
pub use naming::NamingPatternSignal;
pub use query_store::QueryStoreSignal;
pub use row_count::RowCountSignal;
