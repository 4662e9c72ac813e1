//! SchemaLens Usage - Usage signal evaluation and aggregation
//!
//! Combines multiple independent, imperfect evidence sources into one usage
//! classification per schema object:
//! - [`UsageSignal`]: one evidence source (execution counters, persisted
//!   query telemetry, structural heuristics)
//! - [`UsageAnalyzer`]: runs every registered signal concurrently and folds
//!   the weighted evidence into [`ObjectUsage`] classifications
//!
//! A signal that finds no applicable evidence contributes nothing (not a
//! zero), and a signal whose source is denied or absent degrades silently.
//! An object no signal fired for is [`UsageLevel::Unknown`]: insufficient
//! evidence, which is not the same as a neutral score.

mod aggregate;
mod error;
pub mod policy;
mod signal;
pub mod signals;

pub use aggregate::UsageAnalyzer;
pub use error::SignalError;
pub use signal::{ObjectUsage, SignalContext, SignalResult, UsageLevel, UsageSignal};
