//! SchemaLens Core - Schema model and dependency graph engine
//!
//! This crate provides:
//! - The dialect-neutral schema model ([`DatabaseSchema`], [`Table`], [`ObjectRef`])
//! - Dependency edge facts ([`ObjectDependency`])
//! - The dependency graph engine ([`DependencyGraph`]): cycle detection,
//!   transitive impact, importance ranking
//! - Implicit relationship inference ([`infer_implicit_relationships`])
//!
//! Everything here is pure and CPU-bound. Fetching catalog metadata and
//! telemetry lives in `schemalens-provider`; orchestration lives in
//! `schemalens-session`.

mod dependency;
mod graph;
mod implicit;
pub mod policy;
mod schema;

pub use dependency::{DetectedVia, ObjectDependency};
pub use graph::{DependencyAnalysis, DependencyGraph, TableDependency};
pub use implicit::{infer_implicit_relationships, ImplicitRelationship};
pub use schema::{
    Column, DatabaseSchema, ForeignKey, Index, ObjectKind, ObjectRef, SchemaError, SchemaObject,
    Table, TypeFamily,
};
