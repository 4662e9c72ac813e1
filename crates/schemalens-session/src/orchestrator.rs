//! Analysis pipeline orchestration.
//!
//! Schema extraction is the precursor stage and always completes first;
//! the remaining analyzers are mutually independent and run concurrently.
//! In server mode the per-database pipelines are isolated: one database's
//! failure is recorded and never aborts its siblings. Cancellation is the
//! exception: it aborts the whole run, and the session's cached result is
//! left exactly as it was.

use std::sync::Arc;

use futures::future::join_all;
use schemalens_core::{DatabaseSchema, ObjectRef};
use schemalens_provider::{
    extract_schema, CancellationToken, DialectProvider, ProviderError, ServerQueries,
};
use tracing::{debug, info, warn};

use crate::analyzers::{downstream_analyzers, Analyzer, AnalyzerContext, AnalyzerKind};
use crate::error::SessionError;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::result::{AnalysisResult, AnalyzerSlice, DatabaseAnalysis, DatabaseFailure};
use crate::session::{AnalysisSession, AnalyzerStatus};

/// One database's extraction output, input to the downstream phase.
struct ExtractedDb {
    /// Progress label and failure key
    label: String,
    /// Database name recorded in the result entry
    database: Option<String>,
    provider: Arc<dyn DialectProvider>,
    schema: DatabaseSchema,
}

/// Run the full pipeline for a session.
///
/// `kinds` is the requested analyzer set; schema is always ensured first
/// regardless of whether it was requested.
pub(crate) async fn run_full_analysis(
    session: &AnalysisSession,
    kinds: &[AnalyzerKind],
    sink: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, SessionError> {
    let downstream: Vec<AnalyzerKind> = kinds
        .iter()
        .copied()
        .filter(|k| *k != AnalyzerKind::Schema)
        .collect();

    if session.is_server_mode() {
        run_server_mode(session, &downstream, sink, cancel).await
    } else {
        run_single_database(session, &downstream, sink, cancel).await
    }
}

async fn run_single_database(
    session: &AnalysisSession,
    downstream: &[AnalyzerKind],
    sink: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, SessionError> {
    let tracker = ProgressTracker::new(sink, 1 + downstream.len() as u64);

    session
        .set_analyzer_status(AnalyzerKind::Schema, AnalyzerStatus::Running)
        .await;
    let schema = match extract_schema(session.provider().as_ref(), cancel, false).await {
        Ok(schema) => schema,
        Err(e) => {
            session
                .set_analyzer_status(AnalyzerKind::Schema, AnalyzerStatus::Failed)
                .await;
            return Err(e.into());
        }
    };
    session
        .set_analyzer_status(AnalyzerKind::Schema, AnalyzerStatus::Completed)
        .await;
    tracker.step("schema");

    let database = session.database().map(|d| d.to_string());
    let db = ExtractedDb {
        label: database.clone().unwrap_or_else(|| session.server_name().to_string()),
        database: database.clone(),
        provider: session.provider().clone(),
        schema,
    };

    let union_refs = db.schema.all_refs();
    mark_running(session, downstream).await;
    let analysis = run_downstream(&db, downstream, &union_refs, &tracker, cancel).await;
    mark_finished(session, downstream, analysis.is_ok()).await;
    let analysis = analysis?;

    Ok(AnalysisResult {
        server_name: session.server_name().to_string(),
        dialect: session.dialect(),
        server_mode: false,
        databases: database.into_iter().collect(),
        failed_databases: Vec::new(),
        results: vec![analysis],
    })
}

async fn run_server_mode(
    session: &AnalysisSession,
    downstream: &[AnalyzerKind],
    sink: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, SessionError> {
    let databases = session.provider().list_databases().await?;
    info!(
        "server-mode analysis across {} databases on '{}'",
        databases.len(),
        session.server_name()
    );

    let total = databases.len() as u64 * (1 + downstream.len() as u64);
    let tracker = ProgressTracker::new(sink, total);

    // Phase 1: extract every database concurrently, isolated.
    session
        .set_analyzer_status(AnalyzerKind::Schema, AnalyzerStatus::Running)
        .await;
    let extractions = join_all(databases.iter().map(|db| {
        let name = db.name.clone();
        let provider = session.provider().clone();
        let tracker = tracker.clone();
        let cancel = cancel.clone();
        async move {
            let outcome = async {
                let handle = provider.for_database(&name).await?;
                let schema = extract_schema(handle.as_ref(), &cancel, true).await?;
                Ok::<_, ProviderError>((handle, schema))
            }
            .await;
            tracker.step(format!("{name}: schema"));
            (name, outcome)
        }
    }))
    .await;
    session
        .set_analyzer_status(AnalyzerKind::Schema, AnalyzerStatus::Completed)
        .await;

    let mut extracted: Vec<ExtractedDb> = Vec::new();
    let mut failed: Vec<DatabaseFailure> = Vec::new();
    for (name, outcome) in extractions {
        match outcome {
            Ok((provider, schema)) => extracted.push(ExtractedDb {
                label: name.clone(),
                database: Some(name),
                provider,
                schema,
            }),
            Err(ProviderError::Cancelled) => return Err(SessionError::Cancelled),
            Err(e) => {
                warn!("database '{}' failed, siblings continue: {}", name, e);
                failed.push(DatabaseFailure {
                    database: name,
                    error: e.to_string(),
                });
            }
        }
    }
    cancel.check()?;

    // The unioned, database-qualified node space: cross-database edges keep
    // both endpoints as long as both databases were extracted.
    let union_refs: Vec<ObjectRef> = extracted
        .iter()
        .flat_map(|db| db.schema.all_refs())
        .collect();

    // Phase 2: per-database pipelines, concurrent and isolated.
    mark_running(session, downstream).await;
    let runs = join_all(extracted.into_iter().map(|db| {
        let union_refs = &union_refs;
        let tracker = tracker.clone();
        let cancel = cancel.clone();
        async move {
            let name = db.label.clone();
            let outcome = run_downstream(&db, downstream, union_refs, &tracker, &cancel).await;
            (name, outcome)
        }
    }))
    .await;
    mark_finished(session, downstream, true).await;

    let mut results: Vec<DatabaseAnalysis> = Vec::new();
    for (name, outcome) in runs {
        match outcome {
            Ok(analysis) => results.push(analysis),
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(e) => {
                warn!("database '{}' failed during analysis: {}", name, e);
                failed.push(DatabaseFailure {
                    database: name,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(AnalysisResult {
        server_name: session.server_name().to_string(),
        dialect: session.dialect(),
        server_mode: true,
        databases: results
            .iter()
            .filter_map(|r| r.database.clone())
            .collect(),
        failed_databases: failed,
        results,
    })
}

/// Run the selected downstream analyzers concurrently for one database.
async fn run_downstream(
    db: &ExtractedDb,
    kinds: &[AnalyzerKind],
    known_refs: &[ObjectRef],
    tracker: &ProgressTracker,
    cancel: &CancellationToken,
) -> Result<DatabaseAnalysis, SessionError> {
    let analyzers: Vec<Box<dyn Analyzer>> = downstream_analyzers()
        .into_iter()
        .filter(|a| kinds.contains(&a.kind()))
        .collect();

    let outcomes = join_all(analyzers.iter().map(|analyzer| {
        let tracker = tracker.clone();
        async move {
            let ctx = AnalyzerContext {
                provider: db.provider.as_ref(),
                schema: &db.schema,
                known_refs,
                cancel,
            };
            let outcome = analyzer.run(&ctx).await;
            tracker.step(format!("{}: {}", db.label, analyzer.kind()));
            (analyzer.kind(), outcome)
        }
    }))
    .await;

    let mut analysis = DatabaseAnalysis::from_schema(db.database.clone(), db.schema.clone());
    let mut first_error: Option<SessionError> = None;
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(slice) => apply_slice(&mut analysis, slice),
            // Cancellation outranks every other failure for the caller.
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(e) => {
                warn!("analyzer '{}' failed for '{}': {}", kind, db.label, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(analysis),
    }
}

/// Re-run one analyzer, updating only its slice of the cached result.
pub(crate) async fn run_single(
    session: &AnalysisSession,
    kind: AnalyzerKind,
    force: bool,
    database: Option<&str>,
    cancel: &CancellationToken,
) -> Result<AnalyzerSlice, SessionError> {
    let cached = session.cached_result().await;

    if kind == AnalyzerKind::Schema {
        return refresh_schema(session, database, cached, cancel).await;
    }

    let cached = cached.ok_or(SessionError::PrecursorMissing)?;
    let entry = cached
        .database_analysis(database)
        .ok_or_else(|| SessionError::UnknownDatabase(database.unwrap_or("<default>").to_string()))?;

    if !force {
        if let Some(slice) = existing_slice(entry, kind) {
            debug!("returning cached '{}' slice without re-running", kind);
            return Ok(slice);
        }
    }

    let provider = provider_for(session, entry.database.as_deref()).await?;
    let union_refs: Vec<ObjectRef> = cached
        .results
        .iter()
        .flat_map(|r| r.schema.all_refs())
        .collect();

    let analyzer = downstream_analyzers()
        .into_iter()
        .find(|a| a.kind() == kind)
        .ok_or_else(|| SessionError::UnknownAnalyzer(kind.to_string()))?;

    let ctx = AnalyzerContext {
        provider: provider.as_ref(),
        schema: &entry.schema,
        known_refs: &union_refs,
        cancel,
    };
    let slice = analyzer.run(&ctx).await?;

    let target = entry.database.clone();
    let stored = slice.clone();
    session
        .update_result(move |result| {
            let entry = result
                .database_analysis_mut(target.as_deref())
                .ok_or_else(|| {
                    SessionError::UnknownDatabase(target.as_deref().unwrap_or("<default>").into())
                })?;
            apply_slice(entry, stored);
            Ok(())
        })
        .await?;

    Ok(slice)
}

/// Re-extract one database's schema and invalidate every derived slice for
/// it; stale partial merges are never exposed.
async fn refresh_schema(
    session: &AnalysisSession,
    database: Option<&str>,
    cached: Option<AnalysisResult>,
    cancel: &CancellationToken,
) -> Result<AnalyzerSlice, SessionError> {
    let target = match &cached {
        Some(result) => result
            .database_analysis(database)
            .ok_or_else(|| {
                SessionError::UnknownDatabase(database.unwrap_or("<default>").to_string())
            })?
            .database
            .clone(),
        None => database.map(|d| d.to_string()).or_else(|| {
            session.database().map(|d| d.to_string())
        }),
    };

    let provider = provider_for(session, target.as_deref()).await?;
    let schema = extract_schema(provider.as_ref(), cancel, session.is_server_mode()).await?;

    match cached {
        Some(_) => {
            let stored = schema.clone();
            let key = target.clone();
            session
                .update_result(move |result| {
                    let entry =
                        result
                            .database_analysis_mut(key.as_deref())
                            .ok_or_else(|| {
                                SessionError::UnknownDatabase(
                                    key.as_deref().unwrap_or("<default>").into(),
                                )
                            })?;
                    entry.schema = stored;
                    entry.invalidate_derived();
                    Ok(())
                })
                .await?;
        }
        None => {
            // First schema for this session: seed the cache.
            let result = AnalysisResult {
                server_name: session.server_name().to_string(),
                dialect: session.dialect(),
                server_mode: session.is_server_mode(),
                databases: target.clone().into_iter().collect(),
                failed_databases: Vec::new(),
                results: vec![DatabaseAnalysis::from_schema(target, schema.clone())],
            };
            session.store_result(result).await;
        }
    }

    Ok(AnalyzerSlice::Schema(schema))
}

async fn provider_for(
    session: &AnalysisSession,
    database: Option<&str>,
) -> Result<Arc<dyn DialectProvider>, SessionError> {
    match (session.is_server_mode(), database) {
        (true, Some(name)) => Ok(session.provider().for_database(name).await?),
        _ => Ok(session.provider().clone()),
    }
}

fn existing_slice(entry: &DatabaseAnalysis, kind: AnalyzerKind) -> Option<AnalyzerSlice> {
    match kind {
        AnalyzerKind::Schema => Some(AnalyzerSlice::Schema(entry.schema.clone())),
        AnalyzerKind::Profile => entry.profile.clone().map(AnalyzerSlice::Profile),
        AnalyzerKind::Quality => entry.quality.clone().map(AnalyzerSlice::Quality),
        AnalyzerKind::Relationships => {
            entry.relationships.clone().map(AnalyzerSlice::Relationships)
        }
        AnalyzerKind::Usage => entry.usage.clone().map(AnalyzerSlice::Usage),
    }
}

fn apply_slice(entry: &mut DatabaseAnalysis, slice: AnalyzerSlice) {
    match slice {
        AnalyzerSlice::Schema(schema) => {
            entry.schema = schema;
            entry.invalidate_derived();
        }
        AnalyzerSlice::Profile(p) => entry.profile = Some(p),
        AnalyzerSlice::Quality(q) => entry.quality = Some(q),
        AnalyzerSlice::Relationships(r) => entry.relationships = Some(r),
        AnalyzerSlice::Usage(u) => entry.usage = Some(u),
    }
}

async fn mark_running(session: &AnalysisSession, kinds: &[AnalyzerKind]) {
    for kind in kinds {
        session
            .set_analyzer_status(*kind, AnalyzerStatus::Running)
            .await;
    }
}

async fn mark_finished(session: &AnalysisSession, kinds: &[AnalyzerKind], ok: bool) {
    let status = if ok {
        AnalyzerStatus::Completed
    } else {
        AnalyzerStatus::Failed
    };
    for kind in kinds {
        session.set_analyzer_status(*kind, status).await;
    }
}
