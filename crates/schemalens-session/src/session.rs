//! Analysis session state.
//!
//! One session binds one provider handle. The orchestrator is the only
//! mutator; everything else reads through the registry's lookup calls.
//! Single-flight: a second run against a session that is already analyzing
//! is rejected, never queued.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use schemalens_provider::{CancellationToken, Dialect, DialectProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::analyzers::AnalyzerKind;
use crate::error::SessionError;
use crate::result::AnalysisResult;

/// Session identifier, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connected, no analysis yet
    Connected,
    /// An analysis run is in flight
    Analyzing,
    /// A cached result is available
    Ready,
    /// Terminal; the session is gone from the registry
    Disconnected,
}

/// Per-analyzer progress status within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One live analysis session.
pub struct AnalysisSession {
    id: SessionId,
    provider: Arc<dyn DialectProvider>,
    dialect: Dialect,
    server_name: String,
    /// Target database; `None` means server mode
    database: Option<String>,

    state: RwLock<SessionState>,
    statuses: RwLock<HashMap<AnalyzerKind, AnalyzerStatus>>,
    cached: RwLock<Option<AnalysisResult>>,
    /// Token of the in-flight run, for external cancellation
    active_cancel: RwLock<Option<CancellationToken>>,
    /// Single-flight guard; held for the duration of a run
    run_guard: Mutex<()>,
    /// Last operation timestamp, for idle expiry
    last_activity: RwLock<Instant>,
}

impl AnalysisSession {
    /// Create a session around a connected provider.
    pub fn new(id: SessionId, provider: Arc<dyn DialectProvider>, server_name: String) -> Self {
        let dialect = provider.dialect();
        let database = provider.database().map(|d| d.to_string());
        Self {
            id,
            provider,
            dialect,
            server_name,
            database,
            state: RwLock::new(SessionState::Connected),
            statuses: RwLock::new(HashMap::new()),
            cached: RwLock::new(None),
            active_cancel: RwLock::new(None),
            run_guard: Mutex::new(()),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Provider handle.
    pub fn provider(&self) -> &Arc<dyn DialectProvider> {
        &self.provider
    }

    /// Dialect of the bound provider.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Server name reported at connect time.
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Target database; `None` in server mode.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Whether this session spans all databases on the server.
    pub fn is_server_mode(&self) -> bool {
        self.database.is_none()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, state: SessionState) {
        *self.state.write().await = state;
    }

    /// Per-analyzer status map.
    pub async fn analyzer_statuses(&self) -> HashMap<AnalyzerKind, AnalyzerStatus> {
        self.statuses.read().await.clone()
    }

    pub(crate) async fn set_analyzer_status(&self, kind: AnalyzerKind, status: AnalyzerStatus) {
        self.statuses.write().await.insert(kind, status);
    }

    /// The most recent full result, if any.
    pub async fn cached_result(&self) -> Option<AnalysisResult> {
        self.cached.read().await.clone()
    }

    pub(crate) async fn store_result(&self, result: AnalysisResult) {
        *self.cached.write().await = Some(result);
    }

    /// Replace the cache wholesale (single-analyzer slice updates go through
    /// a read-modify-write of the whole value).
    pub(crate) async fn update_result<F>(&self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut AnalysisResult) -> Result<(), SessionError>,
    {
        let mut cached = self.cached.write().await;
        let result = cached.as_mut().ok_or(SessionError::PrecursorMissing)?;
        f(result)
    }

    /// Acquire the single-flight permit, rejecting if a run is in flight.
    pub(crate) fn try_begin_run(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.run_guard
            .try_lock()
            .map_err(|_| SessionError::AnalysisInProgress)
    }

    /// Register the in-flight run's cancellation token.
    pub(crate) async fn set_active_cancel(&self, token: Option<CancellationToken>) {
        *self.active_cancel.write().await = token;
    }

    /// Record activity, deferring idle expiry.
    pub(crate) async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
    }

    /// Time since the last operation against this session.
    pub async fn idle_for(&self) -> std::time::Duration {
        self.last_activity.read().await.elapsed()
    }

    /// Cancel the in-flight run, if any. Returns whether one was signalled.
    pub async fn cancel_active_run(&self) -> bool {
        match self.active_cancel.read().await.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_provider::{MockData, MockProvider};

    fn session() -> AnalysisSession {
        let provider = Arc::new(MockProvider::new(MockData::database("srv", "Sales")));
        AnalysisSession::new(SessionId(1), provider, "srv".to_string())
    }

    #[tokio::test]
    async fn test_single_flight_rejects_second_run() {
        let session = session();

        let permit = session.try_begin_run().unwrap();
        assert!(matches!(
            session.try_begin_run(),
            Err(SessionError::AnalysisInProgress)
        ));

        drop(permit);
        assert!(session.try_begin_run().is_ok());
    }

    #[tokio::test]
    async fn test_server_mode_detection() {
        let server = Arc::new(MockProvider::new(MockData::server("srv", &["A", "B"])));
        let server_session = AnalysisSession::new(SessionId(2), server, "srv".to_string());
        assert!(server_session.is_server_mode());

        let single = session();
        assert!(!single.is_server_mode());
        assert_eq!(single.database(), Some("Sales"));
    }

    #[tokio::test]
    async fn test_cancel_without_active_run() {
        let session = session();
        assert!(!session.cancel_active_run().await);
    }
}
