//! Session registry.
//!
//! Process-wide map from session id to live session, created at startup.
//! Entries are inserted on connect and removed on disconnect; disconnecting
//! an unknown or already-closed session is not an error. Cross-session
//! operations are fully independent; no global lock serializes them beyond
//! the brief map accesses here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use schemalens_provider::{
    CancellationToken, Dialect, DialectProvider, ServerQueries, SqliteProvider,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::analyzers::AnalyzerKind;
use crate::error::SessionError;
use crate::orchestrator;
use crate::progress::{NullSink, ProgressSink};
use crate::result::{AnalysisResult, AnalyzerSlice};
use crate::session::{AnalysisSession, SessionId, SessionState};

/// Connection outcome returned to the caller.
#[derive(Debug, Clone)]
pub struct ConnectInfo {
    /// Newly minted session id
    pub session_id: SessionId,

    /// Whether the session spans all databases on the server
    pub server_mode: bool,

    /// Server name reported by the backend
    pub server_name: String,

    /// Bound database, when not in server mode
    pub database: Option<String>,
}

/// Registry of live analysis sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<AnalysisSession>>>,
    next_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect to a backend described by a connection string and dialect.
    ///
    /// Only dialects with a built-in driver resolve here; embedders with
    /// their own provider implementations use
    /// [`SessionRegistry::connect_provider`].
    pub async fn connect(
        &self,
        connection_string: &str,
        dialect: Dialect,
    ) -> Result<ConnectInfo, SessionError> {
        let provider: Arc<dyn DialectProvider> = match dialect {
            Dialect::Sqlite => Arc::new(
                SqliteProvider::open(connection_string)
                    .map_err(|e| SessionError::ConnectionFailure(e.to_string()))?,
            ),
            other => {
                return Err(SessionError::ConnectionFailure(format!(
                    "no built-in driver for dialect '{other}'"
                )))
            }
        };
        self.connect_provider(provider).await
    }

    /// Open a session around an already-constructed provider handle.
    pub async fn connect_provider(
        &self,
        provider: Arc<dyn DialectProvider>,
    ) -> Result<ConnectInfo, SessionError> {
        // Verify reachability up front; a connect that cannot answer the
        // cheapest server query has failed.
        let info = provider
            .server_info()
            .await
            .map_err(|e| SessionError::ConnectionFailure(e.to_string()))?;

        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = Arc::new(AnalysisSession::new(
            id,
            provider,
            info.server_name.clone(),
        ));

        let connect_info = ConnectInfo {
            session_id: id,
            server_mode: session.is_server_mode(),
            server_name: info.server_name,
            database: session.database().map(|d| d.to_string()),
        };

        self.sessions.write().await.insert(id, session);
        info!(
            "opened {} ({}, server_mode={})",
            id, connect_info.server_name, connect_info.server_mode
        );
        Ok(connect_info)
    }

    /// Run an analysis, all analyzers or a subset. Schema is always ensured
    /// first. Rejects with [`SessionError::AnalysisInProgress`] if the
    /// session is already analyzing.
    pub async fn run_analysis(
        &self,
        id: SessionId,
        analyzers: Option<&[AnalyzerKind]>,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<AnalysisResult, SessionError> {
        let session = self.get(id).await?;
        let _permit = session.try_begin_run()?;

        let cancel = CancellationToken::new();
        session.set_active_cancel(Some(cancel.clone())).await;
        session.set_state(SessionState::Analyzing).await;

        let kinds = analyzers.unwrap_or_else(|| AnalyzerKind::all());
        let sink = sink.unwrap_or_else(|| Arc::new(NullSink));

        let outcome = orchestrator::run_full_analysis(&session, kinds, sink, &cancel).await;
        session.set_active_cancel(None).await;

        match outcome {
            Ok(result) => {
                session.store_result(result.clone()).await;
                session.set_state(SessionState::Ready).await;
                Ok(result)
            }
            Err(e) => {
                // Partial work is discarded; the session reverts to its last
                // Ready snapshot when one exists.
                let state = if session.cached_result().await.is_some() {
                    SessionState::Ready
                } else {
                    SessionState::Connected
                };
                session.set_state(state).await;
                Err(e)
            }
        }
    }

    /// Re-run one analyzer, updating only its slice of the cached result.
    ///
    /// `database` selects the slice in server mode. Without `force`, an
    /// already-cached slice is returned as-is.
    pub async fn run_single_analyzer(
        &self,
        id: SessionId,
        kind: AnalyzerKind,
        force: bool,
        database: Option<&str>,
    ) -> Result<AnalyzerSlice, SessionError> {
        let session = self.get(id).await?;
        let _permit = session.try_begin_run()?;

        let cancel = CancellationToken::new();
        session.set_active_cancel(Some(cancel.clone())).await;
        session.set_state(SessionState::Analyzing).await;

        let outcome = orchestrator::run_single(&session, kind, force, database, &cancel).await;
        session.set_active_cancel(None).await;

        let state = if session.cached_result().await.is_some() {
            SessionState::Ready
        } else {
            SessionState::Connected
        };
        session.set_state(state).await;

        outcome
    }

    /// Pure lookup of the most recent full result.
    pub async fn get_cached_result(
        &self,
        id: SessionId,
    ) -> Result<Option<AnalysisResult>, SessionError> {
        let session = self.get(id).await?;
        Ok(session.cached_result().await)
    }

    /// Cancel the session's in-flight run, if any. Returns whether one was
    /// signalled.
    pub async fn cancel_analysis(&self, id: SessionId) -> Result<bool, SessionError> {
        let session = self.get(id).await?;
        Ok(session.cancel_active_run().await)
    }

    /// Look up a live session.
    pub async fn session(&self, id: SessionId) -> Result<Arc<AnalysisSession>, SessionError> {
        self.get(id).await
    }

    /// Disconnect and drop a session. Idempotent: unknown or already-closed
    /// ids are not an error.
    pub async fn disconnect(&self, id: SessionId) {
        if let Some(session) = self.sessions.write().await.remove(&id) {
            session.cancel_active_run().await;
            session.set_state(SessionState::Disconnected).await;
            info!("closed {}", id);
        } else {
            debug!("disconnect for unknown {} ignored", id);
        }
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than `max_idle`, skipping any with a
    /// run in flight. Intended to be called from an embedder's timer.
    /// Returns the number of sessions closed.
    pub async fn sweep_idle(&self, max_idle: std::time::Duration) -> usize {
        let candidates: Vec<Arc<AnalysisSession>> =
            self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in candidates {
            if session.state().await != SessionState::Analyzing
                && session.idle_for().await >= max_idle
            {
                expired.push(session.id());
            }
        }

        let count = expired.len();
        for id in expired {
            debug!("expiring idle {}", id);
            self.disconnect(id).await;
        }
        count
    }

    async fn get(&self, id: SessionId) -> Result<Arc<AnalysisSession>, SessionError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        session.touch().await;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_provider::{MockData, MockProvider};

    fn mock_provider() -> Arc<dyn DialectProvider> {
        Arc::new(MockProvider::new(
            MockData::database("srv", "Sales").with_table("dbo", "Order", &[("Id", "int", true, true)]),
        ))
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_lifecycle() {
        let registry = SessionRegistry::new();
        let info = registry.connect_provider(mock_provider()).await.unwrap();

        assert!(!info.server_mode);
        assert_eq!(info.database.as_deref(), Some("Sales"));
        assert_eq!(registry.count().await, 1);

        registry.disconnect(info.session_id).await;
        assert_eq!(registry.count().await, 0);

        // Idempotent: a second disconnect is a no-op, not an error.
        registry.disconnect(info.session_id).await;
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let registry = SessionRegistry::new();
        let err = registry
            .get_cached_result(SessionId(999))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_connect_failure_when_server_unreachable() {
        let registry = SessionRegistry::new();
        let data = MockData::database("srv", "Sales")
            .denying(schemalens_provider::MockCapability::ServerInfo);
        let provider: Arc<dyn DialectProvider> = Arc::new(MockProvider::new(data));

        let err = registry.connect_provider(provider).await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectionFailure(_)));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_downstream_without_schema_is_precursor_missing() {
        let registry = SessionRegistry::new();
        let info = registry.connect_provider(mock_provider()).await.unwrap();

        let err = registry
            .run_single_analyzer(info.session_id, AnalyzerKind::Usage, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PrecursorMissing));
    }

    #[tokio::test]
    async fn test_sweep_idle_expires_quiet_sessions() {
        let registry = SessionRegistry::new();
        let info = registry.connect_provider(mock_provider()).await.unwrap();
        assert_eq!(registry.count().await, 1);

        // Nothing is older than an hour yet.
        assert_eq!(
            registry.sweep_idle(std::time::Duration::from_secs(3600)).await,
            0
        );

        // With a zero allowance every quiet session expires.
        assert_eq!(
            registry.sweep_idle(std::time::Duration::ZERO).await,
            1
        );
        assert_eq!(registry.count().await, 0);

        let err = registry.get_cached_result(info.session_id).await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_connect_unsupported_dialect() {
        let registry = SessionRegistry::new();
        let err = registry
            .connect("host=db;user=x", Dialect::Postgres)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ConnectionFailure(_)));
    }
}
