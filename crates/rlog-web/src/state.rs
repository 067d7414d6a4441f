//! Shared state for the web interface.

use std::sync::Arc;

use parking_lot::RwLock;

use rlog_engine::Session;

use crate::error::{WebError, WebResult};

/// Shared state: the current session, swapped wholesale on rebuild.
#[derive(Debug)]
pub struct WebState {
    session: RwLock<Arc<Session>>,

    /// File-name pattern applied to every query
    source_name: Option<String>,
}

impl WebState {
    pub fn new(session: Session) -> Self {
        Self {
            session: RwLock::new(Arc::new(session)),
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, pattern: Option<String>) -> Self {
        self.source_name = pattern;
        self
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session.read())
    }

    /// Re-discover sources and rebuild the summary index.
    ///
    /// Queries already running keep the session they started with.
    pub async fn rebuild(&self) -> WebResult<Arc<Session>> {
        let inputs = self.session().inputs().to_vec();

        let session = tokio::task::spawn_blocking(move || Session::indexed(inputs))
            .await
            .map_err(|e| WebError::Internal(e.to_string()))?;
        let session = Arc::new(session);

        *self.session.write() = Arc::clone(&session);
        Ok(session)
    }
}
