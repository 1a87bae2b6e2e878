use crate::scoring::Evaluator;
use crate::session::SessionHandle;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Command/snapshot handle of the running practice session
    pub session: SessionHandle,

    /// Scoring used by the offline `/score` endpoint
    pub evaluator: Arc<Evaluator>,
}

impl AppState {
    pub fn new(session: SessionHandle, evaluator: Arc<Evaluator>) -> Self {
        Self { session, evaluator }
    }
}
