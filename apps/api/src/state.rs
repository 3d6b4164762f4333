use std::sync::Arc;

use crate::interview::flow::InterviewFlow;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Interview workflow: generation, scoring, and record-store writes.
    pub flow: InterviewFlow,
    /// Pluggable record store. Postgres when DATABASE_URL is set, in-memory otherwise.
    pub store: Arc<dyn RecordStore>,
}
