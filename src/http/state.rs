//! Shared application state type.

use crate::measurement::{MeasurementOrchestrator, MeasurementProvider};
use std::sync::Arc;

/// Everything the handlers need, built once in `main` and injected.
pub struct AppContext {
    pub orchestrator: Arc<MeasurementOrchestrator>,
    /// Used directly by the directory endpoints, which never go through
    /// the orchestrator.
    pub provider: Arc<dyn MeasurementProvider>,
}

impl AppContext {
    pub fn new(
        orchestrator: Arc<MeasurementOrchestrator>,
        provider: Arc<dyn MeasurementProvider>,
    ) -> Self {
        Self { orchestrator, provider }
    }
}

/// Application state shared across all handlers.
pub type AppState = Arc<AppContext>;
