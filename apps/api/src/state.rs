use std::sync::Arc;

use crate::analysis_client::AnalysisBackend;
use crate::editor::ResumeTextEditor;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds no per-user data: editor sessions travel in each request body.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable analysis backend. Default: HttpAnalysisBackend.
    pub analysis: Arc<dyn AnalysisBackend>,
    pub editor: ResumeTextEditor,
}
