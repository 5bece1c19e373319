//! Axum route handlers that front the external analysis service.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis_client::AnalysisRequest;
use crate::editor::session::EditorSession;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisReport, CoverLetters};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: String,
    pub report: AnalysisReport,
    /// Fresh editor session seeded with the original résumé.
    pub session: EditorSession,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: String,
    pub resume_text: String,
}

impl AnalyzeRequest {
    fn validate(self) -> Result<AnalysisRequest, AppError> {
        if self.job_description.trim().is_empty() || self.resume_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in both job description and resume text".to_string(),
            ));
        }
        Ok(AnalysisRequest {
            job_description: self.job_description,
            resume_text: self.resume_text,
        })
    }
}

/// POST /api/v1/analyze
///
/// Runs the analysis and starts a new editor session. Any previous session
/// held by the client is superseded.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = request.validate()?;

    let analysis = state.analysis.analyze(&request).await?;
    let session = EditorSession::seed(request.resume_text, analysis.report.suggestions.clone())?;
    info!("Analysis {} ready, editor session seeded", analysis.analysis_id);

    Ok(Json(AnalyzeResponse {
        analysis_id: analysis.analysis_id,
        report: analysis.report,
        session,
        created_at: analysis.created_at,
    }))
}

/// POST /api/v1/cover-letter
///
/// Returns a short and a long cover letter for the job description.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<CoverLetters>, AppError> {
    let request = request.validate()?;
    let letters = state.analysis.generate_cover_letter(&request).await?;
    Ok(Json(letters))
}
