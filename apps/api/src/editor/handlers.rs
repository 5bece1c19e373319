//! Axum route handlers for the Editor API.
//!
//! The server keeps no session state: each request carries the caller's
//! `EditorSession` and the response returns the updated one.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::editor::session::{EditorSession, EXPORT_FILE_NAME};
use crate::editor::suggestions::MatchStrategy;
use crate::editor::terms::{Placement, TermKind};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub session: EditorSession,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub session: EditorSession,
    pub applied: bool,
    /// How the suggestion was matched, when it is now applied.
    pub strategy: Option<MatchStrategy>,
    pub applied_indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AddTermRequest {
    pub session: EditorSession,
    pub term: String,
    #[serde(default)]
    pub kind: TermKind,
}

#[derive(Debug, Serialize)]
pub struct AddTermResponse {
    pub session: EditorSession,
    pub placement: Placement,
}

#[derive(Debug, Deserialize)]
pub struct RemoveTermRequest {
    pub session: EditorSession,
    pub term: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session: EditorSession,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/toggle
///
/// Applies the suggestion at `index`, or reverts it if already applied.
pub async fn handle_toggle(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let ToggleRequest { mut session, index } = request;
    session.toggle(&state.editor, index)?;

    let applied = session.is_applied(index);
    let strategy = session.applied.get(index).map(|edit| edit.strategy);
    debug!(index, applied, ?strategy, "suggestion toggled");

    Ok(Json(ToggleResponse {
        applied_indices: session.applied.indices().collect(),
        session,
        applied,
        strategy,
    }))
}

/// POST /api/v1/editor/terms/add
///
/// Adds a skill or ATS keyword. An already-present term is reported as
/// `already_present`, not as an error.
pub async fn handle_add_term(
    State(state): State<AppState>,
    Json(request): Json<AddTermRequest>,
) -> Result<Json<AddTermResponse>, AppError> {
    let AddTermRequest {
        mut session,
        term,
        kind,
    } = request;
    if term.trim().is_empty() {
        return Err(AppError::Validation("term cannot be empty".to_string()));
    }

    let placement = session.add_term(&state.editor, &term, kind)?;
    info!("Added {:?} '{}' to résumé: {:?}", kind, term.trim(), placement);

    Ok(Json(AddTermResponse { session, placement }))
}

/// POST /api/v1/editor/terms/remove
pub async fn handle_remove_term(
    State(state): State<AppState>,
    Json(request): Json<RemoveTermRequest>,
) -> Result<Json<SessionPayload>, AppError> {
    let RemoveTermRequest { mut session, term } = request;
    if term.trim().is_empty() {
        return Err(AppError::Validation("term cannot be empty".to_string()));
    }

    session.remove_term(&state.editor, &term)?;
    info!("Removed '{}' from résumé", term.trim());

    Ok(Json(SessionPayload { session }))
}

/// POST /api/v1/editor/reset
///
/// Drops every applied suggestion and term edit.
pub async fn handle_reset(Json(request): Json<SessionPayload>) -> Json<SessionPayload> {
    let mut session = request.session;
    debug!(
        discarded = session.applied.len(),
        "resetting editor session to the original résumé"
    );
    session.reset();
    Json(SessionPayload { session })
}

/// POST /api/v1/editor/export
///
/// Returns the optimized résumé as a plain-text attachment.
pub async fn handle_export(Json(request): Json<SessionPayload>) -> Result<Response, AppError> {
    let text = request.session.export_text()?.to_string();

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
        ),
    ];
    Ok((headers, text).into_response())
}
