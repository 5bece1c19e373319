// Résumé text editor: reversible suggestion toggles and skill/keyword patching
// over unstructured résumé text. Every operation is a pure transform from
// (buffer, request) to a new buffer; callers own the buffer and applied set.

pub mod handlers;
pub mod sections;
pub mod session;
pub mod suggestions;
pub mod terms;

use std::sync::Arc;

use thiserror::Error;

use crate::models::analysis::Suggestion;
use sections::{HeadingLocator, SectionLocator};
use suggestions::AppliedSet;
use terms::{TermInsertion, TermKind};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no résumé content found")]
    EmptyBuffer,

    #[error("no suggestion at index {0}")]
    UnknownSuggestion(usize),

    #[error("invalid term pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Entry point for all edits to the optimized résumé.
///
/// Section detection is delegated to a pluggable `SectionLocator`
/// (default: `HeadingLocator`).
#[derive(Clone)]
pub struct ResumeTextEditor {
    locator: Arc<dyn SectionLocator>,
}

impl Default for ResumeTextEditor {
    fn default() -> Self {
        Self::new(Arc::new(HeadingLocator))
    }
}

impl ResumeTextEditor {
    pub fn new(locator: Arc<dyn SectionLocator>) -> Self {
        Self { locator }
    }

    /// Applies suggestion `index` if it is not in `applied`, reverts it otherwise.
    /// Never fails: unmatched text degrades to a labeled append.
    pub fn toggle_suggestion(
        &self,
        buffer: &str,
        applied: &AppliedSet,
        index: usize,
        suggestion: &Suggestion,
    ) -> (String, AppliedSet) {
        suggestions::toggle_suggestion(buffer, applied, index, suggestion)
    }

    pub fn add_term(
        &self,
        buffer: &str,
        term: &str,
        kind: TermKind,
    ) -> Result<TermInsertion, EditorError> {
        terms::add_term(self.locator.as_ref(), buffer, term, kind)
    }

    pub fn remove_term(&self, buffer: &str, term: &str) -> Result<String, EditorError> {
        terms::remove_term(buffer, term)
    }
}

pub(crate) fn ensure_content(buffer: &str) -> Result<(), EditorError> {
    if buffer.trim().is_empty() {
        return Err(EditorError::EmptyBuffer);
    }
    Ok(())
}
