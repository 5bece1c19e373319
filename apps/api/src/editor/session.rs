//! `EditorSession`: the buffer, suggestion catalog and applied set for one
//! analysis, held by the caller and passed through each edit.

use serde::{Deserialize, Serialize};

use crate::editor::suggestions::AppliedSet;
use crate::editor::terms::{Placement, TermKind};
use crate::editor::{ensure_content, EditorError, ResumeTextEditor};
use crate::models::analysis::Suggestion;

/// File name offered when the optimized résumé is downloaded.
pub const EXPORT_FILE_NAME: &str = "optimized_resume.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSession {
    pub original_resume: String,
    pub buffer: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub applied: AppliedSet,
}

impl EditorSession {
    /// Starts a session whose buffer is the original résumé.
    pub fn seed(
        original_resume: impl Into<String>,
        suggestions: Vec<Suggestion>,
    ) -> Result<Self, EditorError> {
        let original_resume = original_resume.into();
        ensure_content(&original_resume)?;

        Ok(Self {
            buffer: original_resume.clone(),
            original_resume,
            suggestions,
            applied: AppliedSet::new(),
        })
    }

    /// Toggles suggestion `index`. Returns whether it is applied afterwards.
    pub fn toggle(&mut self, editor: &ResumeTextEditor, index: usize) -> Result<bool, EditorError> {
        ensure_content(&self.buffer)?;
        let suggestion = self
            .suggestions
            .get(index)
            .ok_or(EditorError::UnknownSuggestion(index))?;

        let (buffer, applied) =
            editor.toggle_suggestion(&self.buffer, &self.applied, index, suggestion);
        self.buffer = buffer;
        self.applied = applied;
        Ok(self.applied.contains(index))
    }

    pub fn add_term(
        &mut self,
        editor: &ResumeTextEditor,
        term: &str,
        kind: TermKind,
    ) -> Result<Placement, EditorError> {
        let insertion = editor.add_term(&self.buffer, term, kind)?;
        self.buffer = insertion.buffer;
        Ok(insertion.placement)
    }

    pub fn remove_term(&mut self, editor: &ResumeTextEditor, term: &str) -> Result<(), EditorError> {
        self.buffer = editor.remove_term(&self.buffer, term)?;
        Ok(())
    }

    /// Discards every edit and goes back to the original résumé.
    pub fn reset(&mut self) {
        self.buffer = self.original_resume.clone();
        self.applied = AppliedSet::new();
    }

    pub fn is_applied(&self, index: usize) -> bool {
        self.applied.contains(index)
    }

    /// The optimized résumé as downloaded by the user.
    pub fn export_text(&self) -> Result<&str, EditorError> {
        ensure_content(&self.buffer)?;
        Ok(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "SUMMARY\nBackend engineer.\n\nEXPERIENCE\n• Managed team at Acme";

    fn catalog() -> Vec<Suggestion> {
        vec![
            Suggestion {
                section: "experience".to_string(),
                current_text: Some("Managed team".to_string()),
                suggested_text: "Led a team of 8".to_string(),
                reason: "Leadership".to_string(),
            },
            Suggestion {
                section: "skills".to_string(),
                current_text: None,
                suggested_text: "Fluent in Go".to_string(),
                reason: "Gap".to_string(),
            },
        ]
    }

    #[test]
    fn test_seed_rejects_blank_resume() {
        let err = EditorSession::seed("   ", catalog()).unwrap_err();
        assert!(matches!(err, EditorError::EmptyBuffer));
    }

    #[test]
    fn test_toggle_and_reset() {
        let editor = ResumeTextEditor::default();
        let mut session = EditorSession::seed(RESUME, catalog()).unwrap();

        assert!(session.toggle(&editor, 0).unwrap());
        assert!(session.toggle(&editor, 1).unwrap());
        assert!(session.is_applied(0) && session.is_applied(1));
        assert!(session.buffer.contains("• Led a team of 8 at Acme"));
        assert!(session.buffer.ends_with("\n\n[NEW SKILLS]\nFluent in Go"));

        session
            .add_term(&editor, "Kubernetes", TermKind::Skill)
            .unwrap();
        session.reset();
        assert_eq!(session.buffer, RESUME);
        assert_eq!(session.applied.len(), 0);
    }

    #[test]
    fn test_toggle_twice_restores_buffer() {
        let editor = ResumeTextEditor::default();
        let mut session = EditorSession::seed(RESUME, catalog()).unwrap();

        session.toggle(&editor, 1).unwrap();
        assert!(!session.toggle(&editor, 1).unwrap());
        assert_eq!(session.export_text().unwrap(), RESUME);
    }

    #[test]
    fn test_toggle_unknown_index() {
        let editor = ResumeTextEditor::default();
        let mut session = EditorSession::seed(RESUME, catalog()).unwrap();
        let err = session.toggle(&editor, 7).unwrap_err();
        assert!(matches!(err, EditorError::UnknownSuggestion(7)));
    }

    #[test]
    fn test_add_and_remove_term_through_session() {
        let editor = ResumeTextEditor::default();
        let mut session = EditorSession::seed(RESUME, Vec::new()).unwrap();

        let placement = session
            .add_term(&editor, "Rust", TermKind::Keyword)
            .unwrap();
        assert_eq!(placement, Placement::SummarySentence);
        assert!(session
            .buffer
            .starts_with("SUMMARY\nBackend engineer. Experienced in Rust."));

        let placement = session.add_term(&editor, "rust", TermKind::Skill).unwrap();
        assert_eq!(placement, Placement::AlreadyPresent);

        session.remove_term(&editor, "Rust").unwrap();
        assert!(!session.buffer.contains("Rust"));
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let editor = ResumeTextEditor::default();
        let mut session = EditorSession::seed(RESUME, catalog()).unwrap();
        session.toggle(&editor, 0).unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let mut restored: EditorSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);

        restored.toggle(&editor, 0).unwrap();
        assert_eq!(restored.buffer, RESUME);
    }
}
