//! Applying and reverting analysis suggestions against the résumé buffer.
//!
//! Apply cascades through progressively looser ways of finding the text a
//! suggestion replaces:
//! 1. exact literal match
//! 2. whitespace-normalized regex match
//! 3. match on the first `PARTIAL_PREFIX_CHARS` characters, spliced up to the
//!    end of that line
//! 4. append as a labeled `[SECTION IMPROVEMENT]` block
//!
//! Every apply records what was actually replaced in an `AppliedEdit`, so a
//! revert restores the buffer exactly whichever strategy fired.

use std::collections::BTreeMap;
use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::analysis::Suggestion;

/// Number of leading characters of `current_text` used by the prefix fallback.
pub const PARTIAL_PREFIX_CHARS: usize = 20;

/// Bytes of surrounding text kept on each side of an in-place edit.
const ANCHOR_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    NormalizedWhitespace,
    PartialPrefix,
    /// `current_text` was not found; the suggestion was appended as a labeled block.
    FallbackAppend,
    /// The suggestion had no `current_text` and was appended as new content.
    Addition,
}

impl MatchStrategy {
    fn is_appended(self) -> bool {
        matches!(self, MatchStrategy::FallbackAppend | MatchStrategy::Addition)
    }
}

/// Undo record for one applied suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    pub strategy: MatchStrategy,
    /// Byte offset at which `inserted` was written.
    pub offset: usize,
    /// Text written into the buffer.
    pub inserted: String,
    /// Text that `inserted` displaced. Empty for appended blocks.
    pub replaced: String,
    /// Text just before and after the edit at apply time. Locates an empty
    /// `inserted` once other edits have shifted the buffer.
    #[serde(default)]
    pub anchor_before: String,
    #[serde(default)]
    pub anchor_after: String,
}

/// Indices of the suggestions currently reflected in the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedSet {
    edits: BTreeMap<usize, AppliedEdit>,
}

impl AppliedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.edits.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<&AppliedEdit> {
        self.edits.get(&index)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.edits.keys().copied()
    }

    fn insert(&mut self, index: usize, edit: AppliedEdit) {
        self.edits.insert(index, edit);
    }

    fn remove(&mut self, index: usize) -> Option<AppliedEdit> {
        self.edits.remove(&index)
    }
}

/// Applies the suggestion if `index` is not in `applied`, reverts it otherwise.
pub fn toggle_suggestion(
    buffer: &str,
    applied: &AppliedSet,
    index: usize,
    suggestion: &Suggestion,
) -> (String, AppliedSet) {
    let mut applied = applied.clone();

    let buffer = match applied.remove(index) {
        Some(edit) => {
            debug!(index, strategy = ?edit.strategy, "reverting suggestion");
            revert(buffer, &edit)
        }
        None => {
            let (buffer, edit) = apply(buffer, suggestion);
            debug!(index, strategy = ?edit.strategy, "applied suggestion");
            applied.insert(index, edit);
            buffer
        }
    };

    (buffer, applied)
}

fn apply(buffer: &str, suggestion: &Suggestion) -> (String, AppliedEdit) {
    let label = suggestion.section_label();
    let suggested = suggestion.suggested_text.as_str();

    let Some(current) = suggestion.replaces() else {
        let block = format!("\n\n[NEW {label}]\n{suggested}");
        return append_block(buffer, block, MatchStrategy::Addition);
    };

    if let Some((span, strategy)) = locate_current(buffer, current) {
        let (anchor_before, anchor_after) = anchors_around(buffer, &span);
        let edit = AppliedEdit {
            strategy,
            offset: span.start,
            inserted: suggested.to_string(),
            replaced: buffer[span.clone()].to_string(),
            anchor_before,
            anchor_after,
        };
        return (splice(buffer, span, suggested), edit);
    }

    warn!(
        section = %label,
        "current text not found in résumé, appending suggestion as a labeled block"
    );
    let block = format!("\n\n[{label} IMPROVEMENT]\n{suggested}");
    append_block(buffer, block, MatchStrategy::FallbackAppend)
}

fn revert(buffer: &str, edit: &AppliedEdit) -> String {
    if edit.strategy.is_appended() {
        if let Some(kept) = buffer.strip_suffix(edit.inserted.as_str()) {
            return kept.to_string();
        }
        return match buffer.rfind(edit.inserted.as_str()) {
            Some(start) => splice(buffer, start..start + edit.inserted.len(), ""),
            None => {
                debug!("appended block no longer present, nothing to revert");
                buffer.to_string()
            }
        };
    }

    let start = if is_anchored_at(buffer, edit, edit.offset) {
        Some(edit.offset)
    } else if edit.inserted.is_empty() {
        // An empty slice sits at every offset; only the anchors can place it.
        let anchor = format!("{}{}", edit.anchor_before, edit.anchor_after);
        (!anchor.is_empty())
            .then(|| buffer.find(&anchor))
            .flatten()
            .map(|at| at + edit.anchor_before.len())
    } else {
        buffer.find(edit.inserted.as_str())
    };

    match start {
        Some(start) => splice(buffer, start..start + edit.inserted.len(), &edit.replaced),
        None => {
            debug!("suggested text no longer present verbatim, nothing to revert");
            buffer.to_string()
        }
    }
}

/// True when `edit.inserted` sits at `at` between its recorded anchors.
fn is_anchored_at(buffer: &str, edit: &AppliedEdit, at: usize) -> bool {
    let (Some(head), Some(tail)) = (buffer.get(..at), buffer.get(at..)) else {
        return false;
    };
    head.ends_with(edit.anchor_before.as_str())
        && tail
            .strip_prefix(edit.inserted.as_str())
            .is_some_and(|rest| rest.starts_with(edit.anchor_after.as_str()))
}

/// Up to `ANCHOR_BYTES` of text on each side of `span`, widened to char
/// boundaries.
fn anchors_around(buffer: &str, span: &Range<usize>) -> (String, String) {
    let mut start = span.start.saturating_sub(ANCHOR_BYTES);
    while !buffer.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (span.end + ANCHOR_BYTES).min(buffer.len());
    while !buffer.is_char_boundary(end) {
        end += 1;
    }
    (
        buffer[start..span.start].to_string(),
        buffer[span.end..end].to_string(),
    )
}

fn append_block(buffer: &str, block: String, strategy: MatchStrategy) -> (String, AppliedEdit) {
    let edit = AppliedEdit {
        strategy,
        offset: buffer.len(),
        inserted: block,
        replaced: String::new(),
        anchor_before: String::new(),
        anchor_after: String::new(),
    };
    (format!("{buffer}{}", edit.inserted), edit)
}

/// Finds the span of `buffer` that `current` refers to.
fn locate_current(buffer: &str, current: &str) -> Option<(Range<usize>, MatchStrategy)> {
    if let Some(start) = buffer.find(current) {
        return Some((start..start + current.len(), MatchStrategy::Exact));
    }

    if let Some(span) = find_normalized(buffer, current) {
        return Some((span, MatchStrategy::NormalizedWhitespace));
    }

    find_by_prefix(buffer, current).map(|span| (span, MatchStrategy::PartialPrefix))
}

/// Matches `current` with every whitespace run relaxed to `\s+`.
fn find_normalized(buffer: &str, current: &str) -> Option<Range<usize>> {
    let tokens: Vec<String> = current.split_whitespace().map(regex::escape).collect();
    if tokens.is_empty() {
        return None;
    }

    let pattern = Regex::new(&tokens.join(r"\s+")).ok()?;
    pattern.find(buffer).map(|m| m.range())
}

/// Matches the first `PARTIAL_PREFIX_CHARS` characters of `current`, then
/// extends the span to the end of that line, but never further than the
/// length of `current`.
fn find_by_prefix(buffer: &str, current: &str) -> Option<Range<usize>> {
    let current = current.trim();
    let prefix_end = current
        .char_indices()
        .nth(PARTIAL_PREFIX_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(current.len());
    let prefix = current[..prefix_end].trim_end();
    if prefix.is_empty() {
        return None;
    }

    let start = buffer.find(prefix)?;
    let line_end = buffer[start..]
        .find('\n')
        .map(|i| start + i)
        .unwrap_or(buffer.len());

    let mut end = line_end
        .min(start + current.len())
        .max(start + prefix.len());
    while !buffer.is_char_boundary(end) {
        end -= 1;
    }

    Some(start..end)
}

fn splice(buffer: &str, span: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(buffer.len() + replacement.len());
    out.push_str(&buffer[..span.start]);
    out.push_str(replacement);
    out.push_str(&buffer[span.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "EXPERIENCE\n• Managed team at Acme\n• Wrote Python services";

    fn suggestion(section: &str, current: Option<&str>, suggested: &str) -> Suggestion {
        Suggestion {
            section: section.to_string(),
            current_text: current.map(str::to_string),
            suggested_text: suggested.to_string(),
            reason: "Test".to_string(),
        }
    }

    #[test]
    fn test_exact_apply_replaces_once_and_reverts() {
        let buffer = "Managed team. Later: Managed team.";
        let s = suggestion("experience", Some("Managed team"), "Led a cross-functional team of 8");

        let (applied_buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 0, &s);
        assert_eq!(
            applied_buffer,
            "Led a cross-functional team of 8. Later: Managed team."
        );
        assert!(applied.contains(0));
        assert_eq!(applied.get(0).unwrap().strategy, MatchStrategy::Exact);

        let (reverted, applied) = toggle_suggestion(&applied_buffer, &applied, 0, &s);
        assert_eq!(reverted, buffer);
        assert!(!applied.contains(0));
    }

    #[test]
    fn test_addition_appends_new_block_and_reverts() {
        let s = suggestion("skills", None, "Fluent in Go");

        let (applied_buffer, applied) = toggle_suggestion(RESUME, &AppliedSet::new(), 3, &s);
        assert_eq!(applied_buffer, format!("{RESUME}\n\n[NEW SKILLS]\nFluent in Go"));
        assert_eq!(applied.get(3).unwrap().strategy, MatchStrategy::Addition);

        let (reverted, applied) = toggle_suggestion(&applied_buffer, &applied, 3, &s);
        assert_eq!(reverted, RESUME);
        assert_eq!(applied.len(), 0);
    }

    #[test]
    fn test_normalized_whitespace_match() {
        let buffer = "Summary\nBuilt   scalable\nAPIs for payments";
        let s = suggestion("summary", Some("Built scalable APIs"), "Designed resilient APIs");

        let (applied_buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 0, &s);
        assert_eq!(applied_buffer, "Summary\nDesigned resilient APIs for payments");
        assert_eq!(
            applied.get(0).unwrap().strategy,
            MatchStrategy::NormalizedWhitespace
        );

        let (reverted, _) = toggle_suggestion(&applied_buffer, &applied, 0, &s);
        assert_eq!(reverted, buffer);
    }

    #[test]
    fn test_partial_prefix_match_splices_to_line_end() {
        let buffer = "• Managed team at Acme Corp (2019-2021)\n• Wrote Python services";
        let s = suggestion(
            "experience",
            Some("Managed team at Acme Corporation, 2019-2021"),
            "Led a team of 8 at Acme",
        );

        let (applied_buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 1, &s);
        assert_eq!(applied_buffer, "• Led a team of 8 at Acme\n• Wrote Python services");
        let edit = applied.get(1).unwrap();
        assert_eq!(edit.strategy, MatchStrategy::PartialPrefix);
        assert_eq!(edit.replaced, "Managed team at Acme Corp (2019-2021)");

        let (reverted, _) = toggle_suggestion(&applied_buffer, &applied, 1, &s);
        assert_eq!(reverted, buffer);
    }

    #[test]
    fn test_partial_prefix_span_is_capped_by_current_length() {
        let buffer = "Managed team at Acme and also shipped four products";
        let span = find_by_prefix(buffer, "Managed team at Acme and").unwrap();
        assert_eq!(&buffer[span], "Managed team at Acme and");
    }

    #[test]
    fn test_unmatched_current_text_falls_back_to_labeled_block() {
        let s = suggestion("summary", Some("Completely different wording here"), "Senior engineer");

        let (applied_buffer, applied) = toggle_suggestion(RESUME, &AppliedSet::new(), 0, &s);
        assert_eq!(
            applied_buffer,
            format!("{RESUME}\n\n[SUMMARY IMPROVEMENT]\nSenior engineer")
        );
        assert_eq!(applied.get(0).unwrap().strategy, MatchStrategy::FallbackAppend);

        let (reverted, _) = toggle_suggestion(&applied_buffer, &applied, 0, &s);
        assert_eq!(reverted, RESUME);
    }

    #[test]
    fn test_revert_of_non_trailing_block_removes_it() {
        let first = suggestion("skills", None, "Fluent in Go");
        let second = suggestion("summary", None, "Open source maintainer");

        let (buffer, applied) = toggle_suggestion(RESUME, &AppliedSet::new(), 0, &first);
        let (buffer, applied) = toggle_suggestion(&buffer, &applied, 1, &second);
        let (buffer, applied) = toggle_suggestion(&buffer, &applied, 0, &first);

        assert_eq!(buffer, format!("{RESUME}\n\n[NEW SUMMARY]\nOpen source maintainer"));
        assert_eq!(applied.indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_revert_after_manual_edit_is_silent_noop() {
        let s = suggestion("experience", Some("Managed team"), "Led team");
        let (_, applied) = toggle_suggestion(RESUME, &AppliedSet::new(), 0, &s);

        let edited = "EXPERIENCE\n• Something else entirely";
        let (reverted, applied) = toggle_suggestion(edited, &applied, 0, &s);
        assert_eq!(reverted, edited);
        assert!(!applied.contains(0));
    }

    #[test]
    fn test_revert_prefers_recorded_offset() {
        // The suggested text already exists earlier in the buffer.
        let buffer = "Led team. Managed team.";
        let s = suggestion("experience", Some("Managed team"), "Led team");

        let (applied_buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 0, &s);
        assert_eq!(applied_buffer, "Led team. Led team.");

        let (reverted, _) = toggle_suggestion(&applied_buffer, &applied, 0, &s);
        assert_eq!(reverted, buffer);
    }

    #[test]
    fn test_deletion_reverts_after_earlier_edit_shifts_buffer() {
        let buffer = "SUMMARY\nEngineer.\n\nEXPERIENCE\n• Managed the platform team\n• Shipped billing\n• Ran on-call";
        let drop_line = suggestion("experience", Some("• Shipped billing\n"), "");
        let reword = suggestion("summary", Some("Engineer."), "Senior backend engineer.");

        let (buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 0, &drop_line);
        assert_eq!(
            buffer,
            "SUMMARY\nEngineer.\n\nEXPERIENCE\n• Managed the platform team\n• Ran on-call"
        );
        let (buffer, applied) = toggle_suggestion(&buffer, &applied, 1, &reword);
        let (buffer, applied) = toggle_suggestion(&buffer, &applied, 0, &drop_line);

        assert_eq!(
            buffer,
            "SUMMARY\nSenior backend engineer.\n\nEXPERIENCE\n• Managed the platform team\n• Shipped billing\n• Ran on-call"
        );
        assert_eq!(applied.indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_deletion_with_disturbed_anchor_reverts_as_noop() {
        let buffer = "SUMMARY\nEngineer.\n\nEXPERIENCE\n• Managed team\n• Shipped billing";
        let drop_line = suggestion("experience", Some("• Managed team\n"), "");
        let reword = suggestion(
            "summary",
            Some("Engineer."),
            "Senior backend engineer with 10 years.",
        );

        let (buffer, applied) = toggle_suggestion(buffer, &AppliedSet::new(), 0, &drop_line);
        let (reworded, applied) = toggle_suggestion(&buffer, &applied, 1, &reword);
        assert_eq!(
            reworded,
            "SUMMARY\nSenior backend engineer with 10 years.\n\nEXPERIENCE\n• Shipped billing"
        );

        // The text before the deleted line changed, so there is nowhere safe
        // to put it back.
        let (reverted, applied) = toggle_suggestion(&reworded, &applied, 0, &drop_line);
        assert_eq!(reverted, reworded);
        assert!(!applied.contains(0));
        assert!(applied.contains(1));
    }

    #[test]
    fn test_anchors_stop_at_char_boundaries() {
        let buffer = "ééééééééééX•••••••";
        let at = buffer.find('X').unwrap();
        let (before, after) = anchors_around(buffer, &(at..at + 1));
        assert!(before.len() <= ANCHOR_BYTES + 1 && before.chars().all(|c| c == 'é'));
        assert!(after.chars().all(|c| c == '•'));
        assert_eq!(after.len(), 18);
    }

    #[test]
    fn test_applied_set_serializes_as_index_map() {
        let s = suggestion("skills", None, "Go");
        let (_, applied) = toggle_suggestion("CV", &AppliedSet::new(), 2, &s);

        let json = serde_json::to_value(&applied).unwrap();
        assert_eq!(json["2"]["strategy"], "addition");

        let back: AppliedSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, applied);
    }
}
