//! Inserting and removing skills / ATS keywords in free-form résumé text.

use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::sections::{Section, SectionKind, SectionLocator};
use crate::editor::{ensure_content, EditorError};

/// Bullet used when a list has to be started from scratch.
pub const DEFAULT_BULLET: char = '•';

const BULLET_CHARS: &[char] = &['•', '-', '*'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    #[default]
    Skill,
    /// ATS keyword: may land in the summary when there is no skills section.
    Keyword,
}

/// Where `add_term` put the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    AlreadyPresent,
    SkillsSection,
    SummarySentence,
    NewSkillsSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInsertion {
    pub buffer: String,
    pub placement: Placement,
}

/// Delimiter style observed in an existing skills section.
#[derive(Debug, PartialEq, Eq)]
enum ListStyle {
    /// Leading text of a bullet line up to the item, e.g. `"  - "`.
    Bullet(String),
    /// Bullet used as a separator within a line, e.g. `Python • SQL`.
    InlineBullet(char),
    Comma,
    Pipe,
    Lines,
}

pub fn add_term(
    locator: &dyn SectionLocator,
    buffer: &str,
    term: &str,
    kind: TermKind,
) -> Result<TermInsertion, EditorError> {
    ensure_content(buffer)?;
    let term = term.trim();

    if buffer.to_lowercase().contains(&term.to_lowercase()) {
        debug!(term, "term already present in résumé");
        return Ok(TermInsertion {
            buffer: buffer.to_string(),
            placement: Placement::AlreadyPresent,
        });
    }

    if let Some(section) = locator.locate(buffer, SectionKind::Skills) {
        return Ok(TermInsertion {
            buffer: append_to_list(buffer, &section, term),
            placement: Placement::SkillsSection,
        });
    }

    if kind == TermKind::Keyword {
        if let Some(section) = locator.locate(buffer, SectionKind::Summary) {
            return Ok(TermInsertion {
                buffer: append_summary_clause(buffer, &section, term),
                placement: Placement::SummarySentence,
            });
        }
    }

    Ok(TermInsertion {
        buffer: insert_skills_section(locator, buffer, term),
        placement: Placement::NewSkillsSection,
    })
}

fn append_to_list(buffer: &str, section: &Section, term: &str) -> String {
    if section.is_empty() {
        let at = section.heading.end;
        return splice(buffer, at..at, &format!("\n{DEFAULT_BULLET} {term}"));
    }

    let addition = match detect_list_style(&buffer[section.body.clone()]) {
        ListStyle::Bullet(prefix) => format!("\n{prefix}{term}"),
        ListStyle::InlineBullet(bullet) => format!(" {bullet} {term}"),
        ListStyle::Comma => format!(", {term}"),
        ListStyle::Pipe => format!(" | {term}"),
        ListStyle::Lines => format!("\n{term}"),
    };
    let at = section.body.end;
    splice(buffer, at..at, &addition)
}

/// Bullets win over commas, commas over pipes. For bullets the prefix of the
/// last bullet line is reused so indentation and spacing carry over. A bullet
/// flanked by spaces mid-line counts as an inline separator.
fn detect_list_style(body: &str) -> ListStyle {
    let bullet_prefix = body.lines().rev().find_map(|line| {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        let bullet = rest.chars().next().filter(|c| BULLET_CHARS.contains(c))?;
        let after = &rest[bullet.len_utf8()..];
        let gap = after.len() - after.trim_start().len();
        let gap = if gap == 0 { " " } else { &after[..gap] };
        Some(format!("{}{bullet}{gap}", &line[..indent]))
    });

    let inline_bullet = || {
        BULLET_CHARS.iter().copied().find(|bullet| {
            let separator = format!(" {bullet} ");
            body.lines().any(|line| line.trim().contains(&separator))
        })
    };

    match bullet_prefix {
        Some(prefix) => ListStyle::Bullet(prefix),
        None => match inline_bullet() {
            Some(bullet) => ListStyle::InlineBullet(bullet),
            None if body.contains(',') => ListStyle::Comma,
            None if body.contains('|') => ListStyle::Pipe,
            None => ListStyle::Lines,
        },
    }
}

fn append_summary_clause(buffer: &str, section: &Section, term: &str) -> String {
    if section.is_empty() {
        let at = section.heading.end;
        return splice(buffer, at..at, &format!("\nExperienced in {term}."));
    }

    let body = buffer[section.body.clone()].trim_end();
    let at = section.body.start + body.len();
    let clause = match body.chars().last() {
        Some('.' | '!' | '?') => format!(" Experienced in {term}."),
        _ => format!(". Experienced in {term}."),
    };
    splice(buffer, at..at, &clause)
}

/// Creates `SKILLS` after the summary, else before the experience section,
/// else at the end of the buffer.
fn insert_skills_section(locator: &dyn SectionLocator, buffer: &str, term: &str) -> String {
    let block = format!("SKILLS\n{DEFAULT_BULLET} {term}");

    if let Some(summary) = locator.locate(buffer, SectionKind::Summary) {
        let at = summary.body.end;
        return splice(buffer, at..at, &format!("\n\n{block}"));
    }

    if let Some(experience) = locator.locate(buffer, SectionKind::Experience) {
        let at = experience.heading.start;
        return splice(buffer, at..at, &format!("{block}\n\n"));
    }

    format!("{buffer}\n\n{block}")
}

/// Removes every bullet line, list item or bare occurrence of `term`, then tidies
/// up the blank lines and double spaces left behind.
pub fn remove_term(buffer: &str, term: &str) -> Result<String, EditorError> {
    ensure_content(buffer)?;
    let term = term.trim();
    if term.is_empty() {
        return Ok(buffer.to_string());
    }

    let escaped = regex::escape(term);
    let (lead, trail) = word_boundaries(term);
    let patterns = [
        format!(r"(?im)^[ \t]*[•*\-][ \t]*{escaped}{trail}[ \t]*(?:\r?\n|$)"),
        format!(r"(?i),[ \t]*{escaped}{trail}"),
        format!(r"(?i){lead}{escaped}[ \t]*,[ \t]*"),
        format!(r"(?i)[ \t]*\|[ \t]*{escaped}{trail}"),
        format!(r"(?i){lead}{escaped}[ \t]*\|[ \t]*"),
        format!(r"(?i)[ \t]+[•*\-][ \t]+{escaped}{trail}"),
        format!(r"(?i){lead}{escaped}[ \t]+[•*\-][ \t]+"),
        format!(r"(?i){lead}{escaped}{trail}"),
    ];

    let mut out = buffer.to_string();
    for pattern in &patterns {
        out = Regex::new(pattern)?.replace_all(&out, "").into_owned();
    }

    let out = Regex::new(r"\n{3,}")?.replace_all(&out, "\n\n");
    let out = Regex::new(r" {2,}")?.replace_all(&out, " ");
    Ok(out.into_owned())
}

/// `\b` only makes sense next to word characters: `C++` or `.NET` must still
/// match at their symbol edges.
fn word_boundaries(term: &str) -> (&'static str, &'static str) {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(term.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(term.chars().last()) { r"\b" } else { "" };
    (lead, trail)
}

fn splice(buffer: &str, span: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(buffer.len() + replacement.len());
    out.push_str(&buffer[..span.start]);
    out.push_str(replacement);
    out.push_str(&buffer[span.end..]);
    out
}
