//! Section detection over free-form résumé text.
//!
//! Résumés arrive as plain text with no schema. `HeadingLocator` finds sections
//! by recognising well-known heading lines. A structured résumé model can
//! implement `SectionLocator` and be handed to the editor instead, without
//! touching any call site.

use std::ops::Range;

/// Headings that open a skills-type section.
pub const SKILLS_HEADINGS: &[&str] = &[
    "SKILLS",
    "TECHNICAL SKILLS",
    "CORE COMPETENCIES",
    "KEY SKILLS",
    "EXPERTISE",
    "COMPETENCIES",
];

/// Headings that open a summary-type section (keyword fallback target).
pub const SUMMARY_HEADINGS: &[&str] = &["SUMMARY", "PROFILE", "OBJECTIVE", "PROFESSIONAL SUMMARY"];

/// Headings used as an anchor when a new SKILLS section has to be created.
pub const EXPERIENCE_HEADINGS: &[&str] = &["EXPERIENCE", "WORK EXPERIENCE", "EMPLOYMENT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Skills,
    Summary,
    Experience,
}

impl SectionKind {
    pub fn headings(self) -> &'static [&'static str] {
        match self {
            SectionKind::Skills => SKILLS_HEADINGS,
            SectionKind::Summary => SUMMARY_HEADINGS,
            SectionKind::Experience => EXPERIENCE_HEADINGS,
        }
    }
}

/// A located section, expressed as byte ranges into the buffer it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The heading line, without its line terminator.
    pub heading: Range<usize>,
    /// From the first to the last content line of the body. When the heading
    /// has nothing beneath it this is empty and sits at `heading.end`.
    pub body: Range<usize>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Finds a section of the requested kind in a résumé buffer.
///
/// Carried by `ResumeTextEditor` as `Arc<dyn SectionLocator>`.
pub trait SectionLocator: Send + Sync {
    fn locate(&self, buffer: &str, kind: SectionKind) -> Option<Section>;
}

/// Heuristic locator: a heading is a line consisting only of a known heading
/// (case-insensitive), optionally followed by a colon.
///
/// The body runs until the first blank line after some content, the next
/// recognised heading, or the end of the buffer. A summary may span several
/// paragraphs, so its body only ends at the next heading-like line (see
/// `looks_like_heading`) or the end of the buffer. Only the first matching
/// heading is considered.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingLocator;

impl SectionLocator for HeadingLocator {
    fn locate(&self, buffer: &str, kind: SectionKind) -> Option<Section> {
        let lines: Vec<Line<'_>> = split_lines(buffer).collect();
        let idx = lines
            .iter()
            .position(|line| heading_kind(line.text) == Some(kind))?;
        let heading = lines[idx].start..lines[idx].end;

        let mut body_start = None;
        let mut body_end = heading.end;
        let spans_paragraphs = kind == SectionKind::Summary;
        for line in &lines[idx + 1..] {
            if heading_kind(line.text).is_some()
                || (spans_paragraphs && looks_like_heading(line.text))
            {
                break;
            }
            if line.text.trim().is_empty() {
                if body_start.is_some() && !spans_paragraphs {
                    break;
                }
                continue;
            }
            body_start.get_or_insert(line.start);
            body_end = line.end;
        }

        let body = match body_start {
            Some(start) => start..body_end,
            None => heading.end..heading.end,
        };

        Some(Section { heading, body })
    }
}

/// Classifies a single line as a recognised heading.
pub fn heading_kind(line: &str) -> Option<SectionKind> {
    let text = line.trim();
    let text = text.strip_suffix(':').unwrap_or(text).trim_end();
    if text.is_empty() {
        return None;
    }

    [
        SectionKind::Skills,
        SectionKind::Summary,
        SectionKind::Experience,
    ]
    .into_iter()
    .find(|kind| {
        kind.headings()
            .iter()
            .any(|heading| heading.eq_ignore_ascii_case(text))
    })
}

/// Recognised headings plus short all-caps lines such as `EDUCATION` or
/// `PROJECTS & AWARDS`.
pub fn looks_like_heading(line: &str) -> bool {
    if heading_kind(line).is_some() {
        return true;
    }
    let text = line.trim();
    let text = text.strip_suffix(':').unwrap_or(text).trim_end();
    text.chars().count() <= 40
        && text.chars().filter(|c| c.is_alphabetic()).count() >= 4
        && text
            .chars()
            .all(|c| c.is_uppercase() || matches!(c, ' ' | '&' | '/' | '-'))
}

struct Line<'a> {
    start: usize,
    /// End of the line content, excluding `\r\n` / `\n`.
    end: usize,
    text: &'a str,
}

fn split_lines(buffer: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    buffer.split('\n').map(move |raw| {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        let line = Line {
            start: offset,
            end: offset + text.len(),
            text,
        };
        offset += raw.len() + 1;
        line
    })
}
