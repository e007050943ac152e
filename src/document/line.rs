//! Line variants and source positions.
//!
//! Every line of a document is exactly one of three kinds:
//!
//! - [`Raw`]: text as read from disk, including its trailing `\n`
//! - [`Measured`]: leading whitespace split into spaces then tabs, followed by the rest
//! - [`Normalized`]: an indentation level in tab units followed by content
//!
//! Each kind has a canonical text (what the line contributes to the document's text)
//! and all offsets are byte offsets into that canonical text.
//!
//! The kinds are separate types implementing [`LineKind`] rather than variants of one
//! enum. A [`Line`] carries its kind as a type parameter, and so does
//! [`Document`](super::Document): a document never mixes kinds, and each pipeline
//! stage states in its signature which kind it takes and returns. Converting between
//! kinds goes through `Document::map` and `Document::try_map`.

use crate::diagnostics::{self, Aborted, Diagnostic, DiagnosticSink, Severity};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Source file and 1-based line number. Line 0 stands for the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub source: Arc<Path>,
    pub line: usize,
}

impl Position {
    pub fn new(source: impl Into<Arc<Path>>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }

    pub fn whole_file(source: impl Into<Arc<Path>>) -> Self {
        Self::new(source, 0)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.source.display())
        } else {
            write!(f, "{}:{}", self.source.display(), self.line)
        }
    }
}

/// Behavior shared by the three line variants.
pub trait LineKind: Clone + fmt::Debug + PartialEq {
    /// Length in bytes of the canonical text.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The part of the canonical text in `[start, end)`, as the same variant.
    ///
    /// Callers guarantee `start <= end <= len()`.
    fn slice(&self, start: usize, end: usize) -> Self;

    /// Append the canonical text to `out`.
    fn write_canonical(&self, out: &mut String);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    pub text: String,
}

impl Raw {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl LineKind for Raw {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        Raw::new(&self.text[start..end])
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str(&self.text);
    }
}

/// Leading whitespace as counts. The canonical text puts all spaces before all tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measured {
    pub spaces: usize,
    pub tabs: usize,
    pub rest: String,
}

/// Result of converting leading whitespace to a tab level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indentation {
    pub level: usize,
    /// Set when the space count was not a multiple of the tabwidth.
    pub rounding: Option<Severity>,
}

impl Measured {
    /// Split leading whitespace off `text`, counting spaces and tabs independently of
    /// their order.
    pub fn measure(text: &str) -> Self {
        let mut spaces = 0;
        let mut tabs = 0;
        let mut rest_start = text.len();
        for (i, c) in text.char_indices() {
            match c {
                ' ' => spaces += 1,
                '\t' => tabs += 1,
                _ => {
                    rest_start = i;
                    break;
                }
            }
        }
        Self {
            spaces,
            tabs,
            rest: text[rest_start..].to_string(),
        }
    }

    fn whitespace_len(&self) -> usize {
        self.spaces + self.tabs
    }

    /// Spaces are rounded half-up to whole tabs, then added to the tab count.
    pub fn indentation(&self, tabwidth: usize) -> Indentation {
        let tabwidth = tabwidth.max(1);
        let level = (self.spaces + tabwidth / 2) / tabwidth + self.tabs;
        let remainder = self.spaces % tabwidth;
        let rounding = (remainder != 0).then(|| {
            let distance = remainder as f64 / tabwidth as f64;
            if !(0.25..=0.75).contains(&distance) {
                Severity::Low
            } else {
                Severity::Med
            }
        });
        Indentation { level, rounding }
    }
}

fn overlap(start: usize, end: usize, lo: usize, hi: usize) -> usize {
    end.min(hi).saturating_sub(start.max(lo))
}

impl LineKind for Measured {
    fn len(&self) -> usize {
        self.whitespace_len() + self.rest.len()
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        let ws = self.whitespace_len();
        let rest = if end > ws {
            self.rest[start.max(ws) - ws..end - ws].to_string()
        } else {
            String::new()
        };
        Measured {
            spaces: overlap(start, end, 0, self.spaces),
            tabs: overlap(start, end, self.spaces, ws),
            rest,
        }
    }

    fn write_canonical(&self, out: &mut String) {
        out.extend(std::iter::repeat_n(' ', self.spaces));
        out.extend(std::iter::repeat_n('\t', self.tabs));
        out.push_str(&self.rest);
    }
}

/// An indentation level in tab units and the content after it.
/// The canonical text is `level` tabs followed by the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub level: usize,
    pub content: String,
}

impl Normalized {
    pub fn new(level: usize, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }

    pub fn render_with_tabs(&self) -> String {
        let mut out = String::with_capacity(self.len());
        self.write_canonical(&mut out);
        out
    }

    pub fn render_with_spaces(&self, tabwidth: usize) -> String {
        let mut out = " ".repeat(self.level * tabwidth);
        out.push_str(&self.content);
        out
    }
}

impl LineKind for Normalized {
    fn len(&self) -> usize {
        self.level + self.content.len()
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        let level = self.level;
        if start < level {
            let content = if end > level { &self.content[..end - level] } else { "" };
            Normalized::new(end.min(level) - start, content)
        } else {
            Normalized::new(0, &self.content[start - level..end - level])
        }
    }

    fn write_canonical(&self, out: &mut String) {
        out.extend(std::iter::repeat_n('\t', self.level));
        out.push_str(&self.content);
    }
}

/// A line of some kind together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<K> {
    pub position: Position,
    pub kind: K,
}

impl<K: LineKind> Line<K> {
    pub fn new(position: Position, kind: K) -> Self {
        Self { position, kind }
    }

    pub fn len(&self) -> usize {
        self.kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }

    /// Sub-line over `[start, end)` of the canonical text. The position is kept.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Line::new(self.position.clone(), self.kind.slice(start, end))
    }

    pub fn canonical(&self) -> String {
        let mut out = String::with_capacity(self.len());
        self.kind.write_canonical(&mut out);
        out
    }
}

impl Line<Raw> {
    pub fn measure_whitespace(&self) -> Line<Measured> {
        Line::new(self.position.clone(), Measured::measure(&self.kind.text))
    }
}

impl Line<Measured> {
    /// Convert to a normalized line, returning how the spaces were rounded.
    pub fn apply_tabwidth(&self, tabwidth: usize) -> (Line<Normalized>, Indentation) {
        let indentation = self.kind.indentation(tabwidth);
        let line = Line::new(
            self.position.clone(),
            Normalized::new(indentation.level, self.kind.rest.clone()),
        );
        (line, indentation)
    }

    /// Like [`Line::apply_tabwidth`], reporting an `IndentationRoundingWarning` when
    /// the spaces did not divide evenly.
    pub fn apply_tabwidth_reported(
        &self,
        tabwidth: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Line<Normalized>, Aborted> {
        let (line, indentation) = self.apply_tabwidth(tabwidth);
        if let Some(severity) = indentation.rounding {
            diagnostics::report(
                sink,
                Diagnostic::indentation_rounded(self.kind.spaces, tabwidth, severity, self.position.clone()),
            )?;
        }
        Ok(line)
    }
}

impl Line<Normalized> {
    pub fn render_with_tabs(&self) -> String {
        self.kind.render_with_tabs()
    }

    pub fn render_with_spaces(&self, tabwidth: usize) -> String {
        self.kind.render_with_spaces(tabwidth)
    }
}
