//! The document model: an offset-indexed sequence of same-kind lines plus the
//! configuration they were produced under.
//!
//! All offsets are byte offsets into the concatenated canonical text of the lines.
//! Operations return new documents, except [`Document::splice`], which edits in place.
//! Lines that an operation does not cut keep their positions, so diagnostics can
//! always point back at the source.

mod line;

pub use line::{Indentation, Line, LineKind, Measured, Normalized, Position, Raw};

use crate::config::Configuration;
use crate::diagnostics::{Aborted, DiagnosticSink};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplaceError {
    /// Non-empty text cannot take the place of an empty region: it has no position.
    #[error("cannot replace an empty region with {len} bytes of text")]
    InvalidReplacement { len: usize },

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

/// A sequence of lines of kind `K`.
///
/// Zero-length lines are never stored, which keeps `offsets` strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<K> {
    lines: Vec<Line<K>>,
    config: Configuration,
    /// Prefix sums of line lengths; `offsets.len() == lines.len() + 1`.
    offsets: Vec<usize>,
}

impl<K: LineKind> Document<K> {
    pub fn new(lines: Vec<Line<K>>, config: Configuration) -> Self {
        let lines: Vec<Line<K>> = lines.into_iter().filter(|line| !line.is_empty()).collect();
        let mut offsets = Vec::with_capacity(lines.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for line in &lines {
            total += line.len();
            offsets.push(total);
        }
        Self { lines, config, offsets }
    }

    pub fn empty(config: Configuration) -> Self {
        Self::new(Vec::new(), config)
    }

    pub fn lines(&self) -> &[Line<K>] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Line<K>> {
        self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total length in bytes of the canonical text.
    pub fn len(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn with_config(self, config: Configuration) -> Self {
        Self { config, ..self }
    }

    /// Map a byte offset to `(line index, column)`.
    ///
    /// An offset on a line boundary maps to column 0 of the following line; the
    /// document length maps to `(line_count, 0)`.
    pub fn offset_of(&self, offset: usize) -> (usize, usize) {
        match self.offsets.binary_search(&offset) {
            Ok(line) => (line, 0),
            Err(next) => {
                let line = next.saturating_sub(1);
                (line, offset - self.offsets[line])
            }
        }
    }

    /// The sub-document covering `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        if start >= end {
            return Self::empty(self.config.clone());
        }

        let (first, first_col) = self.offset_of(start);
        let (last, last_col) = self.offset_of(end);
        let mut lines = Vec::with_capacity(last - first + 1);

        if first == last {
            lines.push(self.lines[first].slice(first_col, last_col));
        } else {
            let head = &self.lines[first];
            lines.push(head.slice(first_col, head.len()));
            lines.extend(self.lines[first + 1..last].iter().cloned());
            if last_col > 0 {
                lines.push(self.lines[last].slice(0, last_col));
            }
        }
        Self::new(lines, self.config.clone())
    }

    /// Lines of `self` followed by lines of `other`, keeping `self`'s configuration.
    pub fn concat(&self, other: &Self) -> Self {
        let mut lines = Vec::with_capacity(self.lines.len() + other.lines.len());
        lines.extend(self.lines.iter().cloned());
        lines.extend(other.lines.iter().cloned());
        Self::new(lines, self.config.clone())
    }

    /// Replace the region `[start, end)` with the lines of `replacement`, in place.
    ///
    /// Lines outside the region are moved, never cloned; a line the region cuts into
    /// keeps its uncut part with its position. Offsets are recomputed from the first
    /// touched line only.
    pub fn splice(&mut self, start: usize, end: usize, replacement: Self) {
        let end = end.min(self.len());
        let start = start.min(end);
        let (first, first_col) = self.offset_of(start);
        let (last, last_col) = self.offset_of(end);

        let mut middle = Vec::with_capacity(replacement.lines.len() + 2);
        if first_col > 0 {
            middle.push(self.lines[first].slice(0, first_col));
        }
        middle.extend(replacement.lines);
        let removed_end = if last_col > 0 {
            let tail = &self.lines[last];
            middle.push(tail.slice(last_col, tail.len()));
            last + 1
        } else {
            last
        };
        self.lines.splice(first..removed_end, middle);

        self.offsets.truncate(first + 1);
        let mut total = self.offsets[first];
        for line in &self.lines[first..] {
            total += line.len();
            self.offsets.push(total);
        }
    }

    /// The canonical text of the whole document.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.len());
        for line in &self.lines {
            line.kind.write_canonical(&mut out);
        }
        out
    }

    pub fn map<K2: LineKind>(&self, f: impl FnMut(&Line<K>) -> Line<K2>) -> Document<K2> {
        Document::new(self.lines.iter().map(f).collect(), self.config.clone())
    }

    pub fn try_map<K2: LineKind, E>(
        &self,
        f: impl FnMut(&Line<K>) -> Result<Line<K2>, E>,
    ) -> Result<Document<K2>, E> {
        let lines = self.lines.iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Document::new(lines, self.config.clone()))
    }
}

impl Document<Raw> {
    pub fn measure_whitespace(&self) -> Document<Measured> {
        self.map(Line::measure_whitespace)
    }
}

impl Document<Normalized> {
    pub fn render_with_tabs(&self) -> String {
        self.text()
    }

    pub fn render_with_spaces(&self, tabwidth: usize) -> String {
        let mut out = String::with_capacity(self.len());
        for line in &self.lines {
            out.push_str(&line.render_with_spaces(tabwidth));
        }
        out
    }

    /// Replace this whole document with `text`, keeping positions traceable.
    ///
    /// `text` is split after each `\n`. Every produced line is re-measured and
    /// normalized with this document's tabwidth, except a first line that does not
    /// start a physical line (`starts_line == false`): its leading whitespace is
    /// content, not indentation. Produced line `i` of `n` takes the position of line
    /// `floor(i * m / n)` of the `m` replaced lines.
    pub fn replace_region(
        &self,
        text: &str,
        starts_line: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self, ReplaceError> {
        if text.is_empty() {
            return Ok(Self::empty(self.config.clone()));
        }
        if self.is_empty() {
            return Err(ReplaceError::InvalidReplacement { len: text.len() });
        }

        let tabwidth = self.config.tabwidth();
        let pieces: Vec<&str> = text.split_inclusive('\n').collect();
        let (n, m) = (pieces.len(), self.lines.len());
        let mut lines = Vec::with_capacity(n);

        for (i, piece) in pieces.into_iter().enumerate() {
            let position = self.lines[(i * m / n).min(m - 1)].position.clone();
            let line = if i == 0 && !starts_line {
                Line::new(position, Normalized::new(0, piece))
            } else {
                Line::new(position, Measured::measure(piece)).apply_tabwidth_reported(tabwidth, sink)?
            };
            lines.push(line);
        }
        Ok(Self::new(lines, self.config.clone()))
    }
}
