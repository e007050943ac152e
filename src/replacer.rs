//! Macro expansion through `replace` directives.
//!
//! A directive is two lines behind the prefix:
//!
//! ```text
//! replace <pattern>
//! 	<template>
//! ```
//!
//! `replacelit` copies the template verbatim; plain `replace` turns `\t` and `\n`
//! in the template into a tab and a newline, then expands `$1` / `${name}` group
//! references. Patterns are compiled in extended mode, so whitespace in them is
//! insignificant and `#` starts a comment.
//!
//! Expansion runs as a state machine over the document:
//!
//! - scanning: find the first directive in the pending text and strip it
//! - rewriting: repeatedly rewrite the first match of the active pattern in the
//!   remainder; text before a match is final for this directive, the rewritten
//!   match is searched again together with the rest
//! - when the pattern stops matching, scanning starts over from the top, so
//!   rewrites may produce new directives
//!
//! Both loops are bounded. Unless pinned with [`Replacer::with_max_rewrites`] and
//! [`Replacer::with_max_directives`], the limits grow with the input: a directive may
//! rewrite [`REWRITES_PER_BYTE`] times per byte of text, a document may expand one
//! directive per line, and neither drops below the `DEFAULT_*` floors.
//!
//! Every rewrite goes through [`Document::replace_region`], so the produced lines keep
//! positions that point back into the original sources.

use crate::diagnostics::{self, Aborted, Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::document::{Document, Normalized, Position, ReplaceError};
use crate::utils::pattern::{Pattern, PatternCaptures, PatternFlags};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Body of a `replace` directive, matched behind the prefix.
pub const REPLACE_DIRECTIVE: &str = "replace(?P<lit>lit)?(?P<pattern>.+)\n\t(?P<template>.+)\n";

/// Floor of the rewrite budget of one directive.
pub const DEFAULT_MAX_REWRITES: usize = 10_000;

/// Rewrites allowed per byte of the text a directive starts on.
pub const REWRITES_PER_BYTE: usize = 2;

/// Floor of the directive budget of one document, counting directives produced by
/// rewrites.
pub const DEFAULT_MAX_DIRECTIVES: usize = 1_000;

/// A `replace` directive ready to apply.
#[derive(Debug)]
struct Directive {
    pattern: Pattern,
    template: String,
    literal: bool,
    position: Position,
}

impl Directive {
    /// Replacement text for one match.
    fn replacement(&self, captures: &PatternCaptures<'_>) -> String {
        if self.literal {
            self.template.clone()
        } else {
            captures.expand(&self.template.replace("\\t", "\t").replace("\\n", "\n"))
        }
    }
}

/// Progress of the active directive.
///
/// `document` holds the whole text. Everything before `cursor` is final as far as
/// this directive is concerned; the rest is the remainder it still searches.
struct Rewriting {
    directive: Directive,
    document: Document<Normalized>,
    /// Canonical text of `document`, kept in step with it.
    text: String,
    cursor: usize,
    rewrites: usize,
    budget: usize,
    seen: HashSet<u64>,
}

impl Rewriting {
    fn remainder(&self) -> &str {
        &self.text[self.cursor..]
    }
}

enum State {
    Scanning(Document<Normalized>),
    Rewriting(Rewriting),
    Done(Document<Normalized>),
}

impl State {
    /// The text as it stands, abandoning the active directive.
    fn into_document(self) -> Document<Normalized> {
        match self {
            State::Scanning(document) | State::Done(document) => document,
            State::Rewriting(rewriting) => rewriting.document,
        }
    }
}

/// Outcome of one rewrite attempt.
enum Step {
    Rewrote,
    NoMatch,
    /// The directive was stopped early and a diagnostic reported.
    Halted,
}

/// Applies `replace` directives with configurable loop limits.
///
/// An unset limit scales with the input.
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    max_rewrites: Option<usize>,
    max_directives: Option<usize>,
}

impl Replacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the rewrite budget of every directive.
    pub fn with_max_rewrites(mut self, max_rewrites: usize) -> Self {
        self.max_rewrites = Some(max_rewrites);
        self
    }

    /// Pin the number of directives a document may expand.
    pub fn with_max_directives(mut self, max_directives: usize) -> Self {
        self.max_directives = Some(max_directives);
        self
    }

    /// Expand every directive in `doc`. The directives themselves never reach the output.
    pub fn apply(&self, doc: &Document<Normalized>, sink: &mut dyn DiagnosticSink) -> Result<Document<Normalized>, Aborted> {
        let mut state = State::Scanning(doc.clone());
        let max_directives = self
            .max_directives
            .unwrap_or_else(|| DEFAULT_MAX_DIRECTIVES.max(doc.line_count()));
        let mut directives = 0;

        loop {
            state = match state {
                State::Scanning(pending) => match self.scan(pending, sink)? {
                    State::Done(document) => return Ok(document),
                    next => {
                        directives += 1;
                        if directives > max_directives {
                            let document = next.into_document();
                            let message = format!(
                                "More than {max_directives} replace directives; the rest are left unexpanded"
                            );
                            diagnostics::report(
                                sink,
                                Diagnostic::new(
                                    DiagnosticKind::NonTerminatingReplacement,
                                    message,
                                    document_origin(&document),
                                ),
                            )?;
                            return Ok(document);
                        }
                        next
                    }
                },
                State::Rewriting(rewriting) => self.rewrite(rewriting, sink)?,
                State::Done(document) => return Ok(document),
            };
        }
    }

    fn scan(&self, mut pending: Document<Normalized>, sink: &mut dyn DiagnosticSink) -> Result<State, Aborted> {
        let pattern = match pending.config().pattern_match(REPLACE_DIRECTIVE, PatternFlags::NONE) {
            Ok(pattern) => pattern,
            // Already reported while consuming config directives
            Err(_) => return Ok(State::Done(pending)),
        };
        let mut text = pending.text();
        let captures = match pattern.captures(&text) {
            Ok(Some(captures)) => captures,
            Ok(None) => return Ok(State::Done(pending)),
            Err(e) => {
                let position = document_origin(&pending);
                diagnostics::report(
                    sink,
                    Diagnostic::new(DiagnosticKind::PatternExecutionError, e.to_string(), position),
                )?;
                return Ok(State::Done(pending));
            }
        };

        let (start, end) = (captures.start(), captures.end());
        let position = position_at(&pending, start);
        let source = captures.name("pattern").unwrap_or_default().to_string();
        let literal = captures.name("lit").is_some();
        let template = captures.name("template").unwrap_or_default().to_string();

        let config = pending.config().clone();
        pending.splice(start, end, Document::empty(config));
        text.replace_range(start..end, "");

        let pattern = match Pattern::compile(&source, PatternFlags::EXTENDED) {
            Ok(pattern) => pattern,
            Err(e) => {
                diagnostics::report(
                    sink,
                    Diagnostic::new(
                        DiagnosticKind::PatternSyntaxError,
                        format!("Invalid replace pattern '{}'", source.trim()),
                        position,
                    )
                    .with_cause(&e),
                )?;
                return Ok(State::Scanning(pending));
            }
        };
        log::debug!(
            "[eredmel-replace] {position}: replace{} /{}/",
            if literal { "lit" } else { "" },
            pattern.as_str().trim()
        );

        let budget = self
            .max_rewrites
            .unwrap_or_else(|| DEFAULT_MAX_REWRITES.max(text.len().saturating_mul(REWRITES_PER_BYTE)));
        Ok(State::Rewriting(Rewriting {
            directive: Directive {
                pattern,
                template,
                literal,
                position,
            },
            document: pending,
            text,
            cursor: 0,
            rewrites: 0,
            budget,
            seen: HashSet::new(),
        }))
    }

    fn rewrite(&self, mut state: Rewriting, sink: &mut dyn DiagnosticSink) -> Result<State, Aborted> {
        match self.step(&mut state, sink)? {
            Step::Rewrote => Ok(State::Rewriting(state)),
            Step::NoMatch | Step::Halted => {
                log::debug!(
                    "[eredmel-replace] {}: done after {} rewrites",
                    state.directive.position,
                    state.rewrites
                );
                Ok(State::Scanning(state.document))
            }
        }
    }

    /// Rewrite the first match in the remainder.
    fn step(&self, state: &mut Rewriting, sink: &mut dyn DiagnosticSink) -> Result<Step, Aborted> {
        let position = state.directive.position.clone();
        let (start, end, replacement) = {
            let captures = match state.directive.pattern.captures(state.remainder()) {
                Ok(Some(captures)) => captures,
                Ok(None) => return Ok(Step::NoMatch),
                Err(e) => {
                    diagnostics::report(
                        sink,
                        Diagnostic::new(
                            DiagnosticKind::PatternExecutionError,
                            "Replace pattern failed while matching",
                            position,
                        )
                        .with_cause(&e),
                    )?;
                    return Ok(Step::Halted);
                }
            };
            let replacement = state.directive.replacement(&captures);
            (state.cursor + captures.start(), state.cursor + captures.end(), replacement)
        };

        if start == end {
            let (kind, message) = if replacement.is_empty() {
                (
                    DiagnosticKind::NonTerminatingReplacement,
                    "Pattern matches the empty string and would rewrite forever".to_string(),
                )
            } else {
                (
                    DiagnosticKind::InvalidReplacement,
                    format!("Cannot insert {} bytes at an empty match", replacement.len()),
                )
            };
            diagnostics::report(sink, Diagnostic::new(kind, message, position))?;
            return Ok(Step::Halted);
        }

        state.rewrites += 1;
        if state.rewrites > state.budget {
            let message = format!("Still matching after {} rewrites", state.budget);
            diagnostics::report(
                sink,
                Diagnostic::new(DiagnosticKind::NonTerminatingReplacement, message, position),
            )?;
            return Ok(Step::Halted);
        }

        let starts_line = start == 0 || state.text.as_bytes()[start - 1] == b'\n';
        let rewritten = match state.document.slice(start, end).replace_region(&replacement, starts_line, sink) {
            Ok(rewritten) => rewritten,
            Err(ReplaceError::Aborted(aborted)) => return Err(aborted),
            Err(e @ ReplaceError::InvalidReplacement { .. }) => {
                diagnostics::report(
                    sink,
                    Diagnostic::new(DiagnosticKind::InvalidReplacement, e.to_string(), position),
                )?;
                return Ok(Step::Halted);
            }
        };

        // Text before the match is final; the rewritten match is searched again
        let rewritten_text = rewritten.text();
        state.document.splice(start, end, rewritten);
        state.text.replace_range(start..end, &rewritten_text);

        // A cycle repeats its remainder at one cursor
        if start != state.cursor {
            state.cursor = start;
            state.seen.clear();
        } else if !state.seen.insert(fingerprint(state.remainder())) {
            diagnostics::report(
                sink,
                Diagnostic::new(
                    DiagnosticKind::NonTerminatingReplacement,
                    "Rewriting cycles back to an earlier text",
                    position,
                ),
            )?;
            return Ok(Step::Halted);
        }
        Ok(Step::Rewrote)
    }
}

/// Expand every `replace` directive in `doc` with the default limits.
pub fn apply_replaces(doc: &Document<Normalized>, sink: &mut dyn DiagnosticSink) -> Result<Document<Normalized>, Aborted> {
    Replacer::default().apply(doc, sink)
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

fn position_at(doc: &Document<Normalized>, offset: usize) -> Position {
    let (line, _) = doc.offset_of(offset);
    let line = line.min(doc.line_count().saturating_sub(1));
    doc.lines()[line].position.clone()
}

fn document_origin(doc: &Document<Normalized>) -> Position {
    doc.lines().first().map_or_else(
        || Position::whole_file(Path::new("<empty>")),
        |line| Position::whole_file(line.position.source.clone()),
    )
}
