//! Output formatting module for eredmel
//!
//! Diagnostics are written through an [`OutputFormatter`] by a [`WriterSink`], which
//! plugs into the preprocessing pipeline as its [`DiagnosticSink`].

use crate::diagnostics::{Diagnostic, DiagnosticSink, Flow, Severity};
use std::io::{self, Write};
use std::str::FromStr;

pub mod formatters;

// Re-export formatters
pub use formatters::*;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format one diagnostic, without a trailing newline
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;

    /// Batched formatters only produce output once all diagnostics are known
    fn is_batched(&self) -> bool {
        false
    }

    /// Format every diagnostic of a run at once
    fn format_batch(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether this formatter should use colors
    fn use_colors(&self) -> bool {
        false
    }
}

/// Available output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors and the cause on its own line
    Text,
    /// Concise format: file:line: [SEVERITY] Kind: message
    Concise,
    /// JSON array of all diagnostics
    Json,
    /// JSON Lines format (one JSON object per line)
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "full" => Ok(OutputFormat::Text),
            "concise" => Ok(OutputFormat::Concise),
            "json" => Ok(OutputFormat::Json),
            "json-lines" | "jsonlines" => Ok(OutputFormat::JsonLines),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl OutputFormat {
    /// Create a formatter instance for this format
    pub fn create_formatter(&self, use_colors: bool) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Text if use_colors => Box::new(TextFormatter::new()),
            OutputFormat::Text => Box::new(TextFormatter::without_colors()),
            OutputFormat::Concise => Box::new(ConciseFormatter::new()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::JsonLines => Box::new(JsonLinesFormatter::new()),
        }
    }
}

/// Sink that formats diagnostics onto a writer.
///
/// Diagnostics below the display threshold are not written but still count towards
/// [`WriterSink::worst_severity`]. Batched formats are written by [`WriterSink::finish`].
pub struct WriterSink<W: Write> {
    writer: W,
    formatter: Box<dyn OutputFormatter>,
    min_severity: Severity,
    stop_at: Option<Severity>,
    worst: Option<Severity>,
    written: usize,
    pending: Vec<Diagnostic>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            writer,
            formatter,
            min_severity: Severity::Debug,
            stop_at: None,
            worst: None,
            written: 0,
            pending: Vec::new(),
        }
    }

    /// Only write diagnostics at or above `severity`.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Ask the pipeline to stop on the first diagnostic at or above `severity`.
    pub fn stopping_at(mut self, severity: Option<Severity>) -> Self {
        self.stop_at = severity;
        self
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.worst
    }

    /// Number of diagnostics written or queued for writing.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush batched output and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.formatter.is_batched() {
            let output = self.formatter.format_batch(&self.pending);
            writeln!(self.writer, "{output}")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<Flow> {
        self.worst = self.worst.max(Some(diagnostic.severity));

        if diagnostic.severity >= self.min_severity {
            self.written += 1;
            if self.formatter.is_batched() {
                self.pending.push(diagnostic.clone());
            } else {
                writeln!(self.writer, "{}", self.formatter.format_diagnostic(diagnostic))?;
            }
        }

        match self.stop_at {
            Some(threshold) if diagnostic.severity >= threshold => Ok(Flow::Stop),
            _ => Ok(Flow::Continue),
        }
    }
}
