//! Diagnostics produced while preprocessing: severities, the diagnostic taxonomy,
//! the sink trait that receives them and the early-abort protocol.
//!
//! Library code never prints or exits. Every pipeline stage takes a
//! `&mut dyn DiagnosticSink` and hands each diagnostic to [`report`], which turns a
//! `Flow::Stop` answer (or a FATAL diagnostic) into an [`Aborted`] error that the
//! caller propagates with `?`.

use crate::document::Position;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Diagnostic severity, totally ordered from `Debug` to `Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Low,
    Med,
    High,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Low => "LOW",
            Severity::Med => "MED",
            Severity::High => "HIGH",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "low" => Ok(Severity::Low),
            "med" | "medium" => Ok(Severity::Med),
            "high" => Ok(Severity::High),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(format!("Unknown severity: {s} (expected debug, low, med, high or fatal)")),
        }
    }
}

/// What went wrong. Each kind has a fixed default severity, see [`DiagnosticKind::severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MissingFile,
    ErrorLoadingFile,
    CircularInclusion,
    UnresolvedInclusionPath,
    UnknownConfigKey,
    InvalidConfigValue,
    TabwidthInferenceWarning,
    IndentationRoundingWarning,
    PatternSyntaxError,
    PatternExecutionError,
    InvalidReplacement,
    NonTerminatingReplacement,
    DiagnosticSinkFailure,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::MissingFile => "MissingFile",
            DiagnosticKind::ErrorLoadingFile => "ErrorLoadingFile",
            DiagnosticKind::CircularInclusion => "CircularInclusion",
            DiagnosticKind::UnresolvedInclusionPath => "UnresolvedInclusionPath",
            DiagnosticKind::UnknownConfigKey => "UnknownConfigKey",
            DiagnosticKind::InvalidConfigValue => "InvalidConfigValue",
            DiagnosticKind::TabwidthInferenceWarning => "TabwidthInferenceWarning",
            DiagnosticKind::IndentationRoundingWarning => "IndentationRoundingWarning",
            DiagnosticKind::PatternSyntaxError => "PatternSyntaxError",
            DiagnosticKind::PatternExecutionError => "PatternExecutionError",
            DiagnosticKind::InvalidReplacement => "InvalidReplacement",
            DiagnosticKind::NonTerminatingReplacement => "NonTerminatingReplacement",
            DiagnosticKind::DiagnosticSinkFailure => "DiagnosticSinkFailure",
        }
    }

    /// Default severity. Indentation rounding is the exception: its severity
    /// depends on how far off the space count was and is chosen at the call site.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::TabwidthInferenceWarning | DiagnosticKind::IndentationRoundingWarning => Severity::Med,
            DiagnosticKind::DiagnosticSinkFailure => Severity::Fatal,
            _ => Severity::High,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single message about the input, anchored at the position that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub position: Position,
    pub cause: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            position,
            cause: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the error chain of `error` as the cause.
    pub fn with_cause(mut self, error: &dyn std::error::Error) -> Self {
        let mut chain = error.to_string();
        let mut source = error.source();
        while let Some(inner) = source {
            chain.push_str(": ");
            chain.push_str(&inner.to_string());
            source = inner.source();
        }
        self.cause = Some(chain);
        self
    }

    pub fn missing_file(path: &Path) -> Self {
        Self::new(
            DiagnosticKind::MissingFile,
            format!("File {} does not exist", path.display()),
            Position::whole_file(path),
        )
    }

    pub fn error_loading_file(path: &Path, error: &io::Error) -> Self {
        Self::new(
            DiagnosticKind::ErrorLoadingFile,
            format!("Error loading file {}", path.display()),
            Position::whole_file(path),
        )
        .with_cause(error)
    }

    /// `chain` runs from the first occurrence of the repeated file to the file again.
    pub fn circular_inclusion(chain: &[PathBuf], position: Position) -> Self {
        let mut message = String::from("Circular inclusion:");
        for file in chain {
            message.push_str("\n\t");
            message.push_str(&file.display().to_string());
        }
        Self::new(DiagnosticKind::CircularInclusion, message, position)
    }

    pub fn unresolved_inclusion(relative: &str, position: Position) -> Self {
        Self::new(
            DiagnosticKind::UnresolvedInclusionPath,
            format!("Unresolved inclusion: file {relative} not found"),
            position,
        )
    }

    pub fn unknown_config_key(key: &str, position: Position) -> Self {
        Self::new(
            DiagnosticKind::UnknownConfigKey,
            format!("Unknown configuration setting '{key}'"),
            position,
        )
    }

    pub fn invalid_config_value(key: &str, value: &str, position: Position) -> Self {
        Self::new(
            DiagnosticKind::InvalidConfigValue,
            format!("Invalid value '{value}' for configuration setting '{key}'; the default is kept"),
            position,
        )
    }

    pub fn tabwidth_inferred(tabwidth: usize, position: Position) -> Self {
        Self::new(
            DiagnosticKind::TabwidthInferenceWarning,
            format!("No tabwidth declared; guessed a tabwidth of {tabwidth} from the indentation"),
            position,
        )
    }

    pub fn indentation_rounded(spaces: usize, tabwidth: usize, severity: Severity, position: Position) -> Self {
        Self::new(
            DiagnosticKind::IndentationRoundingWarning,
            format!("The number of spaces {spaces} is not a multiple of the tabwidth {tabwidth} and will be rounded"),
            position,
        )
        .with_severity(severity)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}: {}", self.position, self.severity, self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

/// What a sink wants the pipeline to do after receiving a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives diagnostics from the pipeline.
///
/// An `Err` means the sink itself failed to deliver the diagnostic; the pipeline
/// then reports a FATAL `DiagnosticSinkFailure` and aborts.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<Flow>;
}

/// The pipeline was stopped, either by the sink or by a FATAL diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("preprocessing aborted by {kind} ({severity}) at {position}")]
pub struct Aborted {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub position: Position,
}

impl Aborted {
    fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            kind: diagnostic.kind,
            severity: diagnostic.severity,
            position: diagnostic.position.clone(),
        }
    }
}

/// Deliver `diagnostic` to `sink` and translate the answer into control flow.
pub fn report(sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) -> Result<(), Aborted> {
    log::debug!(
        "[eredmel] {} {} at {}: {}",
        diagnostic.severity,
        diagnostic.kind,
        diagnostic.position,
        diagnostic.message
    );

    match sink.emit(&diagnostic) {
        Ok(Flow::Continue) if diagnostic.severity < Severity::Fatal => Ok(()),
        Ok(_) => Err(Aborted::from_diagnostic(&diagnostic)),
        Err(error) => {
            let failure = Diagnostic::new(
                DiagnosticKind::DiagnosticSinkFailure,
                format!("Error while reporting {}", diagnostic.kind),
                diagnostic.position.clone(),
            )
            .with_cause(&error);
            // Best effort: the sink already failed once, so a second failure is only logged.
            if let Err(second) = sink.emit(&failure) {
                log::error!("[eredmel] diagnostic sink failed twice: {second}");
            }
            Err(Aborted::from_diagnostic(&failure))
        }
    }
}

/// Sink that keeps every diagnostic in memory.
///
/// With [`DiagnosticCollector::stopping_at`] it asks the pipeline to stop on the first
/// diagnostic at or above the given severity, which is how tests assert that a stage
/// bails out early.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    stop_at: Option<Severity>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_at(severity: Severity) -> Self {
        Self {
            diagnostics: Vec::new(),
            stop_at: Some(severity),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<Flow> {
        self.diagnostics.push(diagnostic.clone());
        match self.stop_at {
            Some(threshold) if diagnostic.severity >= threshold => Ok(Flow::Stop),
            _ => Ok(Flow::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink {
        attempts: usize,
    }

    impl DiagnosticSink for FailingSink {
        fn emit(&mut self, _diagnostic: &Diagnostic) -> io::Result<Flow> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn position() -> Position {
        Position::new(Path::new("a.edmh"), 3)
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Low);
        assert!(Severity::Low < Severity::Med);
        assert!(Severity::Med < Severity::High);
        assert!(Severity::High < Severity::Fatal);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
        assert_eq!("MEDIUM".parse::<Severity>(), Ok(Severity::Med));
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_report_continues_below_fatal() {
        let mut sink = DiagnosticCollector::new();
        let diagnostic = Diagnostic::unresolved_inclusion("x.edmh", position());
        assert!(report(&mut sink, diagnostic).is_ok());
        assert_eq!(sink.count(DiagnosticKind::UnresolvedInclusionPath), 1);
    }

    #[test]
    fn test_report_aborts_on_fatal() {
        let mut sink = DiagnosticCollector::new();
        let diagnostic = Diagnostic::new(DiagnosticKind::MissingFile, "gone", position()).with_severity(Severity::Fatal);
        let aborted = report(&mut sink, diagnostic).unwrap_err();
        assert_eq!(aborted.severity, Severity::Fatal);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn test_collector_stop_threshold() {
        let mut sink = DiagnosticCollector::stopping_at(Severity::High);
        assert!(report(&mut sink, Diagnostic::tabwidth_inferred(2, position())).is_ok());
        let aborted = report(&mut sink, Diagnostic::unknown_config_key("colour", position())).unwrap_err();
        assert_eq!(aborted.kind, DiagnosticKind::UnknownConfigKey);
        assert_eq!(aborted.position, position());
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let mut sink = FailingSink { attempts: 0 };
        let aborted = report(&mut sink, Diagnostic::missing_file(Path::new("gone.edmh"))).unwrap_err();
        assert_eq!(aborted.kind, DiagnosticKind::DiagnosticSinkFailure);
        assert_eq!(aborted.severity, Severity::Fatal);
        assert_eq!(sink.attempts, 2);
    }

    #[test]
    fn test_cause_chain_is_flattened() {
        let error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let diagnostic = Diagnostic::error_loading_file(Path::new("a.edmh"), &error);
        assert_eq!(diagnostic.cause.as_deref(), Some("denied"));
        assert_eq!(diagnostic.severity, Severity::High);
    }
}
