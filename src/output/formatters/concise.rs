//! Concise output formatter for easy parsing by editors

use crate::diagnostics::Diagnostic;
use crate::output::OutputFormatter;

/// Concise formatter: file:line: [SEVERITY] Kind: message
#[derive(Default)]
pub struct ConciseFormatter;

impl ConciseFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for ConciseFormatter {
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        // Messages may span lines (circular inclusion chains); keep one line per diagnostic
        let message = diagnostic.message.replace("\n\t", " -> ").replace('\n', " ");
        let mut line = format!(
            "{}: [{}] {}: {}",
            diagnostic.position, diagnostic.severity, diagnostic.kind, message
        );
        if let Some(cause) = &diagnostic.cause {
            line.push_str(&format!(" ({cause})"));
        }
        line
    }
}
