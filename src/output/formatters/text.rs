//! Default text output formatter with colors

use crate::diagnostics::{Diagnostic, Severity};
use crate::output::OutputFormatter;
use colored::*;

/// Default human-readable formatter with colors
pub struct TextFormatter {
    use_colors: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = format!("[{severity}]");
        if !self.use_colors {
            return label;
        }
        match severity {
            Severity::Fatal => label.red().bold().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Med => label.yellow().to_string(),
            Severity::Low => label.cyan().to_string(),
            Severity::Debug => label.dimmed().to_string(),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        // Format: file:line: [SEVERITY] Kind: message
        let position = diagnostic.position.to_string();
        let mut output = format!(
            "{}: {} {}: {}",
            if self.use_colors {
                position.blue().underline().to_string()
            } else {
                position
            },
            self.severity_label(diagnostic.severity),
            if self.use_colors {
                diagnostic.kind.name().bold().to_string()
            } else {
                diagnostic.kind.name().to_string()
            },
            diagnostic.message
        );

        if let Some(cause) = &diagnostic.cause {
            output.push_str("\n  caused by: ");
            output.push_str(cause);
        }
        output
    }

    fn use_colors(&self) -> bool {
        self.use_colors
    }
}
