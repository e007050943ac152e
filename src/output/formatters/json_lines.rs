//! JSON Lines output formatter (one JSON object per line)

use crate::diagnostics::Diagnostic;
use crate::output::OutputFormatter;
use crate::output::formatters::json::diagnostic_to_json;

/// JSON Lines formatter - one JSON object per line, written as diagnostics arrive
#[derive(Default)]
pub struct JsonLinesFormatter;

impl JsonLinesFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonLinesFormatter {
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        // Compact JSON representation on a single line
        serde_json::to_string(&diagnostic_to_json(diagnostic)).unwrap_or_default()
    }
}
