//! JSON output formatter

use crate::diagnostics::Diagnostic;
use crate::output::OutputFormatter;
use serde_json::{Value, json};

/// JSON formatter for machine-readable output: one array with every diagnostic
#[derive(Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// The JSON object describing one diagnostic
pub fn diagnostic_to_json(diagnostic: &Diagnostic) -> Value {
    json!({
        "file": diagnostic.position.source().display().to_string(),
        "line": diagnostic.position.line,
        "severity": diagnostic.severity.as_str(),
        "kind": diagnostic.kind.name(),
        "message": diagnostic.message,
        "cause": diagnostic.cause,
    })
}

impl OutputFormatter for JsonFormatter {
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        serde_json::to_string_pretty(&diagnostic_to_json(diagnostic)).unwrap_or_default()
    }

    fn is_batched(&self) -> bool {
        true
    }

    fn format_batch(&self, diagnostics: &[Diagnostic]) -> String {
        let all: Vec<Value> = diagnostics.iter().map(diagnostic_to_json).collect();
        serde_json::to_string_pretty(&all).unwrap_or_default()
    }
}
