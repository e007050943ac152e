//! Tabwidth normalization: consume the leading `config:` directives of a raw document,
//! settle the tabwidth (declared or inferred) and convert every line's leading
//! whitespace into an indentation level.
//!
//! Nothing here is fatal. Bad directives and odd indentation are reported and the
//! document is always normalized with some concrete tabwidth.

use crate::config::{ConfigSetting, Configuration};
use crate::diagnostics::{self, Aborted, Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::document::{Document, Measured, Normalized, Position, Raw};
use crate::utils::pattern::{Pattern, PatternFlags};
use std::path::Path;

/// Body of a `config: name = value` directive, matched behind the prefix.
pub const CONFIG_DIRECTIVE: &str = r"config:\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?P<value>\S+)\s*$";

/// Used when nothing in the file is indented with spaces.
pub const DEFAULT_TABWIDTH: usize = 4;

/// Normalize `doc`, returning the normalized document and the tabwidth applied.
///
/// The returned document carries the configuration after the file's own directives,
/// with `tabwidth` always defined.
pub fn normalize(doc: &Document<Raw>, sink: &mut dyn DiagnosticSink) -> Result<(Document<Normalized>, usize), Aborted> {
    let (mut config, body) = consume_config(doc, sink)?;
    let measured = body.measure_whitespace();

    let tabwidth = if config.is_defined(ConfigSetting::Tabwidth) {
        config.tabwidth()
    } else {
        let inferred = infer_tabwidth(&measured, sink)?;
        config.set(ConfigSetting::Tabwidth, inferred.to_string());
        inferred
    };

    log::debug!(
        "[eredmel-normalize] {} lines with tabwidth {tabwidth}",
        measured.line_count()
    );
    let normalized = measured.try_map(|line| line.apply_tabwidth_reported(tabwidth, &mut *sink))?;
    Ok((normalized.with_config(config), tabwidth))
}

/// Strip leading blank lines and `config:` directives, returning the resulting
/// configuration and the rest of the document.
fn consume_config(
    doc: &Document<Raw>,
    sink: &mut dyn DiagnosticSink,
) -> Result<(Configuration, Document<Raw>), Aborted> {
    let mut config = doc.config().clone();
    let origin = doc
        .lines()
        .first()
        .map_or_else(|| Position::whole_file(Path::new("<empty>")), |line| line.position.clone());
    let mut pattern = compile_config_pattern(&config, &origin, sink)?;
    let mut consumed = 0;

    for line in doc.lines() {
        if line.kind.is_blank() {
            consumed += 1;
            continue;
        }
        let Some(directive) = pattern.as_ref() else { break };
        let captures = match directive.captures(&line.kind.text) {
            Ok(Some(captures)) => captures,
            Ok(None) => break,
            Err(e) => {
                diagnostics::report(
                    sink,
                    Diagnostic::new(DiagnosticKind::PatternExecutionError, e.to_string(), line.position.clone()),
                )?;
                break;
            }
        };
        consumed += 1;

        let name = captures.name("name").unwrap_or_default();
        let value = captures.name("value").unwrap_or_default();
        let Some(setting) = ConfigSetting::from_key(name) else {
            diagnostics::report(sink, Diagnostic::unknown_config_key(name, line.position.clone()))?;
            continue;
        };
        if !config.set(setting, value) {
            diagnostics::report(sink, Diagnostic::invalid_config_value(name, value, line.position.clone()))?;
            continue;
        }
        if setting == ConfigSetting::Prefix {
            pattern = compile_config_pattern(&config, &line.position, sink)?;
        }
    }

    let body = doc.slice(doc.offsets()[consumed], doc.len());
    Ok((config, body))
}

/// An invalid prefix is reported once and disables directive recognition.
fn compile_config_pattern(
    config: &Configuration,
    position: &Position,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<Pattern>, Aborted> {
    match config.pattern_match(CONFIG_DIRECTIVE, PatternFlags::NONE) {
        Ok(pattern) => Ok(Some(pattern)),
        Err(e) => {
            let message = format!("Invalid directive prefix '{}'", config.prefix());
            diagnostics::report(
                sink,
                Diagnostic::new(DiagnosticKind::PatternSyntaxError, message, position.clone()).with_cause(&e),
            )?;
            Ok(None)
        }
    }
}

/// Greatest common divisor of all leading space counts, or [`DEFAULT_TABWIDTH`]
/// when no line starts with a space.
fn infer_tabwidth(doc: &Document<Measured>, sink: &mut dyn DiagnosticSink) -> Result<usize, Aborted> {
    let gcd = doc.lines().iter().fold(0, |acc, line| gcd(acc, line.kind.spaces));
    if gcd == 0 {
        return Ok(DEFAULT_TABWIDTH);
    }

    log::debug!("[eredmel-normalize] Inferred tabwidth {gcd}");
    if let Some(first) = doc.lines().first() {
        let position = Position::whole_file(first.position.source.clone());
        diagnostics::report(sink, Diagnostic::tabwidth_inferred(gcd, position))?;
    }
    Ok(gcd)
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}
