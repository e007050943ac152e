//! Tabwidth normalization from the outside: directives, inference and rounding.

mod common;

use common::{line_numbers, normalize_str};
use eredmel_lib::{ConfigSetting, DiagnosticKind, Severity};
use pretty_assertions::assert_eq;

fn levels(source: &str) -> Vec<usize> {
    let (doc, _, _) = normalize_str("n.edmh", source);
    doc.lines().iter().map(|line| line.kind.level).collect()
}

#[test]
fn test_mixed_spaces_and_tabs_add_up() {
    // Two spaces round to one level at tabwidth 4, plus one tab
    assert_eq!(levels("config: tabwidth = 4\n  \tx\n\t  y\n"), vec![2, 2]);
}

#[test]
fn test_half_up_rounding() {
    let (doc, _, sink) = normalize_str("n.edmh", "config: tabwidth = 4\n a\n  b\n   c\n     d\n      e\n");
    let levels: Vec<usize> = doc.lines().iter().map(|line| line.kind.level).collect();
    assert_eq!(levels, vec![0, 1, 1, 1, 2]);

    let severities: Vec<Severity> = sink
        .of_kind(DiagnosticKind::IndentationRoundingWarning)
        .iter()
        .map(|d| d.severity)
        .collect();
    // At tabwidth 4 every remainder falls in the middle band
    assert_eq!(
        severities,
        vec![Severity::Med, Severity::Med, Severity::Med, Severity::Med, Severity::Med]
    );
}

#[test]
fn test_rounding_severity_at_wide_tabwidth() {
    let (_, _, sink) = normalize_str("n.edmh", "config: tabwidth = 8\n x\n    y\n       z\n");
    let severities: Vec<(usize, Severity)> = sink
        .of_kind(DiagnosticKind::IndentationRoundingWarning)
        .iter()
        .map(|d| (d.position.line, d.severity))
        .collect();
    assert_eq!(
        severities,
        vec![(2, Severity::Low), (3, Severity::Med), (4, Severity::Low)]
    );
}

#[test]
fn test_inferred_tabwidth_is_recorded_in_config() {
    let (doc, tabwidth, sink) = normalize_str("n.edmh", "a\n  b\n    c\n");
    assert_eq!(tabwidth, 2);
    assert_eq!(doc.config().get(ConfigSetting::Tabwidth), "2");
    assert_eq!(doc.text(), "a\n\tb\n\t\tc\n");

    let inferred = sink.of_kind(DiagnosticKind::TabwidthInferenceWarning);
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].position.line, 0);
}

#[test]
fn test_directives_after_body_are_plain_text() {
    let (doc, _, sink) = normalize_str("n.edmh", "config: tabwidth = 2\nbody\nconfig: tabwidth = 8\n");
    assert_eq!(doc.text(), "body\nconfig: tabwidth = 8\n");
    assert_eq!(doc.config().tabwidth(), 2);
    assert!(sink.is_empty());
}

#[test]
fn test_bad_directives_are_reported_and_skipped() {
    let (doc, tabwidth, sink) = normalize_str(
        "n.edmh",
        "config: colour = red\nconfig: tabwidth = zero\nconfig: tabwidth = 0\nx\n",
    );
    assert_eq!(doc.text(), "x\n");
    assert_eq!(tabwidth, 4);
    assert_eq!(doc.config().prefix(), "");

    let unknown = sink.of_kind(DiagnosticKind::UnknownConfigKey);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].position.line, 1);

    let invalid: Vec<usize> = sink
        .of_kind(DiagnosticKind::InvalidConfigValue)
        .iter()
        .map(|d| d.position.line)
        .collect();
    assert_eq!(invalid, vec![2, 3]);
}

#[test]
fn test_positions_skip_consumed_lines() {
    let (doc, _, _) = normalize_str("n.edmh", "\nconfig: tabwidth = 4\n\nfirst\n\nsecond\n");
    assert_eq!(doc.text(), "first\n\nsecond\n");
    assert_eq!(line_numbers(&doc), vec![4, 5, 6]);
}

#[test]
fn test_crlf_input_is_folded() {
    let (doc, _, _) = normalize_str("n.edmh", "a\r\n\tb\r\n");
    assert_eq!(doc.text(), "a\n\tb\n");
}

#[test]
fn test_empty_file() {
    let (doc, tabwidth, sink) = normalize_str("n.edmh", "");
    assert!(doc.is_empty());
    assert_eq!(tabwidth, 4);
    assert!(sink.is_empty());
}
