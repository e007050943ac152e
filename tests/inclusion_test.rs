//! Include resolution across real files on disk.

mod common;

use common::{SourceTree, line_numbers};
use eredmel_lib::inclusion::Loader;
use eredmel_lib::{ConfigSetting, Configuration, DiagnosticCollector, DiagnosticKind, Severity};
use pretty_assertions::assert_eq;

#[test]
fn test_include_splices_file_in_place() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "before\ninclude \"part.edmh\"\nafter\n");
    tree.write("part.edmh", "one\n\ttwo\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "before\none\n\ttwo\nafter\n");
    assert!(sink.is_empty());

    // Included lines keep the positions of the file they came from
    let sources: Vec<_> = doc
        .lines()
        .iter()
        .map(|line| line.position.source().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(sources, vec!["main.edmh", "part.edmh", "part.edmh", "main.edmh"]);
    assert_eq!(line_numbers(&doc), vec![1, 1, 2, 3]);
}

#[test]
fn test_include_with_whitespace_variants() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "include\"a.edmh\"\ninclude   \"a.edmh\"   \n");
    tree.write("a.edmh", "a\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "a\na\n");
    assert!(sink.is_empty());
}

#[test]
fn test_self_inclusion_is_reported_once() {
    let tree = SourceTree::new();
    let a = tree.write("a.edmh", "x\ninclude \"a.edmh\"\ny\n");

    let (doc, sink) = tree.load("a.edmh", &[]);
    assert_eq!(doc.text(), "x\ny\n");

    let cycles = sink.of_kind(DiagnosticKind::CircularInclusion);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].severity, Severity::High);
    assert_eq!(cycles[0].position.line, 2);
    assert_eq!(
        cycles[0].message,
        format!("Circular inclusion:\n\t{}\n\t{}", a.display(), a.display())
    );
}

#[test]
fn test_mutual_inclusion_reports_the_whole_cycle() {
    let tree = SourceTree::new();
    let a = tree.write("a.edmh", "a1\ninclude \"b.edmh\"\na2\n");
    let b = tree.write("b.edmh", "b1\ninclude \"a.edmh\"\nb2\n");

    let (doc, sink) = tree.load("a.edmh", &[]);
    assert_eq!(doc.text(), "a1\nb1\nb2\na2\n");

    let cycles = sink.of_kind(DiagnosticKind::CircularInclusion);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].position.source(), b.as_path());
    assert_eq!(
        cycles[0].message,
        format!(
            "Circular inclusion:\n\t{}\n\t{}\n\t{}",
            a.display(),
            b.display(),
            a.display()
        )
    );
}

#[test]
fn test_unresolved_include_drops_only_that_line() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "one\ninclude \"nope.edmh\"\ntwo\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "one\ntwo\n");
    assert_eq!(line_numbers(&doc), vec![1, 3]);

    let unresolved = sink.of_kind(DiagnosticKind::UnresolvedInclusionPath);
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].position.line, 2);
    assert_eq!(unresolved[0].message, "Unresolved inclusion: file nope.edmh not found");
}

#[test]
fn test_search_dirs_win_over_including_directory() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "include \"x.edmh\"\n");
    tree.write("x.edmh", "local\n");
    tree.write("lib/x.edmh", "from lib\n");
    tree.write("vendor/x.edmh", "from vendor\n");

    let (doc, _) = tree.load("main.edmh", &[tree.path("lib"), tree.path("vendor")]);
    assert_eq!(doc.text(), "from lib\n");

    let (doc, _) = tree.load("main.edmh", &[tree.path("vendor"), tree.path("lib")]);
    assert_eq!(doc.text(), "from vendor\n");

    let (doc, _) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "local\n");
}

#[test]
fn test_search_entry_naming_a_file_means_its_directory() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "include \"x.edmh\"\n");
    let marker = tree.write("lib/marker.edmh", "");
    tree.write("lib/x.edmh", "from lib\n");

    let (doc, _) = tree.load("main.edmh", &[marker]);
    assert_eq!(doc.text(), "from lib\n");
}

#[test]
fn test_nested_includes_resolve_next_to_each_includer() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "include \"sub/inner.edmh\"\n");
    tree.write("sub/inner.edmh", "inner\ninclude \"leaf.edmh\"\n");
    tree.write("sub/leaf.edmh", "leaf\n");
    tree.write("leaf.edmh", "wrong leaf\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "inner\nleaf\n");
    assert!(sink.is_empty());
}

#[test]
fn test_prefix_is_inherited_but_tabwidth_is_not() {
    let tree = SourceTree::new();
    tree.write(
        "main.edmh",
        "config: tabwidth = 2\nconfig: prefix = %\n%include \"lib.edmh\"\n  x\n",
    );
    tree.write("lib.edmh", "include \"other.edmh\"\n    deep\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    // The unprefixed include in lib.edmh is plain text, and lib.edmh infers its own tabwidth
    assert_eq!(doc.text(), "include \"other.edmh\"\n\tdeep\n\tx\n");
    assert_eq!(sink.count(DiagnosticKind::UnresolvedInclusionPath), 0);
    assert_eq!(sink.count(DiagnosticKind::TabwidthInferenceWarning), 1);
    assert_eq!(doc.config().tabwidth(), 2);
}

#[test]
fn test_session_prefix_from_caller() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "#include \"a.edmh\"\ninclude \"a.edmh\"\n");
    tree.write("a.edmh", "a\n");

    let config = Configuration::new().with(ConfigSetting::Prefix, "#").unwrap();
    let (doc, _) = tree.load_with("main.edmh", &[], &config);
    assert_eq!(doc.text(), "a\ninclude \"a.edmh\"\n");
}

#[test]
fn test_prefix_reaches_every_nesting_level() {
    let tree = SourceTree::new();
    tree.write("root.edmh", "config: prefix = %\n%include \"mid.edmh\"\n");
    tree.write("mid.edmh", "%include \"leaf.edmh\"\n");
    tree.write("leaf.edmh", "%include \"deep.edmh\"\ninclude \"deep.edmh\"\n");
    tree.write("deep.edmh", "deep\n");

    let (doc, sink) = tree.load("root.edmh", &[]);
    assert_eq!(doc.text(), "deep\ninclude \"deep.edmh\"\n");
    assert!(sink.is_empty());
    assert_eq!(line_numbers(&doc), vec![1, 2]);
}

#[test]
fn test_sibling_includes_keep_their_own_tabwidth() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "include \"two.edmh\"\ninclude \"four.edmh\"\n");
    tree.write("two.edmh", "config: tabwidth = 2\n  a\n    b\n");
    tree.write("four.edmh", "    c\n        d\n");

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "\ta\n\t\tb\n\tc\n\t\td\n");
    // Only four.edmh has to infer its tabwidth
    let inferred = sink.of_kind(DiagnosticKind::TabwidthInferenceWarning);
    assert_eq!(inferred.len(), 1);
    assert!(inferred[0].position.source().ends_with("four.edmh"));
}

#[test]
fn test_diamond_loads_shared_file_once() {
    let tree = SourceTree::new();
    tree.write("top.edmh", "include \"left.edmh\"\ninclude \"right.edmh\"\n");
    tree.write("left.edmh", "left\ninclude \"base.edmh\"\n");
    tree.write("right.edmh", "right\ninclude \"base.edmh\"\n");
    tree.write("base.edmh", "base\n");

    let search_dirs = Vec::new();
    let mut loader = Loader::new(&search_dirs);
    let mut sink = DiagnosticCollector::new();
    let doc = loader
        .load_root(&tree.path("top.edmh"), &Configuration::new(), &mut sink)
        .unwrap();

    assert_eq!(doc.text(), "left\nbase\nright\nbase\n");
    assert_eq!(loader.cache().len(), 4);
    assert!(sink.is_empty());
}

#[test]
fn test_unreadable_include_reports_error_loading_file() {
    let tree = SourceTree::new();
    tree.write("main.edmh", "a\ninclude \"bad.edmh\"\nb\n");
    std::fs::write(tree.path("bad.edmh"), [0xff, 0xfe, b'\n']).unwrap();

    let (doc, sink) = tree.load("main.edmh", &[]);
    assert_eq!(doc.text(), "a\nb\n");
    let errors = sink.of_kind(DiagnosticKind::ErrorLoadingFile);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].cause.is_some());
}
