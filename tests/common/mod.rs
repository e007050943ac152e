//! Shared helpers for the integration tests.
#![allow(dead_code)]

use eredmel_lib::{Configuration, DiagnosticCollector, Document, Normalized, load_file, normalize, read_str};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary source tree.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories as needed.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Load `relative` with includes resolved, collecting every diagnostic.
    pub fn load(&self, relative: &str, search_dirs: &[PathBuf]) -> (Document<Normalized>, DiagnosticCollector) {
        self.load_with(relative, search_dirs, &Configuration::new())
    }

    pub fn load_with(
        &self,
        relative: &str,
        search_dirs: &[PathBuf],
        config: &Configuration,
    ) -> (Document<Normalized>, DiagnosticCollector) {
        let mut sink = DiagnosticCollector::new();
        let doc = load_file(&self.path(relative), search_dirs, config, &mut sink).unwrap();
        (doc, sink)
    }
}

/// Normalize in-memory content as if it were the file `name`.
pub fn normalize_str(name: &str, content: &str) -> (Document<Normalized>, usize, DiagnosticCollector) {
    let raw = read_str(Path::new(name), content, &Configuration::new());
    let mut sink = DiagnosticCollector::new();
    let (doc, tabwidth) = normalize(&raw, &mut sink).unwrap();
    (doc, tabwidth, sink)
}

/// Line numbers of every line in `doc`.
pub fn line_numbers(doc: &Document<Normalized>) -> Vec<usize> {
    doc.lines().iter().map(|line| line.position.line).collect()
}
