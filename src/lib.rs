//! Eredmel source preprocessor.
//!
//! The pipeline turns `.edmh` files into canonical, include-resolved, macro-expanded
//! documents:
//!
//! 1. [`read_file`] splits a file into raw lines
//! 2. [`normalize`] consumes `config:` directives and converts leading whitespace to
//!    indentation levels
//! 3. [`load_files`] resolves `include "path"` directives recursively
//! 4. [`apply_replaces`] expands `replace` macro directives
//!
//! Every stage reports problems to a caller-supplied [`DiagnosticSink`] and returns
//! [`Aborted`] when the sink asks it to stop or a FATAL diagnostic is reported.

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod exit_codes;
pub mod file_processor;
pub mod inclusion;
pub mod normalizer;
pub mod output;
pub mod replacer;
pub mod utils;

pub use config::{ConfigSetting, Configuration, Scope};
pub use diagnostics::{Aborted, Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticSink, Flow, Severity};
pub use document::{Document, Line, Measured, Normalized, Position, Raw};
pub use file_processor::{read_file, read_str};
pub use inclusion::{InclusionChain, LoadedFileCache, load_file, load_files};
pub use normalizer::normalize;
pub use replacer::{Replacer, apply_replaces};

use std::path::PathBuf;

/// Run the whole pipeline on every root: load with includes, then expand macros.
///
/// Results are in `paths` order. The include cache is shared by all roots.
pub fn preprocess_files(
    paths: &[PathBuf],
    search_dirs: &[PathBuf],
    config: &Configuration,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Document<Normalized>>, Aborted> {
    let loaded = load_files(paths, search_dirs, config, sink)?;
    loaded.iter().map(|doc| apply_replaces(doc, sink)).collect()
}
