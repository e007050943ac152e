//! Recursive file inclusion.
//!
//! Each loaded file is normalized with its own tabwidth, then every
//! `include "path"` line is replaced by the fully resolved lines of the named file.
//! An [`InclusionChain`] tracks the files currently being resolved to break cycles, and
//! a [`LoadedFileCache`] makes sure every file is read and resolved at most once per run.
//!
//! Include paths are looked up in the search directories first, in order, and then
//! in the directory of the including file. The first regular file found wins.

use crate::config::Configuration;
use crate::diagnostics::{self, Aborted, Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::document::{Document, Line, Normalized, Position};
use crate::file_processor::read_file;
use crate::normalizer::normalize;
use crate::utils::path_utils::{file_identity, including_dir};
use crate::utils::pattern::PatternFlags;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Body of an `include "path"` directive, matched behind the prefix.
pub const INCLUDE_DIRECTIVE: &str = r#"include\s*"(?P<path>.+)"\s*$"#;

/// Fully resolved documents by file identity.
pub type LoadedFileCache = HashMap<PathBuf, Document<Normalized>>;

/// The files currently being resolved, outermost first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InclusionChain {
    files: Vec<PathBuf>,
}

impl InclusionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, identity: &Path) -> bool {
        self.files.iter().any(|file| file == identity)
    }

    /// The cycle closed by `identity`: the chain from its first occurrence, then `identity` again.
    pub fn cycle_through(&self, identity: &Path) -> Vec<PathBuf> {
        let start = self.files.iter().position(|file| file == identity).unwrap_or(0);
        let mut cycle = self.files[start..].to_vec();
        cycle.push(identity.to_path_buf());
        cycle
    }

    fn push(&mut self, identity: PathBuf) {
        self.files.push(identity);
    }

    fn pop(&mut self) {
        self.files.pop();
    }
}

/// Find `relative` in `search_dirs`, then next to `including_file`.
///
/// A search entry that names a file stands for the directory containing it.
pub fn resolve_inclusion(including_file: &Path, search_dirs: &[PathBuf], relative: &str) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| including_dir(dir))
        .chain(std::iter::once(including_dir(including_file)))
        .map(|dir| dir.join(relative))
        .find(|candidate| candidate.is_file())
}

/// Loads files with a cache shared across every root of one run.
#[derive(Debug)]
pub struct Loader<'a> {
    search_dirs: &'a [PathBuf],
    cache: LoadedFileCache,
}

impl<'a> Loader<'a> {
    pub fn new(search_dirs: &'a [PathBuf]) -> Self {
        Self {
            search_dirs,
            cache: LoadedFileCache::new(),
        }
    }

    pub fn cache(&self) -> &LoadedFileCache {
        &self.cache
    }

    /// Load one root file with a fresh inclusion chain.
    pub fn load_root(
        &mut self,
        path: &Path,
        config: &Configuration,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Document<Normalized>, Aborted> {
        let mut chain = InclusionChain::new();
        self.load(path, &Position::whole_file(path), &mut chain, config, sink)
    }

    /// Load `path`, resolving its includes recursively.
    ///
    /// `origin` is the include line that asked for this file, used to locate
    /// cycle diagnostics.
    pub fn load(
        &mut self,
        path: &Path,
        origin: &Position,
        chain: &mut InclusionChain,
        config: &Configuration,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Document<Normalized>, Aborted> {
        if !path.exists() {
            diagnostics::report(sink, Diagnostic::missing_file(path))?;
        }

        let identity = file_identity(path);
        if let Some(cached) = self.cache.get(&identity) {
            log::debug!("[eredmel-include] Cache hit for {}", path.display());
            return Ok(cached.clone());
        }

        if chain.contains(&identity) {
            let cycle = chain.cycle_through(&identity);
            diagnostics::report(sink, Diagnostic::circular_inclusion(&cycle, origin.clone()))?;
            return Ok(Document::empty(config.clone()));
        }

        chain.push(identity.clone());
        let resolved = self.read_and_resolve(path, chain, config, sink);
        chain.pop();

        let resolved = resolved?;
        if let Some(document) = &resolved {
            self.cache.insert(identity, document.clone());
        }
        Ok(resolved.unwrap_or_else(|| Document::empty(config.clone())))
    }

    /// `Ok(None)` when the file could not be read.
    fn read_and_resolve(
        &mut self,
        path: &Path,
        chain: &mut InclusionChain,
        config: &Configuration,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<Document<Normalized>>, Aborted> {
        let raw = match read_file(path, config) {
            Ok(raw) => raw,
            Err(e) => {
                diagnostics::report(sink, Diagnostic::error_loading_file(path, &e))?;
                return Ok(None);
            }
        };
        log::debug!("[eredmel-include] Loading {}", path.display());

        let (normalized, _) = normalize(&raw, sink)?;
        let file_config = normalized.config().clone();
        let pattern = match file_config.pattern_match(INCLUDE_DIRECTIVE, PatternFlags::NONE) {
            Ok(pattern) => pattern,
            // Already reported while consuming config directives
            Err(_) => return Ok(Some(normalized)),
        };

        let child_config = file_config.session_only();
        let mut lines: Vec<Line<Normalized>> = Vec::with_capacity(normalized.line_count());

        for line in normalized.lines() {
            let text = line.render_with_tabs();
            let relative = match pattern.captures(&text) {
                Ok(Some(captures)) => captures.name("path").unwrap_or_default().to_string(),
                Ok(None) => {
                    lines.push(line.clone());
                    continue;
                }
                Err(e) => {
                    diagnostics::report(
                        sink,
                        Diagnostic::new(DiagnosticKind::PatternExecutionError, e.to_string(), line.position.clone()),
                    )?;
                    lines.push(line.clone());
                    continue;
                }
            };

            let Some(target) = resolve_inclusion(path, self.search_dirs, &relative) else {
                diagnostics::report(sink, Diagnostic::unresolved_inclusion(&relative, line.position.clone()))?;
                continue;
            };
            log::debug!("[eredmel-include] {} includes {}", line.position, target.display());

            let included = self.load(&target, &line.position, chain, &child_config, sink)?;
            lines.extend(included.into_lines());
        }

        Ok(Some(Document::new(lines, file_config)))
    }
}

/// Load and resolve a single root file.
pub fn load_file(
    path: &Path,
    search_dirs: &[PathBuf],
    config: &Configuration,
    sink: &mut dyn DiagnosticSink,
) -> Result<Document<Normalized>, Aborted> {
    Loader::new(search_dirs).load_root(path, config, sink)
}

/// Load and resolve every root, sharing one cache. Results are in `paths` order.
pub fn load_files(
    paths: &[PathBuf],
    search_dirs: &[PathBuf],
    config: &Configuration,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Document<Normalized>>, Aborted> {
    let mut loader = Loader::new(search_dirs);
    paths.iter().map(|path| loader.load_root(path, config, sink)).collect()
}
