//! Reading source files into raw documents, and finding `.edmh` files on disk.

use crate::config::Configuration;
use crate::document::{Document, Line, Position, Raw};
use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Extension of Eredmel source files.
pub const SOURCE_EXTENSION: &str = "edmh";
/// Extension of preprocessed output files.
pub const OUTPUT_EXTENSION: &str = "edm";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),
}

/// Read `path` as one raw line per physical line.
pub fn read_file(path: &Path, config: &Configuration) -> io::Result<Document<Raw>> {
    let content = std::fs::read_to_string(path)?;
    Ok(read_str(path, &content, config))
}

/// Split `content` into raw lines attributed to `source`.
///
/// Every line ends with `\n`, including a last line that had none in the input.
/// CRLF line endings are folded to LF.
pub fn read_str(source: &Path, content: &str, config: &Configuration) -> Document<Raw> {
    let source: Arc<Path> = Arc::from(source);
    let lines = content
        .lines()
        .enumerate()
        .map(|(i, text)| Line::new(Position::new(Arc::clone(&source), i + 1), Raw::new(format!("{text}\n"))))
        .collect();
    Document::new(lines, config.clone())
}

/// Expand the given paths into a sorted, deduplicated list of source files.
///
/// Files are taken as given, whatever their extension. Directories are walked
/// recursively for `*.edmh` files, honouring `.gitignore` and `.ignore` files.
pub fn discover_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            dirs.push(path);
        } else {
            return Err(DiscoveryError::NotFound(path.clone()));
        }
    }

    if let Some((first, rest)) = dirs.split_first() {
        let mut types_builder = ignore::types::TypesBuilder::new();
        types_builder.add("eredmel", &format!("*.{SOURCE_EXTENSION}"))?;
        types_builder.select("eredmel");

        let mut walk_builder = WalkBuilder::new(first);
        for dir in rest {
            walk_builder.add(dir);
        }
        walk_builder.types(types_builder.build()?);

        for entry in walk_builder.build() {
            let entry = entry?;
            if entry.file_type().is_some_and(|ft| ft.is_file()) {
                log::debug!("[eredmel-discovery] Found {}", entry.path().display());
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Where the preprocessed form of `source` is written inside `output_dir`.
pub fn output_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    output_dir.join(stem).with_extension(OUTPUT_EXTENSION)
}
