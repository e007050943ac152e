use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components lexically.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Never pop the root or a drive prefix
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Identity of a file for cycle detection and caching: absolute and lexically normalized.
///
/// Symlinks are not resolved, so two links to the same file count as different files.
pub fn file_identity(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(absolute) => normalize_path(&absolute),
        Err(_) => normalize_path(path),
    }
}

/// The directory relative includes are resolved against: the file's parent, or the
/// path itself when it is already a directory.
pub fn including_dir(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}
