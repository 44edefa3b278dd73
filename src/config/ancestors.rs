//! Discovery of same-named config files in the current and parent directories.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Find `file_name` in the current directory and every ancestor of it.
///
/// Paths are ordered root first, so merging them in order lets deeper
/// directories win. An unreadable current directory yields no paths.
pub fn find_ancestor_config_files(file_name: &str) -> Vec<PathBuf> {
    match std::env::current_dir() {
        Ok(cwd) => find_ancestor_config_files_from(&cwd, file_name),
        Err(_) => Vec::new(),
    }
}

/// Same as [`find_ancestor_config_files`], starting from `start` instead of
/// the process working directory.
///
/// A relative `start` is resolved against the working directory first, so
/// the walk always ends at the filesystem root.
pub fn find_ancestor_config_files_from(start: &Path, file_name: &str) -> Vec<PathBuf> {
    let start = absolute_dir(start);
    let mut paths: Vec<PathBuf> = start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .filter(|candidate| candidate.is_file())
        .collect();
    paths.reverse();
    paths
}

/// `start` with `.` and `..` resolved, as an absolute path.
fn absolute_dir(start: &Path) -> PathBuf {
    match start.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            debug!(path = %start.display(), error = %e, "cannot canonicalize ancestor search start");
            std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf())
        }
    }
}
