//! Nearest-ancestor file lookup.

use std::path::{Path, PathBuf};

/// Find the closest `dir/file_name`, starting at `start` and walking up to
/// and including `root`.
///
/// Returns `None` if no directory in that range holds the file, or if
/// `start` is not inside `root`.
///
/// ```ignore
/// // layouts at /site/_layout.html and /site/a/b/_layout.html
/// find_nearest_ancestor("/site/a/b/c".as_ref(), "/site".as_ref(), "_layout.html")
/// // → Some("/site/a/b/_layout.html")
/// ```
pub fn find_nearest_ancestor(start: &Path, root: &Path, file_name: &str) -> Option<PathBuf> {
    if !start.starts_with(root) {
        return None;
    }

    start
        .ancestors()
        .take_while(|dir| dir.starts_with(root))
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}
