//! Source file classification for full builds and watch mode.
//!
//! | Category | Rule                               | Rebuild Strategy           |
//! |----------|------------------------------------|----------------------------|
//! | Markdown | extension `md`                     | render that one document   |
//! | Layout   | exactly `_layout.html`             | rebuild its directory tree |
//! | Static   | anything else                      | copy verbatim              |
//!
//! Files whose name starts with [`PRIVATE_PREFIX`] are never enumerated as
//! content or assets. The layout file shares the prefix but is matched by its
//! exact name.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Extension of markdown documents.
pub const MARKDOWN_EXT: &str = "md";
/// Extension of rendered documents.
pub const OUTPUT_EXT: &str = "html";
/// Stem of the per-directory layout file.
pub const LAYOUT_STEM: &str = "_layout";
/// Extension of the per-directory layout file.
pub const LAYOUT_EXT: &str = "html";
/// Full layout file name.
pub const LAYOUT_FILE: &str = "_layout.html";
/// Basename prefix that hides a file from bulk enumeration.
pub const PRIVATE_PREFIX: char = '_';

/// Files never worth enumerating or routing
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Role of a source file in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// Markdown document, rendered through a layout
    Markdown,
    /// Per-directory layout template
    Layout,
    /// Any other file, copied byte-for-byte
    Static,
}

impl FileCategory {
    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Markdown => "content",
            Self::Layout => "layout",
            Self::Static => "assets",
        }
    }
}

/// Classify a path. Only the file name is inspected.
pub fn categorize_path(path: &Path) -> FileCategory {
    let ext = path.extension().and_then(|e| e.to_str());
    let stem = path.file_stem().and_then(|s| s.to_str());

    match (ext, stem) {
        (Some(MARKDOWN_EXT), _) => FileCategory::Markdown,
        (Some(LAYOUT_EXT), Some(LAYOUT_STEM)) => FileCategory::Layout,
        _ => FileCategory::Static,
    }
}

/// Whether the file name starts with the private prefix.
pub fn is_private(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PRIVATE_PREFIX))
}

/// Editor artifacts and OS metadata files.
pub fn is_ignored(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    IGNORED_FILES.contains(&name)
        || matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Whether a file takes part in bulk enumeration of the given category.
pub fn is_enumerable(path: &Path, category: FileCategory) -> bool {
    !is_ignored(path) && !is_private(path) && categorize_path(path) == category
}

/// Swap a document path's extension for the rendered one.
///
/// `posts/a.md` → `posts/a.html`
pub fn output_name(relative: &Path) -> PathBuf {
    relative.with_extension(OUTPUT_EXT)
}

/// Normalize a path to absolute form for reliable comparison.
///
/// Paths that no longer exist (deleted files) are joined onto the current
/// directory instead of canonicalized.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}
