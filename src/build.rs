//! Full and incremental site builds.
//!
//! # Architecture
//!
//! ```text
//! full_build()
//!     │
//!     ├── clear output
//!     ├── markdown ──► resolve layout ──► pipeline ──► render ──► write   (parallel)
//!     └── assets   ──► copy                                               (parallel)
//!
//! incremental handlers (one per watch event, run to completion)
//!     │
//!     ├── markdown added/changed ──► render that document
//!     ├── markdown deleted       ──► remove its .html
//!     ├── static added/changed   ──► copy
//!     ├── static deleted         ──► remove the copy
//!     └── layout added/changed/deleted
//!             │
//!             └── invalidate cache entry ──► documents under the layout's
//!                 directory not governed by a more specific layout ──► render
//! ```
//!
//! A document that fails (missing layout, bad front matter, render error) is
//! reported and skipped; the rest of the batch still builds.

use crate::{
    config::SiteConfig,
    layout::LayoutResolver,
    log,
    logger::ProgressBars,
    pipeline::{self, PageContext},
    utils::{
        ancestor::find_nearest_ancestor,
        category::{FileCategory, LAYOUT_FILE, is_enumerable, output_name},
        minify::minify,
    },
    writer::{FsWriter, OutputWriter},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use walkdir::WalkDir;

/// What a build or handler did, by source path relative to the source root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Documents rendered and written
    pub rendered: Vec<PathBuf>,
    /// Static assets copied
    pub copied: Vec<PathBuf>,
    /// Sources whose output artifact was removed
    pub removed: Vec<PathBuf>,
    /// Documents with no layout in any ancestor directory
    pub skipped: Vec<PathBuf>,
    /// Documents or assets that failed to build
    pub failed: Vec<PathBuf>,
}

impl BuildReport {
    fn record(&mut self, relative: PathBuf, outcome: Outcome) {
        match outcome {
            Outcome::Rendered => self.rendered.push(relative),
            Outcome::Copied => self.copied.push(relative),
            Outcome::Skipped => self.skipped.push(relative),
            Outcome::Failed => self.failed.push(relative),
        }
    }
}

/// Result of building a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Rendered,
    Copied,
    Skipped,
    Failed,
}

/// How a layout event treats the layout's cache entry before rebuilding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutEvent {
    /// Evict any stale entry; the next resolve loads the new file
    Added,
    /// Evict and reload before any document renders
    Changed,
    /// Evict; documents fall back to the next layout up
    Deleted,
}

impl LayoutEvent {
    const fn verb(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

/// Owns the layout registry and performs every write to the output tree.
pub struct BuildCoordinator<W: OutputWriter = FsWriter> {
    src: PathBuf,
    dist: PathBuf,
    options: Value,
    minify: bool,
    layouts: LayoutResolver,
    writer: W,
}

impl BuildCoordinator<FsWriter> {
    pub fn new(config: &SiteConfig) -> Self {
        Self::with_parts(
            &config.build.src,
            &config.build.dist,
            config.template_options(),
            config.build.minify,
            LayoutResolver::new(&config.build.src),
            FsWriter,
        )
    }
}

impl<W: OutputWriter> BuildCoordinator<W> {
    pub fn with_parts(
        src: &Path,
        dist: &Path,
        options: Value,
        minify: bool,
        layouts: LayoutResolver,
        writer: W,
    ) -> Self {
        Self {
            src: src.to_path_buf(),
            dist: dist.to_path_buf(),
            options,
            minify,
            layouts,
            writer,
        }
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    #[cfg(test)]
    pub fn layouts(&self) -> &LayoutResolver {
        &self.layouts
    }

    // ========================================================================
    // Full build
    // ========================================================================

    /// Clear the output tree, render every document and copy every asset.
    pub fn full_build(&self) -> Result<BuildReport> {
        self.writer.clear(&self.dist)?;

        let documents = collect_files(&self.src, FileCategory::Markdown);
        let assets = collect_files(&self.src, FileCategory::Static);

        if documents.is_empty() {
            log!("build"; "no markdown files found");
        }

        let progress = ProgressBars::new_filtered(&[
            ("content", documents.len()),
            ("assets", assets.len()),
        ]);
        let tick = |name: &str| {
            if let Some(progress) = &progress {
                progress.inc(name);
            }
        };

        let (rendered, copied) = rayon::join(
            || {
                documents
                    .par_iter()
                    .map(|path| {
                        let outcome = self.render_document(path, false);
                        tick("content");
                        (path, outcome)
                    })
                    .collect::<Vec<_>>()
            },
            || {
                assets
                    .par_iter()
                    .map(|path| {
                        let outcome = self.copy_asset(path, false);
                        tick("assets");
                        (path, outcome)
                    })
                    .collect::<Vec<_>>()
            },
        );

        if let Some(progress) = &progress {
            progress.finish();
        }

        let mut report = BuildReport::default();
        for (path, outcome) in rendered.into_iter().chain(copied) {
            report.record(self.relative(path)?.to_path_buf(), outcome);
        }

        log!(
            "build";
            "{} pages, {} assets ({} skipped, {} failed)",
            report.rendered.len(),
            report.copied.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    // ========================================================================
    // Incremental handlers
    // ========================================================================

    pub fn on_markdown_added(&self, path: &Path) -> Result<BuildReport> {
        self.render_batch(&[path.to_path_buf()])
    }

    pub fn on_markdown_changed(&self, path: &Path) -> Result<BuildReport> {
        self.render_batch(&[path.to_path_buf()])
    }

    pub fn on_markdown_deleted(&self, path: &Path) -> Result<BuildReport> {
        let relative = self.relative(path)?;
        self.remove_output(relative, &output_name(relative))
    }

    pub fn on_static_added(&self, path: &Path) -> Result<BuildReport> {
        self.copy_batch(path)
    }

    pub fn on_static_changed(&self, path: &Path) -> Result<BuildReport> {
        self.copy_batch(path)
    }

    pub fn on_static_deleted(&self, path: &Path) -> Result<BuildReport> {
        let relative = self.relative(path)?;
        self.remove_output(relative, relative)
    }

    pub fn on_layout_added(&self, path: &Path) -> Result<BuildReport> {
        self.rebuild_layout_scope(path, LayoutEvent::Added)
    }

    pub fn on_layout_changed(&self, path: &Path) -> Result<BuildReport> {
        self.rebuild_layout_scope(path, LayoutEvent::Changed)
    }

    pub fn on_layout_deleted(&self, path: &Path) -> Result<BuildReport> {
        self.rebuild_layout_scope(path, LayoutEvent::Deleted)
    }

    /// Documents under `base` whose nearest layout is `base`'s own, or that
    /// have no layout between them and `base`.
    ///
    /// A document is excluded when a directory strictly below `base`, up to
    /// and including its own directory, owns a layout file. Documents
    /// directly in `base` are always included.
    pub fn affected_documents(&self, base: &Path) -> Vec<PathBuf> {
        collect_files(base, FileCategory::Markdown)
            .into_iter()
            .filter(|doc| {
                let Some(dir) = doc.parent() else {
                    return false;
                };
                match find_nearest_ancestor(dir, base, LAYOUT_FILE) {
                    Some(layout) => layout.parent() == Some(base),
                    None => true,
                }
            })
            .collect()
    }

    fn rebuild_layout_scope(&self, layout: &Path, event: LayoutEvent) -> Result<BuildReport> {
        let base = layout
            .parent()
            .ok_or_else(|| anyhow!("layout has no parent directory: {}", layout.display()))?;
        let relative = self.relative(layout)?;

        let invalidated = self
            .layouts
            .invalidate(layout, event == LayoutEvent::Changed);
        let documents = self.affected_documents(base);

        log!(
            "layout";
            "{} {}, rebuilding {} documents",
            relative.display(),
            event.verb(),
            documents.len()
        );

        if let Err(e) = invalidated {
            // The entry is evicted; every affected document would fail the same way.
            log!("error"; "{:#}", anyhow::Error::from(e));
            let mut report = BuildReport::default();
            for doc in &documents {
                report.record(self.relative(doc)?.to_path_buf(), Outcome::Failed);
            }
            return Ok(report);
        }

        self.render_batch(&documents)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn relative<'a>(&self, path: &'a Path) -> Result<&'a Path> {
        path.strip_prefix(&self.src)
            .with_context(|| format!("{} is outside the source tree", path.display()))
    }

    fn render_batch(&self, documents: &[PathBuf]) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for path in documents {
            let outcome = self.render_document(path, true);
            report.record(self.relative(path)?.to_path_buf(), outcome);
        }
        Ok(report)
    }

    fn copy_batch(&self, path: &Path) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        let outcome = self.copy_asset(path, true);
        report.record(self.relative(path)?.to_path_buf(), outcome);
        Ok(report)
    }

    fn remove_output(&self, source: &Path, output: &Path) -> Result<BuildReport> {
        self.writer.remove(&self.dist.join(output))?;
        log!("content"; "deleted {}", output.display());

        Ok(BuildReport {
            removed: vec![source.to_path_buf()],
            ..Default::default()
        })
    }

    /// Render one document through its layout and write it.
    fn render_document(&self, path: &Path, log_file: bool) -> Outcome {
        let started = Instant::now();
        let Ok(relative) = self.relative(path) else {
            return Outcome::Failed;
        };

        match self.try_render(path, relative) {
            Ok(Some(layout)) => {
                if log_file {
                    log!(
                        "content";
                        "{} via {} ({}ms)",
                        relative.display(),
                        layout.strip_prefix(&self.src).unwrap_or(&layout).display(),
                        started.elapsed().as_millis()
                    );
                }
                Outcome::Rendered
            }
            Ok(None) => {
                log!("warn"; "no layout found for {}, skipped", relative.display());
                Outcome::Skipped
            }
            Err(e) => {
                log!("error"; "{}: {:#}", relative.display(), e);
                Outcome::Failed
            }
        }
    }

    /// Returns the layout used, or `Ok(None)` when no ancestor directory owns one.
    fn try_render(&self, path: &Path, relative: &Path) -> Result<Option<PathBuf>> {
        let Some(layout) = self.layouts.resolve(path)? else {
            return Ok(None);
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let seed = PageContext::new(relative, raw, self.options.clone());
        let context = pipeline::run(seed)?;
        let html = layout.render(&context)?;

        let output = self.dist.join(output_name(relative));
        self.writer.write(&output, &minify(html.as_bytes(), self.minify))?;
        Ok(Some(layout.path))
    }

    fn copy_asset(&self, path: &Path, log_file: bool) -> Outcome {
        let Ok(relative) = self.relative(path) else {
            return Outcome::Failed;
        };

        match self.writer.copy(path, &self.dist.join(relative)) {
            Ok(()) => {
                if log_file {
                    log!("assets"; "{}", relative.display());
                }
                Outcome::Copied
            }
            Err(e) => {
                log!("error"; "{}: {:#}", relative.display(), e);
                Outcome::Failed
            }
        }
    }
}

/// Every regular file under `dir`, sorted by path.
///
/// Hidden directories (`.git`, `.cache`, ...) are not descended into.
pub fn walk_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !e.file_name().to_str().is_some_and(|n| n.starts_with('.'))
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}

/// Enumerate non-private files of `category` under `dir`, sorted by path.
pub fn collect_files(dir: &Path, category: FileCategory) -> Vec<PathBuf> {
    walk_files(dir)
        .filter(|path| is_enumerable(path, category))
        .collect()
}
