//! Layout resolution with an explicit render-function registry.
//!
//! A document is rendered by the `_layout.html` closest to it: the resolver
//! walks from the document's directory up to the source root and takes the
//! first directory that owns one.
//!
//! # Registry lifecycle
//!
//! ```text
//! resolve(doc) ── miss ──► loader(path) ──► cache[path] = renderer
//!              ── hit  ──► cache[path]
//!
//! invalidate(path, reload = false)   evict; next resolve reloads on demand
//! invalidate(path, reload = true)    evict and reload now
//! ```
//!
//! The registry lives for the whole process and holds at most one renderer
//! per absolute layout path. A single mutex covers the miss-then-load
//! sequence, so concurrent resolves from the parallel full build never load
//! the same layout twice.

pub mod template;

use crate::{
    log,
    pipeline::PageContext,
    utils::{ancestor::find_nearest_ancestor, category::LAYOUT_FILE},
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// A loaded layout: turns a finished page context into output markup.
pub trait Renderer: Send + Sync {
    fn render(&self, context: &PageContext) -> Result<String, LayoutError>;
}

/// Loads the renderer stored at an absolute layout path.
pub type LayoutLoader =
    Box<dyn Fn(&Path) -> Result<Arc<dyn Renderer>, LayoutError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid layout template `{0}`")]
    Template(PathBuf, #[source] minijinja::Error),

    #[error("layout `{0}` failed to render")]
    Render(PathBuf, #[source] minijinja::Error),
}

/// The layout that governs a document.
#[derive(Clone)]
pub struct LayoutTemplate {
    /// Absolute path of the `_layout.html` file
    pub path: PathBuf,
    pub renderer: Arc<dyn Renderer>,
}

impl LayoutTemplate {
    pub fn render(&self, context: &PageContext) -> Result<String, LayoutError> {
        self.renderer.render(context)
    }
}

pub struct LayoutResolver {
    root: PathBuf,
    loader: LayoutLoader,
    cache: Mutex<FxHashMap<PathBuf, Arc<dyn Renderer>>>,
}

impl LayoutResolver {
    /// Resolver for minijinja layouts under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_loader(root, Box::new(template::load))
    }

    pub fn with_loader(root: impl Into<PathBuf>, loader: LayoutLoader) -> Self {
        Self {
            root: root.into(),
            loader,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Path of the layout file nearest to `document`, without loading it.
    pub fn locate(&self, document: &Path) -> Option<PathBuf> {
        let dir = document.parent()?;
        find_nearest_ancestor(dir, &self.root, LAYOUT_FILE)
    }

    /// Find and load the layout governing `document`.
    ///
    /// `Ok(None)` means no directory between the document and the source
    /// root owns a layout.
    pub fn resolve(&self, document: &Path) -> Result<Option<LayoutTemplate>, LayoutError> {
        let Some(path) = self.locate(document) else {
            return Ok(None);
        };
        let renderer = self.get_or_load(&path)?;
        Ok(Some(LayoutTemplate { path, renderer }))
    }

    fn get_or_load(&self, path: &Path) -> Result<Arc<dyn Renderer>, LayoutError> {
        let mut cache = self.cache.lock();
        if let Some(renderer) = cache.get(path) {
            return Ok(Arc::clone(renderer));
        }

        let renderer = (self.loader)(path)?;
        log!("layout"; "loaded {}", self.display(path));
        cache.insert(path.to_path_buf(), Arc::clone(&renderer));
        Ok(renderer)
    }

    /// Evict the cached renderer for `path`, reloading it when `reload` is set.
    ///
    /// A failed reload leaves the entry evicted.
    pub fn invalidate(&self, path: &Path, reload: bool) -> Result<(), LayoutError> {
        let mut cache = self.cache.lock();
        cache.remove(path);

        if reload {
            let renderer = (self.loader)(path)?;
            log!("layout"; "reloaded {}", self.display(path));
            cache.insert(path.to_path_buf(), renderer);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.lock().contains_key(path)
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root).unwrap_or(path).display().to_string()
    }
}
