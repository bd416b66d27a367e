//! Content transforms applied to every document before its layout renders.
//!
//! The stages run as a left fold over [`PageContext`], in this order:
//!
//! ```text
//! seed {path, content: raw, options}
//!   │
//!   ├── front_matter   strip `---` YAML block into `front_matter`
//!   ├── markdown       markdown body → HTML fragment
//!   └── relative_root  `relative_to_root` for links in the layout
//!   │
//!   ▼
//! layout.render(context)
//! ```
//!
//! Front matter must be stripped before the markdown stage sees the text, and
//! the root path is injected last. Stages only touch the context they are
//! given.

pub mod front_matter;
pub mod markdown;
pub mod relative_root;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Render context threaded through the pipeline and handed to layouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContext {
    /// Document path relative to the source root
    pub path: PathBuf,
    /// Raw text on entry, HTML fragment after the markdown stage
    pub content: String,
    /// Site options (`src_dir`, `dist_dir`, `extra`)
    pub options: Value,
    /// Metadata from the document's front matter block
    pub front_matter: Map<String, Value>,
    /// `""` for root documents, otherwise `"../"` once per directory level
    pub relative_to_root: String,
}

impl PageContext {
    /// Seed context for a document.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, options: Value) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            options,
            front_matter: Map::new(),
            relative_to_root: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid front matter")]
    FrontMatter(#[source] serde_yaml::Error),

    #[error("front matter must be a mapping, found {0}")]
    FrontMatterShape(&'static str),
}

/// A single pipeline stage.
pub type Transform = fn(PageContext) -> Result<PageContext, TransformError>;

/// The stages, in application order.
pub const PIPELINE: &[(&str, Transform)] = &[
    ("front_matter", front_matter::extract),
    ("markdown", markdown::render),
    ("relative_root", relative_root::inject),
];

/// Run the full pipeline over a seed context.
pub fn run(seed: PageContext) -> Result<PageContext, TransformError> {
    run_stages(PIPELINE, seed)
}

/// Fold `seed` through `stages`, stopping at the first failure.
pub fn run_stages(
    stages: &[(&str, Transform)],
    seed: PageContext,
) -> Result<PageContext, TransformError> {
    stages.iter().try_fold(seed, |context, (_, stage)| stage(context))
}
