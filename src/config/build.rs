//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in pagic.toml - source and output trees.
///
/// # Example
/// ```toml
/// [build]
/// src = "src"        # markdown, layouts and assets
/// dist = "public"    # rendered output, cleared on every full build
/// minify = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Source tree.
    #[serde(default = "defaults::build::src")]
    #[educe(Default = defaults::build::src())]
    pub src: PathBuf,

    /// Output tree.
    #[serde(default = "defaults::build::dist")]
    #[educe(Default = defaults::build::dist())]
    pub dist: PathBuf,

    /// Minify rendered HTML before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,
}
