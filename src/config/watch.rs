//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[watch]` section in pagic.toml.
///
/// # Example
/// ```toml
/// [watch]
/// enable = true   # keep rebuilding after the initial build
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Start a watch session after the initial full build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Log every file event as it is routed.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub verbose: bool,
}
