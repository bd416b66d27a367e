//! Site configuration management for `pagic.toml`.
//!
//! The file is optional; every field has a default and CLI flags override
//! whatever it sets.
//!
//! | Section    | Purpose                                  |
//! |------------|------------------------------------------|
//! | `[build]`  | Source/output trees, minification        |
//! | `[watch]`  | Incremental rebuild session              |
//! | `[extra]`  | User values exposed to layouts           |
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "src"
//! dist = "public"
//!
//! [watch]
//! enable = true
//!
//! [extra]
//! site_name = "My Notes"
//! ```

mod build;
pub mod defaults;
mod error;
mod watch;

use build::BuildConfig;
use error::ConfigError;
use watch::WatchConfig;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing pagic.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `root/<cli.config>` if present, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Update configuration with CLI arguments and absolutize every path.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));

        update_option(&mut self.build.src, cli.src_dir.as_ref());
        update_option(&mut self.build.dist, cli.dist_dir.as_ref());
        update_option(&mut self.build.minify, cli.minify.as_ref());
        update_option(&mut self.watch.enable, cli.watch.as_ref());

        self.config_path = normalize_path(&root.join(&cli.config));
        self.build.src = normalize_path(&root.join(expand_tilde(&self.build.src)));
        self.build.dist = normalize_path(&root.join(expand_tilde(&self.build.dist)));
        self.root = root;
    }

    /// Check that the source tree exists and that clearing the output tree
    /// can never touch it.
    pub fn validate(&self) -> Result<()> {
        let (src, dist) = (&self.build.src, &self.build.dist);

        if !src.exists() {
            bail!(ConfigError::Validation(format!(
                "[build.src] not found: {}",
                src.display()
            )));
        }
        if !src.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.src] is not a directory: {}",
                src.display()
            )));
        }
        if src == dist {
            bail!(ConfigError::Validation(
                "[build.src] and [build.dist] must differ".into()
            ));
        }
        if src.starts_with(dist) {
            bail!(ConfigError::Validation(
                "[build.dist] must not contain [build.src]".into()
            ));
        }
        if dist.starts_with(src) {
            bail!(ConfigError::Validation(
                "[build.dist] must not be inside [build.src]".into()
            ));
        }

        Ok(())
    }

    /// Site options handed to layouts as `options`.
    pub fn template_options(&self) -> Value {
        json!({
            "src_dir": self.build.src,
            "dist_dir": self.build.dist,
            "extra": self.extra,
        })
    }
}

/// Update config option if CLI value is provided
fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
    if let Some(option) = cli_option {
        *config_option = option.clone();
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    crate::utils::category::normalize_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("pagic").chain(args.iter().copied()))
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = SiteConfig::from_str("").unwrap();
        assert_eq!(config.build.src, PathBuf::from("src"));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[serve]\nport = 1").is_err());
    }

    #[test]
    fn test_load_without_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_str().unwrap();

        let config = SiteConfig::load(&cli(&["--root", root])).unwrap();
        assert!(config.build.src.ends_with("src"));
        assert!(config.build.dist.ends_with("public"));
        assert!(config.build.src.is_absolute());
        assert!(!config.watch.enable);
    }

    #[test]
    fn test_cli_overrides_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("pagic.toml"),
            "[build]\nsrc = \"docs\"\ndist = \"site\"\n[watch]\nenable = true\n[extra]\nname = \"n\"",
        )
        .unwrap();
        let root = tmp.path().to_str().unwrap();

        let config = SiteConfig::load(&cli(&["-r", root, "-d", "out", "-w", "false"])).unwrap();
        assert!(config.build.src.ends_with("docs"));
        assert!(config.build.dist.ends_with("out"));
        assert!(!config.watch.enable);
        assert_eq!(config.extra.get("name"), Some(&toml::Value::String("n".into())));
    }

    #[test]
    fn test_validate() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        let root = tmp.path().to_str().unwrap();

        assert!(SiteConfig::load(&cli(&["-r", root])).unwrap().validate().is_ok());
        assert!(SiteConfig::load(&cli(&["-r", root, "-s", "missing"])).unwrap().validate().is_err());
        assert!(SiteConfig::load(&cli(&["-r", root, "-d", "src"])).unwrap().validate().is_err());
        assert!(SiteConfig::load(&cli(&["-r", root, "-d", "src/out"])).unwrap().validate().is_err());
        assert!(SiteConfig::load(&cli(&["-r", root, "-d", "."])).unwrap().validate().is_err());
    }

    #[test]
    fn test_template_options() {
        let mut config = SiteConfig::from_str("[extra]\nsite_name = \"Notes\"").unwrap();
        config.build.src = PathBuf::from("/site/src");

        let options = config.template_options();
        assert_eq!(options["src_dir"], json!("/site/src"));
        assert_eq!(options["extra"]["site_name"], json!("Notes"));
    }
}
