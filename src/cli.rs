//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Render a markdown tree through per-directory layouts, optionally
/// rebuilding incrementally on change
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root; relative paths are resolved against it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: pagic.toml)
    #[arg(short = 'C', long, default_value = "pagic.toml")]
    pub config: PathBuf,

    /// Source directory (relative to project root)
    #[arg(short, long)]
    pub src_dir: Option<PathBuf>,

    /// Output directory (relative to project root)
    #[arg(short, long)]
    pub dist_dir: Option<PathBuf>,

    /// Watch the source directory and rebuild on change
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pagic"]);
        assert_eq!(cli.config, PathBuf::from("pagic.toml"));
        assert!(cli.root.is_none());
        assert!(cli.src_dir.is_none());
        assert!(cli.watch.is_none());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["pagic", "-s", "docs", "-d", "site", "-w"]);
        assert_eq!(cli.src_dir, Some(PathBuf::from("docs")));
        assert_eq!(cli.dist_dir, Some(PathBuf::from("site")));
        assert_eq!(cli.watch, Some(true));
    }

    #[test]
    fn test_explicit_bool() {
        let cli = Cli::parse_from(["pagic", "--watch", "false", "--minify"]);
        assert_eq!(cli.watch, Some(false));
        assert_eq!(cli.minify, Some(true));
    }
}
