//! Utility modules for the static site generator.

pub mod ancestor;
pub mod category;
pub mod minify;
