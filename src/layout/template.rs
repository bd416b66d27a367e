//! minijinja-backed layouts.
//!
//! A `_layout.html` is a template over the page context:
//!
//! ```html
//! <html>
//!   <head>
//!     <title>{{ front_matter.title }}</title>
//!     <link rel="stylesheet" href="{{ relative_to_root }}style.css">
//!   </head>
//!   <body>{{ content }}</body>
//! </html>
//! ```
//!
//! `content` is already HTML and is inserted as-is.

use super::{LayoutError, Renderer};
use crate::pipeline::PageContext;
use minijinja::{Environment, UndefinedBehavior, Value};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Registered without an `.html` suffix so auto-escaping stays off.
const TEMPLATE_NAME: &str = "layout";

pub struct TemplateLayout {
    path: PathBuf,
    env: Environment<'static>,
}

impl TemplateLayout {
    /// Compile template source; syntax errors surface here rather than at render.
    pub fn from_source(path: &Path, source: String) -> Result<Self, LayoutError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.add_template_owned(TEMPLATE_NAME, source)
            .map_err(|e| LayoutError::Template(path.to_path_buf(), e))?;

        Ok(Self {
            path: path.to_path_buf(),
            env,
        })
    }
}

impl Renderer for TemplateLayout {
    fn render(&self, context: &PageContext) -> Result<String, LayoutError> {
        let render_err = |e| LayoutError::Render(self.path.clone(), e);
        let template = self.env.get_template(TEMPLATE_NAME).map_err(render_err)?;
        template
            .render(Value::from_serialize(context))
            .map_err(render_err)
    }
}

/// Default [`super::LayoutLoader`]: read and compile the file at `path`.
pub fn load(path: &Path) -> Result<Arc<dyn Renderer>, LayoutError> {
    let source = fs::read_to_string(path).map_err(|e| LayoutError::Io(path.to_path_buf(), e))?;
    Ok(Arc::new(TemplateLayout::from_source(path, source)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn context() -> PageContext {
        let mut context = PageContext::new("posts/a.md", "<p>hi &amp; bye</p>", json!({"extra": {"site": "Pagic"}}));
        context.front_matter.insert("title".into(), json!("Hello"));
        context.relative_to_root = "../".into();
        context
    }

    fn layout(source: &str) -> TemplateLayout {
        TemplateLayout::from_source(Path::new("/src/_layout.html"), source.into()).unwrap()
    }

    #[test]
    fn test_renders_context_fields() {
        let out = layout("<title>{{ front_matter.title }} - {{ options.extra.site }}</title>")
            .render(&context())
            .unwrap();
        assert_eq!(out, "<title>Hello - Pagic</title>");
    }

    #[test]
    fn test_content_is_not_escaped() {
        let out = layout("<body>{{ content }}</body>").render(&context()).unwrap();
        assert_eq!(out, "<body><p>hi &amp; bye</p></body>");
    }

    #[test]
    fn test_relative_root_and_path() {
        let out = layout("{{ relative_to_root }}style.css {{ path }}").render(&context()).unwrap();
        assert_eq!(out, "../style.css posts/a.md");
    }

    #[test]
    fn test_missing_fields_are_lenient() {
        let out = layout("[{{ front_matter.author.name }}]").render(&context()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_syntax_error_at_load() {
        let result = TemplateLayout::from_source(Path::new("/src/_layout.html"), "{% if %}".into());
        assert!(matches!(result, Err(LayoutError::Template(..))));
    }

    #[test]
    fn test_runtime_error_at_render() {
        let result = layout("{{ \"a\" + 1 }}").render(&context());
        assert!(matches!(result, Err(LayoutError::Render(..))));
    }

    #[test]
    fn test_load_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_layout.html");
        fs::write(&path, "<main>{{ content }}</main>").unwrap();

        let renderer = load(&path).unwrap();
        assert_eq!(renderer.render(&context()).unwrap(), "<main><p>hi &amp; bye</p></main>");
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(load(&tmp.path().join("_layout.html")), Err(LayoutError::Io(..))));
    }
}
