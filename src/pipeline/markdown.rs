//! Markdown to HTML.

use super::{PageContext, TransformError};
use pulldown_cmark::{Options, Parser, html::push_html};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Replace the markdown body with its HTML rendering.
pub fn render(mut context: PageContext) -> Result<PageContext, TransformError> {
    let parser = Parser::new_ext(&context.content, options());
    let mut html = String::with_capacity(context.content.len() * 3 / 2);
    push_html(&mut html, parser);

    context.content = html;
    Ok(context)
}
