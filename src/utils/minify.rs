//! HTML minification for rendered documents.

use std::borrow::Cow;

/// Minify `html` when `enabled`, borrowing it unchanged otherwise.
pub fn minify(html: &[u8], enabled: bool) -> Cow<'_, [u8]> {
    if enabled {
        Cow::Owned(minify_html_inner(html))
    } else {
        Cow::Borrowed(html)
    }
}

fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &[u8] = b"<html>\n  <body>\n    <!-- note -->\n    <p>  hello  </p>\n  </body>\n</html>\n";

    #[test]
    fn test_disabled_borrows() {
        assert!(matches!(minify(PAGE, false), Cow::Borrowed(b) if b == PAGE));
    }

    #[test]
    fn test_enabled_shrinks() {
        let out = minify(PAGE, true);
        assert!(out.len() < PAGE.len());
        let text = String::from_utf8(out.into_owned()).unwrap();
        assert!(!text.contains("note"));
        assert!(text.contains("hello"));
    }
}
