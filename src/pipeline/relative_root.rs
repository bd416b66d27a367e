//! Root-relative prefix for links emitted by layouts.

use super::{PageContext, TransformError};
use std::path::Component;

/// Set `relative_to_root` from the document's directory depth.
///
/// `index.md` → `""`, `posts/a.md` → `"../"`, `a/b/c.md` → `"../../"`.
/// Layouts write `{{ relative_to_root }}style.css`.
pub fn inject(mut context: PageContext) -> Result<PageContext, TransformError> {
    let depth = context
        .path
        .parent()
        .map(|dir| {
            dir.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);

    context.relative_to_root = "../".repeat(depth);
    Ok(context)
}
