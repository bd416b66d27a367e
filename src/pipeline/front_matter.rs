//! Front matter extraction.
//!
//! ```text
//! ---
//! title: Hello
//! tags: [a, b]
//! ---
//! # Body starts here
//! ```

use super::{PageContext, TransformError};
use serde_json::{Map, Value};
use serde_yaml::Value as Yaml;

const FENCE: &str = "---";

/// Move a leading YAML block out of `content` into `front_matter`.
///
/// Documents without an opening fence, or with an unterminated one, are left
/// untouched.
pub fn extract(mut context: PageContext) -> Result<PageContext, TransformError> {
    let Some((yaml, body)) = split(&context.content) else {
        return Ok(context);
    };

    context.front_matter = parse(yaml)?;
    context.content = body.to_owned();
    Ok(context)
}

/// Split raw text into `(yaml, body)` at the fences.
fn split(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw.strip_prefix(FENCE)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse(yaml: &str) -> Result<Map<String, Value>, TransformError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_yaml::from_str::<Yaml>(yaml).map_err(TransformError::FrontMatter)? {
        Yaml::Null => Ok(Map::new()),
        mapping @ Yaml::Mapping(_) => {
            serde_yaml::from_value(mapping).map_err(TransformError::FrontMatter)
        }
        Yaml::Bool(_) => Err(TransformError::FrontMatterShape("a boolean")),
        Yaml::Number(_) => Err(TransformError::FrontMatterShape("a number")),
        Yaml::String(_) => Err(TransformError::FrontMatterShape("a string")),
        Yaml::Sequence(_) => Err(TransformError::FrontMatterShape("a sequence")),
        Yaml::Tagged(_) => Err(TransformError::FrontMatterShape("a tagged value")),
    }
}
