//! Field encodings that ride inside otherwise ordinary JSON.
//!
//! The package format stores three kinds of values as JSON strings with
//! their own grammar:
//!
//! - [`Point`]: `"{0.5, 0.67135115527602085}"`
//! - [`PointList`]: `"{{0, 0},{1, 1}}"`
//! - [`Archive`]: base64 text of a binary property list
//!
//! Each type implements `Serialize`/`Deserialize` so the model can use it
//! as a plain field type; the raw string form never leaves this module.

mod archive;
mod point;
mod point_list;

pub use archive::Archive;
pub use point::Point;
pub use point_list::PointList;

use thiserror::Error;

use crate::plist::PlistError;

/// Errors for values that are valid JSON strings but break their grammar.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed point {0:?}, expected \"{{x, y}}\"")]
    MalformedPoint(String),
    #[error("point {text:?} has {found} components, expected 2")]
    PointArity { text: String, found: usize },
    #[error("malformed point list {0:?}, expected \"{{{{x1, y1}},{{x2, y2}}}}\"")]
    MalformedPointList(String),
    #[error("coordinate {0} is not a finite number")]
    NonFinite(f64),
    #[error("archive is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("archive is not a valid binary property list: {0}")]
    Archive(#[from] PlistError),
    #[error("archive top object is not a dictionary")]
    NotADictionary,
}

/// Swap the ad hoc tuple braces for JSON array brackets.
///
/// Returns `None` unless the trimmed text is wrapped in one pair of braces.
fn braces_to_brackets(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return None;
    }
    Some(
        trimmed
            .chars()
            .map(|c| match c {
                '{' => '[',
                '}' => ']',
                other => other,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braces_to_brackets() {
        assert_eq!(braces_to_brackets(" {1, 2} ").as_deref(), Some("[1, 2]"));
        assert_eq!(
            braces_to_brackets("{{0, 0},{1, 1}}").as_deref(),
            Some("[[0, 0],[1, 1]]")
        );
        assert_eq!(braces_to_brackets("not-braces"), None);
        assert_eq!(braces_to_brackets("{"), None);
        assert_eq!(braces_to_brackets("[1, 2]"), None);
    }
}
