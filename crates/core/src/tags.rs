//! Tag normalization.
//!
//! Tags arrive either as a comma-separated string typed into the upload form
//! (`"nature, sunset"`) or as a JSON array produced by the vision model. The
//! canonical representation everywhere past the boundary is an ordered
//! `Vec<String>` of trimmed, lowercase, unique, non-empty tags that never
//! contain a comma.

use serde::{Deserialize, Serialize};

/// Separator used by the comma-separated representation.
pub const TAG_SEPARATOR: char = ',';

/// Tags as supplied by a caller, in either accepted representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    List(Vec<String>),
    Text(String),
}

impl TagInput {
    /// Convert to the canonical normalized list.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagInput::List(items) => normalize_tags(items),
            TagInput::Text(text) => parse_tag_list(text),
        }
    }

    /// The comma-separated form shown in an editable text field.
    pub fn to_text(&self) -> String {
        match self {
            TagInput::List(items) => join_tags(items),
            TagInput::Text(text) => text.clone(),
        }
    }
}

/// Parse a comma-separated tag string into the canonical list.
pub fn parse_tag_list(text: &str) -> Vec<String> {
    normalize_tags([text])
}

/// Normalize a sequence of raw tags.
///
/// Each item is split on commas, trimmed and lowercased; empty pieces are
/// dropped and duplicates keep their first position. Normalizing an already
/// normalized list returns it unchanged.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        for piece in item.as_ref().split(TAG_SEPARATOR) {
            let tag = piece.trim().to_lowercase();
            if tag.is_empty() || out.contains(&tag) {
                continue;
            }
            out.push(tag);
        }
    }
    out
}

/// Render a tag list in the comma-separated form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
