use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest nesting accepted in a rich-text tree. The root counts as depth 1.
pub const MAX_TREE_DEPTH: usize = 64;

/// What to do with a node whose type has no registered renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownNodePolicy {
    /// Emit the node's descendant text, escaped, without markup.
    #[default]
    PlainText,
    /// Emit nothing for the node or its descendants.
    Skip,
}

impl FromStr for UnknownNodePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "plain_text" | "plaintext" => Ok(Self::PlainText),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown policy `{other}`, expected `text` or `skip`")),
        }
    }
}

/// Text-run formatting bitmask as stored by the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextFormat(u32);

impl TextFormat {
    pub const BOLD: TextFormat = TextFormat(1);
    pub const ITALIC: TextFormat = TextFormat(1 << 1);
    pub const STRIKETHROUGH: TextFormat = TextFormat(1 << 2);
    pub const UNDERLINE: TextFormat = TextFormat(1 << 3);
    pub const CODE: TextFormat = TextFormat(1 << 4);
    pub const SUBSCRIPT: TextFormat = TextFormat(1 << 5);
    pub const SUPERSCRIPT: TextFormat = TextFormat(1 << 6);
    pub const HIGHLIGHT: TextFormat = TextFormat(1 << 7);

    /// Outermost first. `code` is innermost so its text stays monospaced
    /// whatever else wraps it.
    const TAGS: [(TextFormat, &'static str); 8] = [
        (Self::BOLD, "strong"),
        (Self::ITALIC, "em"),
        (Self::STRIKETHROUGH, "s"),
        (Self::UNDERLINE, "u"),
        (Self::SUBSCRIPT, "sub"),
        (Self::SUPERSCRIPT, "sup"),
        (Self::HIGHLIGHT, "mark"),
        (Self::CODE, "code"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: TextFormat) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_plain(self) -> bool {
        self.0 == 0
    }

    /// Tags to wrap a run in, outermost first. Unknown bits are ignored.
    pub fn tags(self) -> impl DoubleEndedIterator<Item = &'static str> {
        Self::TAGS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, tag)| tag)
    }
}

impl std::ops::BitOr for TextFormat {
    type Output = TextFormat;

    fn bitor(self, rhs: Self) -> Self::Output {
        TextFormat(self.0 | rhs.0)
    }
}

/// Location of a node inside the tree, e.g. `root.children[2].children[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        Self("root".to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.children[{index}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendering result handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOutput {
    /// Sanitised HTML.
    pub html: String,
    /// Whether the document contains a code block.
    pub contains_code: bool,
    /// Node types that had no renderer, in sorted order.
    pub unknown_node_types: BTreeSet<String>,
}

/// Structured errors surfaced by the rich-text renderer. None of them are
/// recoverable for the document at hand; callers fall back to rendering nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("rich-text document must be a JSON object")]
    NotAnObject,
    #[error("rich-text document has no `root` node")]
    MissingRoot,
    #[error("rich-text tree exceeds the maximum depth of {limit} at `{path}`")]
    TooDeep { path: String, limit: usize },
    #[error("malformed node at `{path}`: {reason}")]
    Malformed { path: String, reason: String },
    #[error("field `{field}` of node at `{path}` must be {expected}")]
    InvalidField {
        path: String,
        field: &'static str,
        expected: &'static str,
    },
}

impl RenderError {
    pub fn malformed(path: &NodePath, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_field(path: &NodePath, field: &'static str, expected: &'static str) -> Self {
        Self::InvalidField {
            path: path.to_string(),
            field,
            expected,
        }
    }
}

/// Trait exposed by the rendering pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, document: &serde_json::Value) -> Result<RenderOutput, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tags_nest_in_fixed_order() {
        let format = TextFormat::CODE | TextFormat::BOLD | TextFormat::HIGHLIGHT;
        let tags: Vec<_> = format.tags().collect();
        assert_eq!(tags, ["strong", "mark", "code"]);
    }

    #[test]
    fn format_bits_match_editor_values() {
        assert_eq!(TextFormat::BOLD.bits(), 1);
        assert_eq!(TextFormat::ITALIC.bits(), 2);
        assert_eq!(TextFormat::STRIKETHROUGH.bits(), 4);
        assert_eq!(TextFormat::UNDERLINE.bits(), 8);
        assert_eq!(TextFormat::CODE.bits(), 16);
        assert_eq!(TextFormat::SUBSCRIPT.bits(), 32);
        assert_eq!(TextFormat::SUPERSCRIPT.bits(), 64);
        assert_eq!(TextFormat::HIGHLIGHT.bits(), 128);
    }

    #[test]
    fn unknown_bits_are_ignored() {
        let format = TextFormat::from_bits(1 << 12);
        assert_eq!(format.tags().count(), 0);
    }

    #[test]
    fn policy_parses_config_spellings() {
        assert_eq!(
            "text".parse::<UnknownNodePolicy>(),
            Ok(UnknownNodePolicy::PlainText)
        );
        assert_eq!(
            "SKIP".parse::<UnknownNodePolicy>(),
            Ok(UnknownNodePolicy::Skip)
        );
        assert!("explode".parse::<UnknownNodePolicy>().is_err());
    }

    #[test]
    fn node_paths_describe_position() {
        let path = NodePath::root().child(2).child(0);
        assert_eq!(path.as_str(), "root.children[2].children[0]");
    }
}
