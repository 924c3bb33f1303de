// src/entity/comment.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const LEGACY_SEPARATOR: &str = ": ";

/// A comment on a post.
///
/// Stored as `{authorName, content}`. Older posts carry comments as plain
/// `"Name: text"` strings; [`Comment::from_value`] reads both forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "authorName")]
    pub author_display_name: String,
    #[serde(rename = "content")]
    pub text: String,
}

impl Comment {
    pub fn new(author_display_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author_display_name: author_display_name.into(),
            text: text.into(),
        }
    }

    /// Split a legacy `"Name: text"` entry on its first separator. Entries
    /// without one become author-less comments.
    pub fn parse_legacy(raw: &str) -> Self {
        match raw.split_once(LEGACY_SEPARATOR) {
            Some((author, text)) => Self::new(author, text),
            None => Self::new("", raw),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Some(Self::parse_legacy(raw)),
            Value::Object(map) => {
                let text = map.get("content")?.as_str()?;
                let author = map
                    .get("authorName")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(Self::new(author, text))
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "authorName": self.author_display_name,
            "content": self.text,
        })
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.author_display_name.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}{}{}", self.author_display_name, LEGACY_SEPARATOR, self.text)
        }
    }
}
