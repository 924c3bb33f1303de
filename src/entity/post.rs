// src/entity/post.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{count, optional_str, require_text, required_str, string_list, Comment, Identity};
use crate::backend::{Document, Fields};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub share_count: u64,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    /// The stored comment array verbatim, including entries that do not read
    /// as a [`Comment`]. Whole-array writes start from this.
    #[serde(skip)]
    pub stored_comments: Vec<Value>,
}

impl Post {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let stored_comments = match doc.fields.get("comments") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let comments = stored_comments
            .iter()
            .filter_map(Comment::from_value)
            .collect();

        Ok(Self {
            id: doc.id.clone(),
            title: required_str(doc, "title")?,
            content: required_str(doc, "content")?,
            author: optional_str(doc, "author").unwrap_or_default(),
            author_name: optional_str(doc, "authorName").unwrap_or_default(),
            created_at: doc.created_at,
            likes: count(doc, "likes"),
            share_count: count(doc, "shareCount"),
            tags: string_list(doc, "tags"),
            comments,
            stored_comments,
        })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append a comment to both views of the list.
    pub fn push_comment(&mut self, comment: Comment) {
        self.stored_comments.push(comment.to_value());
        self.comments.push(comment);
    }

    /// The stored array with `comment` appended, for a whole-array write.
    pub fn comments_with(&self, comment: &Comment) -> Value {
        let mut items = self.stored_comments.clone();
        items.push(comment.to_value());
        Value::Array(items)
    }

    /// First 100 characters of the content followed by an ellipsis.
    pub fn excerpt(&self) -> String {
        let head: String = self.content.chars().take(100).collect();
        format!("{}...", head)
    }
}

/// Input of the "create post" form.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }

    /// Fields for a fresh post: zero counters, no tags, no comments.
    pub fn into_fields(self, author: &Identity) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(self.title));
        fields.insert("content".to_string(), json!(self.content));
        fields.insert("author".to_string(), json!(author.id));
        fields.insert("authorName".to_string(), json!(author.name));
        fields.insert("likes".to_string(), json!(0));
        fields.insert("shareCount".to_string(), json!(0));
        fields.insert("tags".to_string(), json!([]));
        fields.insert("comments".to_string(), json!([]));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(fields: Value) -> Document {
        let now = Utc::now();
        Document {
            id: "p1".to_string(),
            collection: "posts".to_string(),
            created_at: now,
            updated_at: now,
            fields: match fields {
                Value::Object(map) => map,
                _ => Fields::new(),
            },
        }
    }

    #[test]
    fn test_from_document_defaults() {
        let post = Post::from_document(&document(json!({
            "title": "Hi",
            "content": "Body",
        })))
        .unwrap();
        assert_eq!(post.likes, 0);
        assert_eq!(post.share_count, 0);
        assert!(post.tags.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_from_document_reads_mixed_comments() {
        let post = Post::from_document(&document(json!({
            "title": "Hi",
            "content": "Body",
            "likes": 2,
            "shareCount": 7,
            "tags": ["trend"],
            "comments": ["Ada: legacy", {"authorName": "Grace", "content": "new"}, 5],
        })))
        .unwrap();
        assert_eq!(post.likes, 2);
        assert_eq!(post.share_count, 7);
        assert!(post.has_tag("trend"));
        assert_eq!(
            post.comments,
            vec![Comment::new("Ada", "legacy"), Comment::new("Grace", "new")]
        );
        assert_eq!(post.stored_comments.len(), 3);
    }

    #[test]
    fn test_comments_with_keeps_unreadable_entries() {
        let mut post = Post::from_document(&document(json!({
            "title": "Hi",
            "content": "Body",
            "comments": [{"authorName": "Eve"}, 42, "Bob: hi"],
        })))
        .unwrap();
        assert_eq!(post.comments, vec![Comment::new("Bob", "hi")]);

        let reply = Comment::new("Ada", "reply");
        assert_eq!(
            post.comments_with(&reply),
            json!([
                {"authorName": "Eve"},
                42,
                "Bob: hi",
                {"authorName": "Ada", "content": "reply"},
            ])
        );

        post.push_comment(reply.clone());
        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.stored_comments.len(), 4);
        let serialized = serde_json::to_value(&post).unwrap();
        assert!(serialized.get("storedComments").is_none());
    }

    #[test]
    fn test_negative_counters_read_as_zero() {
        let post = Post::from_document(&document(json!({
            "title": "Hi",
            "content": "Body",
            "likes": -4,
        })))
        .unwrap();
        assert_eq!(post.likes, 0);
    }

    #[test]
    fn test_missing_title_is_an_error() {
        assert!(Post::from_document(&document(json!({"content": "Body"}))).is_err());
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let mut post = Post::from_document(&document(json!({"title": "t", "content": "x"}))).unwrap();
        post.content = "é".repeat(150);
        let excerpt = post.excerpt();
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_new_post_validation() {
        assert!(NewPost::new("Title", "Body").validate().is_ok());
        assert!(NewPost::new("  ", "Body").validate().is_err());
        assert!(NewPost::new("Title", "").validate().is_err());
    }

    #[test]
    fn test_new_post_fields() {
        let author = Identity {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let fields = NewPost::new("T", "C").into_fields(&author);
        assert_eq!(fields["author"], json!("u1"));
        assert_eq!(fields["authorName"], json!("Ada"));
        assert_eq!(fields["likes"], json!(0));
        assert_eq!(fields["tags"], json!([]));
    }
}
