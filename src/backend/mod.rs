//! The narrow document-backend contract the dashboard is written against.
//!
//! Everything the feed needs from the outside world goes through [`Backend`]:
//! the current session, and list/create/update on schema-less collections.
//! [`LocalBackend`] persists to the project's `.devfeed/` directory;
//! [`MemoryBackend`] keeps everything in-process and can inject failures and
//! latency for tests.

mod local;
mod memory;
mod query;

pub use local::LocalBackend;
pub use memory::{BackendCall, MemoryBackend};
pub use query::{Filter, Order, Query};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Identity;
use crate::error::Result;

/// Untyped bag of named attributes stored in a document.
pub type Fields = serde_json::Map<String, Value>;

/// Field names the store assigns itself. Queries may filter and order on them.
pub const ID_FIELD: &str = "$id";
pub const CREATED_AT_FIELD: &str = "$createdAt";
pub const UPDATED_AT_FIELD: &str = "$updatedAt";

/// A record in a collection, identified by a server-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collection")]
    pub collection: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Look up an attribute, including the store-assigned `$` fields.
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            ID_FIELD => Some(Value::String(self.id.clone())),
            CREATED_AT_FIELD => Some(Value::String(self.created_at.to_rfc3339())),
            UPDATED_AT_FIELD => Some(Value::String(self.updated_at.to_rfc3339())),
            _ => self.fields.get(field).cloned(),
        }
    }

    /// Overwrite the given attributes, leaving all others untouched.
    pub fn merge(&mut self, partial: Fields, now: DateTime<Utc>) {
        for (key, value) in partial {
            if key.starts_with('$') {
                continue;
            }
            self.fields.insert(key, value);
        }
        self.updated_at = now;
    }
}

/// The backend client consumed by the dashboard.
///
/// Implementations are shared behind an `Arc` and called from concurrent
/// user actions, so every method takes `&self`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identity behind the current session, or `Unauthorized`.
    async fn get_session(&self) -> Result<Identity>;

    /// Register a new account. Does not open a session.
    async fn create_account(&self, name: &str, email: &str, password: &str) -> Result<Identity>;

    /// Open a session for the account, replacing any current session.
    async fn create_session(&self, email: &str, password: &str) -> Result<Identity>;

    /// Close the current session.
    async fn delete_session(&self) -> Result<()>;

    async fn list_documents(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;

    async fn create_document(&self, collection: &str, fields: Fields) -> Result<Document>;

    /// Partial update: only the keys present in `fields` are replaced.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields)
        -> Result<Document>;
}

/// Strictly increasing wall-clock timestamps, so creation order is never tied.
pub(crate) fn monotonic_now(last: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
    let mut now = Utc::now();
    if let Some(prev) = *last {
        if now <= prev {
            now = prev + Duration::microseconds(1);
        }
    }
    *last = Some(now);
    now
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!("Hello"));
        fields.insert("likes".to_string(), json!(3));
        Document {
            id: "doc-1".to_string(),
            collection: "posts".to_string(),
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    #[test]
    fn test_get_reads_system_fields() {
        let doc = sample();
        assert_eq!(doc.get("$id"), Some(json!("doc-1")));
        assert_eq!(doc.get("title"), Some(json!("Hello")));
        assert!(doc.get("missing").is_none());
    }

    #[test]
    fn test_merge_is_partial() {
        let mut doc = sample();
        let later = doc.created_at + Duration::seconds(5);

        let mut partial = Fields::new();
        partial.insert("likes".to_string(), json!(4));
        partial.insert("$id".to_string(), json!("hijack"));
        doc.merge(partial, later);

        assert_eq!(doc.fields["likes"], json!(4));
        assert_eq!(doc.fields["title"], json!("Hello"));
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.updated_at, later);
    }

    #[test]
    fn test_monotonic_now_never_repeats() {
        let mut last = None;
        let a = monotonic_now(&mut last);
        let b = monotonic_now(&mut last);
        let c = monotonic_now(&mut last);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_document_serializes_with_dollar_fields() {
        let doc = sample();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["$id"], json!("doc-1"));
        assert_eq!(value["title"], json!("Hello"));
    }
}
