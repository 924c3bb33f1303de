mod comment;
mod post;
mod resource;
pub mod seed;

pub use comment::Comment;
pub use post::{NewPost, Post};
pub use resource::{NewResource, Resource, ResourceType};
pub use seed::{SeedPost, SEED_AUTHOR, SEED_POSTS};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::Document;
use crate::error::{DevfeedError, Result};

/// The signed-in user, as reported by the backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
}

fn required_str(doc: &Document, field: &str) -> Result<String> {
    optional_str(doc, field).ok_or_else(|| {
        DevfeedError::Backend(format!(
            "document {}/{} has no string field '{}'",
            doc.collection, doc.id, field
        ))
    })
}

fn optional_str(doc: &Document, field: &str) -> Option<String> {
    match doc.fields.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Non-negative counter; absent, negative or non-numeric values read as zero.
fn count(doc: &Document, field: &str) -> u64 {
    match doc.fields.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

fn string_list(doc: &Document, field: &str) -> Vec<String> {
    match doc.fields.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DevfeedError::validation(field, "is required"));
    }
    Ok(())
}
