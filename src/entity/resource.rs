// src/entity/resource.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::{optional_str, require_text, required_str, Identity};
use crate::backend::{Document, Fields};
use crate::error::{DevfeedError, Result};

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Link,
    Pdf,
    Video,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Link => write!(f, "link"),
            ResourceType::Pdf => write!(f, "pdf"),
            ResourceType::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "link" => Ok(ResourceType::Link),
            "pdf" => Ok(ResourceType::Pdf),
            "video" => Ok(ResourceType::Video),
            _ => Err(format!("Invalid resource type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub url: String,
    pub author: String,
    pub author_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let kind = match optional_str(doc, "type") {
            Some(raw) => raw.parse().map_err(DevfeedError::Backend)?,
            None => ResourceType::default(),
        };

        Ok(Self {
            id: doc.id.clone(),
            title: required_str(doc, "title")?,
            kind,
            url: required_str(doc, "url")?,
            author: optional_str(doc, "author").unwrap_or_default(),
            author_name: optional_str(doc, "authorName").unwrap_or_default(),
            description: optional_str(doc, "description"),
            created_at: doc.created_at,
        })
    }
}

/// Input of the "share a resource" form.
#[derive(Debug, Clone, Default)]
pub struct NewResource {
    pub title: String,
    pub kind: ResourceType,
    pub url: String,
    pub description: Option<String>,
}

impl NewResource {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        if self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(DevfeedError::validation(
                "title",
                format!("must be at most {} characters", MAX_TITLE_LENGTH),
            ));
        }

        require_text("url", &self.url)?;
        let url = Url::parse(self.url.trim())
            .map_err(|e| DevfeedError::validation("url", format!("is not a valid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(DevfeedError::validation(
                "url",
                "must be an http:// or https:// URL",
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(DevfeedError::validation(
                    "description",
                    format!("must be at most {} characters", MAX_DESCRIPTION_LENGTH),
                ));
            }
        }
        Ok(())
    }

    pub fn into_fields(self, author: &Identity) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(self.title));
        fields.insert("type".to_string(), json!(self.kind.to_string()));
        fields.insert("url".to_string(), json!(self.url.trim()));
        fields.insert("author".to_string(), json!(author.id));
        fields.insert("authorName".to_string(), json!(author.name));
        if let Some(description) = self.description {
            fields.insert("description".to_string(), json!(description));
        }
        fields
    }
}
