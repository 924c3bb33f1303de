use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.yaml";

/// Collection ids inside the backend database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionIds {
    pub posts: String,
    pub resources: String,
    pub comments: String,
    pub profiles: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            posts: "posts".to_string(),
            resources: "resources".to_string(),
            comments: "comments".to_string(),
            profiles: "profiles".to_string(),
        }
    }
}

/// Project configuration, stored as `.devfeed/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_id: String,
    pub collections: CollectionIds,
    /// Tag reserved for the curated trending posts.
    pub trending_tag: String,
    /// Origin used to build shareable post links.
    pub share_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_id: "default".to_string(),
            collections: CollectionIds::default(),
            trending_tag: "trend".to_string(),
            share_origin: "http://localhost:5173".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `config.yaml` from the data directory, falling back to defaults
    /// when it does not exist, then apply environment overrides.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_yaml::from_str(&raw)?
        } else {
            Self::default()
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::write(data_dir.join(CONFIG_FILE), serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Apply `DEVFEED_SHARE_ORIGIN` and `DEVFEED_DATABASE_ID`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(origin) = lookup("DEVFEED_SHARE_ORIGIN").filter(|v| !v.is_empty()) {
            self.share_origin = origin;
        }
        if let Some(database_id) = lookup("DEVFEED_DATABASE_ID").filter(|v| !v.is_empty()) {
            self.database_id = database_id;
        }
        self
    }

    pub fn share_url(&self, post_id: &str) -> String {
        format!("{}/post/{}", self.share_origin.trim_end_matches('/'), post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.trending_tag, "trend");
        assert_eq!(config.collections.posts, "posts");
        assert_eq!(config.collections.resources, "resources");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(tmp.path())
            .unwrap()
            .with_overrides(|_| None);
        assert_eq!(config.collections, CollectionIds::default());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.database_id = "67afdbad".to_string();
        config.collections.posts = "feed_posts".to_string();
        config.save(tmp.path()).unwrap();

        let raw = std::fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let parsed: AppConfig = serde_yaml::from_str("trending_tag: hot\n").unwrap();
        assert_eq!(parsed.trending_tag, "hot");
        assert_eq!(parsed.collections.posts, "posts");
        assert_eq!(parsed.share_origin, "http://localhost:5173");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default().with_overrides(|key| match key {
            "DEVFEED_SHARE_ORIGIN" => Some("https://devs.example".to_string()),
            _ => None,
        });
        assert_eq!(config.share_origin, "https://devs.example");
        assert_eq!(config.database_id, "default");
        assert_eq!(config.share_url("abc"), "https://devs.example/post/abc");
    }
}
