use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use loro::{LoroDoc, LoroList, LoroMap, LoroValue, ValueOrContainer};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::{monotonic_now, Document, Fields};
use crate::error::{DevfeedError, Result};

pub const DEVFEED_DIR: &str = ".devfeed";
const STORE_DB: &str = "store.db";

const META_MAP: &str = "_meta";
const SEQUENCES: &str = "collection_sequences";
const SEQUENCE_KEY: &str = "$sequence";

/// Collections of schema-less documents kept in a single Loro document and
/// snapshotted to `.devfeed/store.db`.
///
/// Each collection is a top-level map keyed by document id; each document is a
/// nested map holding its attributes plus `$id`, `$createdAt`, `$updatedAt`
/// and a per-collection `$sequence` that fixes insertion order.
pub struct DocumentStore {
    doc: LoroDoc,
    path: PathBuf,
    last_timestamp: Option<DateTime<Utc>>,
}

impl DocumentStore {
    /// Initialize a new devfeed project
    pub fn init(root: &Path) -> Result<Self> {
        let data_dir = root.join(DEVFEED_DIR);

        if data_dir.exists() {
            return Err(DevfeedError::AlreadyInitialized);
        }

        fs::create_dir_all(&data_dir)?;

        let store = Self {
            doc: LoroDoc::new(),
            path: data_dir.join(STORE_DB),
            last_timestamp: None,
        };
        store.save()?;

        Ok(store)
    }

    /// Open an existing devfeed project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(DEVFEED_DIR).join(STORE_DB);

        if !path.exists() {
            return Err(DevfeedError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        Ok(Self {
            doc,
            path,
            last_timestamp: None,
        })
    }

    pub fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// The `.devfeed` directory this store lives in.
    pub fn data_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(DEVFEED_DIR))
    }

    fn next_sequence_number(&self, collection: &str) -> Result<i64> {
        let meta = self.doc.get_map(META_MAP);
        let sequences = meta.get_or_create_container(SEQUENCES, LoroMap::new())?;

        let current = sequences
            .get(collection)
            .and_then(|v| match v {
                ValueOrContainer::Value(LoroValue::I64(n)) => Some(n),
                _ => None,
            })
            .unwrap_or(0);

        let next = current + 1;
        sequences.insert(collection, next)?;
        Ok(next)
    }

    /// Insert a new document with a fresh id and timestamps.
    pub fn create(&mut self, collection: &str, fields: Fields) -> Result<Document> {
        let now = monotonic_now(&mut self.last_timestamp);
        let id = Uuid::new_v4().to_string();
        let sequence = self.next_sequence_number(collection)?;

        let documents = self.doc.get_map(collection);
        let entity_map = documents.insert_container(&id, LoroMap::new())?;

        entity_map.insert("$id", id.clone())?;
        entity_map.insert("$createdAt", timestamp(now))?;
        entity_map.insert("$updatedAt", timestamp(now))?;
        entity_map.insert(SEQUENCE_KEY, sequence)?;

        for (key, value) in &fields {
            if key.starts_with('$') {
                continue;
            }
            write_field(&entity_map, key, value)?;
        }

        self.doc.commit();
        self.get(collection, &id)?
            .ok_or_else(|| DevfeedError::Backend(format!("document {} vanished after insert", id)))
    }

    /// Replace the given attributes of an existing document.
    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> Result<Document> {
        let documents = self.doc.get_map(collection);

        let entity_map = match documents.get(id) {
            Some(ValueOrContainer::Container(loro::Container::Map(map))) => map,
            _ => {
                return Err(DevfeedError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
        };

        let now = monotonic_now(&mut self.last_timestamp);
        entity_map.insert("$updatedAt", timestamp(now))?;

        for (key, value) in &fields {
            if key.starts_with('$') {
                continue;
            }
            write_field(&entity_map, key, value)?;
        }

        self.doc.commit();
        self.get(collection, id)?.ok_or_else(|| DevfeedError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let documents = self.doc.get_map(collection);

        if let LoroValue::Map(map) = documents.get_deep_value() {
            if let Some(LoroValue::Map(entity_map)) = map.get(id) {
                return Ok(parse_document(collection, entity_map).map(|(_, doc)| doc));
            }
        }
        Ok(None)
    }

    /// All documents of a collection in insertion order.
    pub fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let documents = self.doc.get_map(collection);
        let mut entries = Vec::new();

        if let LoroValue::Map(map) = documents.get_deep_value() {
            for (_, entity_value) in map.iter() {
                if let LoroValue::Map(entity_map) = entity_value {
                    if let Some(entry) = parse_document(collection, entity_map) {
                        entries.push(entry);
                    }
                }
            }
        }

        entries.sort_by_key(|(sequence, _)| *sequence);
        Ok(entries.into_iter().map(|(_, doc)| doc).collect())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: Option<&LoroValue>) -> Option<DateTime<Utc>> {
    match value? {
        LoroValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        _ => None,
    }
}

fn parse_document(collection: &str, map: &loro::LoroMapValue) -> Option<(i64, Document)> {
    let id = match map.get("$id")? {
        LoroValue::String(s) => s.to_string(),
        _ => return None,
    };

    let sequence = match map.get(SEQUENCE_KEY) {
        Some(LoroValue::I64(n)) => *n,
        _ => 0,
    };

    let created_at = parse_timestamp(map.get("$createdAt"))?;
    let updated_at = parse_timestamp(map.get("$updatedAt")).unwrap_or(created_at);

    let fields: Fields = map
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.to_string(), to_json(value)))
        .collect();

    Some((
        sequence,
        Document {
            id,
            collection: collection.to_string(),
            created_at,
            updated_at,
            fields,
        },
    ))
}

fn to_loro_scalar(value: &Value) -> LoroValue {
    match value {
        Value::Bool(b) => LoroValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => LoroValue::I64(i),
            None => LoroValue::Double(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => LoroValue::from(s.as_str()),
        _ => LoroValue::Null,
    }
}

/// Write one attribute. Arrays and objects replace any previous container
/// under the key wholesale.
fn write_field(map: &LoroMap, key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            let list = map.insert_container(key, LoroList::new())?;
            for item in items {
                push_item(&list, item)?;
            }
        }
        Value::Object(object) => {
            let child = map.insert_container(key, LoroMap::new())?;
            for (k, v) in object {
                write_field(&child, k, v)?;
            }
        }
        scalar => {
            map.insert(key, to_loro_scalar(scalar))?;
        }
    }
    Ok(())
}

fn push_item(list: &LoroList, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            let child = list.push_container(LoroList::new())?;
            for item in items {
                push_item(&child, item)?;
            }
        }
        Value::Object(object) => {
            let child = list.push_container(LoroMap::new())?;
            for (k, v) in object {
                write_field(&child, k, v)?;
            }
        }
        scalar => {
            list.push(to_loro_scalar(scalar))?;
        }
    }
    Ok(())
}

fn to_json(value: &LoroValue) -> Value {
    match value {
        LoroValue::Bool(b) => Value::Bool(*b),
        LoroValue::I64(n) => Value::from(*n),
        LoroValue::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        LoroValue::String(s) => Value::String(s.to_string()),
        LoroValue::List(items) => Value::Array(items.iter().map(to_json).collect()),
        LoroValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), to_json(v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[test]
    fn test_init_creates_devfeed_directory() {
        let tmp = TempDir::new().unwrap();
        let _store = DocumentStore::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".devfeed").exists());
        assert!(tmp.path().join(".devfeed/store.db").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let tmp = TempDir::new().unwrap();
        DocumentStore::init(tmp.path()).unwrap();

        let result = DocumentStore::init(tmp.path());
        assert!(matches!(result, Err(DevfeedError::AlreadyInitialized)));
    }

    #[test]
    fn test_open_fails_if_not_initialized() {
        let tmp = TempDir::new().unwrap();

        let result = DocumentStore::open(tmp.path());
        assert!(matches!(result, Err(DevfeedError::NotInitialized)));
    }

    #[test]
    fn test_create_and_list_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let mut store = DocumentStore::init(tmp.path()).unwrap();

        let first = store
            .create(
                "posts",
                fields(json!({
                    "title": "First",
                    "likes": 0,
                    "ratio": 0.5,
                    "pinned": false,
                    "tags": ["trend"],
                    "comments": [{"authorName": "Ada", "content": "hi"}, "Bob: legacy"],
                })),
            )
            .unwrap();
        store
            .create("posts", fields(json!({"title": "Second"})))
            .unwrap();
        store.save().unwrap();

        let reopened = DocumentStore::open(tmp.path()).unwrap();
        let docs = reopened.list("posts").unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, first.id);
        assert_eq!(docs[0].fields["title"], json!("First"));
        assert_eq!(docs[0].fields["ratio"], json!(0.5));
        assert_eq!(docs[0].fields["pinned"], json!(false));
        assert_eq!(docs[0].fields["tags"], json!(["trend"]));
        assert_eq!(
            docs[0].fields["comments"],
            json!([{"authorName": "Ada", "content": "hi"}, "Bob: legacy"])
        );
        assert!(!docs[0].fields.contains_key("$sequence"));
        assert!(docs[0].created_at < docs[1].created_at);
    }

    #[test]
    fn test_collections_are_separate() {
        let tmp = TempDir::new().unwrap();
        let mut store = DocumentStore::init(tmp.path()).unwrap();

        store.create("posts", fields(json!({"title": "p"}))).unwrap();
        store
            .create("resources", fields(json!({"title": "r"})))
            .unwrap();

        assert_eq!(store.list("posts").unwrap().len(), 1);
        assert_eq!(store.list("resources").unwrap().len(), 1);
        assert!(store.list("profiles").unwrap().is_empty());
    }

    #[test]
    fn test_update_replaces_only_given_fields() {
        let tmp = TempDir::new().unwrap();
        let mut store = DocumentStore::init(tmp.path()).unwrap();

        let doc = store
            .create(
                "posts",
                fields(json!({"title": "T", "likes": 1, "comments": ["a: 1", "b: 2"]})),
            )
            .unwrap();

        let updated = store
            .update(
                "posts",
                &doc.id,
                fields(json!({"likes": 2, "comments": ["a: 1"]})),
            )
            .unwrap();

        assert_eq!(updated.fields["likes"], json!(2));
        assert_eq!(updated.fields["title"], json!("T"));
        assert_eq!(updated.fields["comments"], json!(["a: 1"]));
        assert!(updated.updated_at > doc.updated_at);
        assert_eq!(updated.created_at, doc.created_at);
    }

    #[test]
    fn test_update_missing_document_fails() {
        let tmp = TempDir::new().unwrap();
        let mut store = DocumentStore::init(tmp.path()).unwrap();

        let result = store.update("posts", "nope", Fields::new());
        assert!(matches!(result, Err(DevfeedError::DocumentNotFound { .. })));
    }
}
