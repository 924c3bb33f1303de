//! In-process backend with the same document semantics as the persistent one.
//!
//! Besides offline use it records every call and can be told to fail or stall
//! the next call of a given kind, which is how the feed's failure and
//! interleaving behavior is exercised.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{monotonic_now, Backend, Document, Fields, Query};
use crate::auth::{validate_login, validate_signup};
use crate::entity::Identity;
use crate::error::{DevfeedError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    GetSession,
    CreateAccount,
    CreateSession,
    DeleteSession,
    ListDocuments,
    CreateDocument,
    UpdateDocument,
}

struct Account {
    identity: Identity,
    // Plain text: this backend never leaves the process.
    password: String,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Document>>,
    accounts: Vec<Account>,
    session: Option<String>,
    last_timestamp: Option<DateTime<Utc>>,
    calls: Vec<(BackendCall, Option<String>)>,
    fail_next: HashSet<BackendCall>,
    delay_next: HashMap<BackendCall, VecDeque<Duration>>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with one account already signed in.
    pub fn with_session(name: &str, email: &str) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state();
            let identity = Identity {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
            };
            state.session = Some(identity.id.clone());
            state.accounts.push(Account {
                identity,
                password: String::new(),
            });
        }
        backend
    }

    /// Make the next call of this kind fail with a backend error.
    pub fn fail_next(&self, call: BackendCall) {
        self.state().fail_next.insert(call);
    }

    /// Make the next call of this kind wait before doing its work.
    pub fn delay_next(&self, call: BackendCall, delay: Duration) {
        self.state()
            .delay_next
            .entry(call)
            .or_default()
            .push_back(delay);
    }

    pub fn call_count(&self, call: BackendCall) -> usize {
        self.state().calls.iter().filter(|(c, _)| *c == call).count()
    }

    /// Calls of this kind made against one collection.
    pub fn collection_call_count(&self, call: BackendCall, collection: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(c, coll)| *c == call && coll.as_deref() == Some(collection))
            .count()
    }

    /// Raw stored documents, bypassing call recording.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call, then apply any injected delay or failure.
    async fn enter(&self, call: BackendCall, collection: Option<&str>) -> Result<()> {
        let (delay, fail) = {
            let mut state = self.state();
            state.calls.push((call, collection.map(str::to_string)));
            let delay = state
                .delay_next
                .get_mut(&call)
                .and_then(|queue| queue.pop_front());
            let fail = state.fail_next.remove(&call);
            (delay, fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(DevfeedError::Backend(format!("{:?} failed", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_session(&self) -> Result<Identity> {
        self.enter(BackendCall::GetSession, None).await?;
        let state = self.state();
        let session = state
            .session
            .as_ref()
            .ok_or_else(|| DevfeedError::Unauthorized("No active session".to_string()))?;
        state
            .accounts
            .iter()
            .find(|a| &a.identity.id == session)
            .map(|a| a.identity.clone())
            .ok_or_else(|| DevfeedError::Unauthorized("Session expired".to_string()))
    }

    async fn create_account(&self, name: &str, email: &str, password: &str) -> Result<Identity> {
        self.enter(BackendCall::CreateAccount, None).await?;
        validate_signup(name, email, password)?;

        let mut state = self.state();
        let email = email.trim().to_lowercase();
        if state.accounts.iter().any(|a| a.identity.email == email) {
            return Err(DevfeedError::EmailTaken(email));
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email,
        };
        state.accounts.push(Account {
            identity: identity.clone(),
            password: password.to_string(),
        });
        Ok(identity)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Identity> {
        self.enter(BackendCall::CreateSession, None).await?;
        validate_login(email, password)?;

        let mut state = self.state();
        let email = email.trim().to_lowercase();
        let identity = state
            .accounts
            .iter()
            .find(|a| a.identity.email == email && a.password == password)
            .map(|a| a.identity.clone())
            .ok_or_else(|| DevfeedError::Unauthorized("Invalid credentials".to_string()))?;
        state.session = Some(identity.id.clone());
        Ok(identity)
    }

    async fn delete_session(&self) -> Result<()> {
        self.enter(BackendCall::DeleteSession, None).await?;
        match self.state().session.take() {
            Some(_) => Ok(()),
            None => Err(DevfeedError::Unauthorized("No active session".to_string())),
        }
    }

    async fn list_documents(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        self.enter(BackendCall::ListDocuments, Some(collection)).await?;
        let docs = self
            .state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> Result<Document> {
        self.enter(BackendCall::CreateDocument, Some(collection)).await?;
        let mut state = self.state();
        let now = monotonic_now(&mut state.last_timestamp);

        let doc = Document {
            id: Uuid::new_v4().to_string(),
            collection: collection.to_string(),
            created_at: now,
            updated_at: now,
            fields: fields
                .into_iter()
                .filter(|(key, _)| !key.starts_with('$'))
                .collect(),
        };
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document> {
        self.enter(BackendCall::UpdateDocument, Some(collection)).await?;
        let mut state = self.state();
        let now = monotonic_now(&mut state.last_timestamp);

        let doc = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| DevfeedError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.merge(fields, now);
        Ok(doc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[tokio::test]
    async fn test_create_list_update() {
        let backend = MemoryBackend::new();
        let doc = backend
            .create_document("posts", fields(json!({"title": "a", "likes": 0})))
            .await
            .unwrap();
        backend
            .create_document("posts", fields(json!({"title": "b", "likes": 5})))
            .await
            .unwrap();

        let updated = backend
            .update_document("posts", &doc.id, fields(json!({"likes": 9})))
            .await
            .unwrap();
        assert_eq!(updated.fields["title"], json!("a"));

        let listed = backend
            .list_documents("posts", &Query::new().order_desc("likes"))
            .await
            .unwrap();
        assert_eq!(listed[0].id, doc.id);
        assert_eq!(backend.call_count(BackendCall::UpdateDocument), 1);
        assert_eq!(
            backend.collection_call_count(BackendCall::CreateDocument, "posts"),
            2
        );
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.fail_next(BackendCall::ListDocuments);

        assert!(backend.list_documents("posts", &Query::new()).await.is_err());
        assert!(backend.list_documents("posts", &Query::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_document() {
        let backend = MemoryBackend::new();
        let result = backend
            .update_document("posts", "missing", Fields::new())
            .await;
        assert!(matches!(result, Err(DevfeedError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let backend = MemoryBackend::new();
        assert!(backend.get_session().await.is_err());

        backend
            .create_account("Ada", "ada@example.com", "longenough")
            .await
            .unwrap();
        assert!(backend.get_session().await.is_err());

        let duplicate = backend
            .create_account("Ada", "ADA@example.com", "longenough")
            .await;
        assert!(matches!(duplicate, Err(DevfeedError::EmailTaken(_))));

        let identity = backend
            .create_session("ada@example.com", "longenough")
            .await
            .unwrap();
        assert_eq!(backend.get_session().await.unwrap(), identity);

        backend.delete_session().await.unwrap();
        assert!(backend.get_session().await.is_err());
    }
}
