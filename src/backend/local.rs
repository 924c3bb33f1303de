use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Backend, Document, Fields, Query};
use crate::auth::{hash_password, validate_login, validate_signup, verify_password, AccountStore};
use crate::entity::Identity;
use crate::error::{DevfeedError, Result};
use crate::storage::DocumentStore;

/// Backend persisted in a project's `.devfeed/` directory: documents in the
/// Loro store, accounts and the current session in SQLite.
pub struct LocalBackend {
    documents: Mutex<DocumentStore>,
    accounts: Mutex<AccountStore>,
    data_dir: PathBuf,
}

impl LocalBackend {
    /// Create `.devfeed/` under `root`.
    pub fn init(root: &Path) -> Result<Self> {
        let documents = DocumentStore::init(root)?;
        Self::from_store(documents)
    }

    pub fn open(root: &Path) -> Result<Self> {
        let documents = DocumentStore::open(root)?;
        Self::from_store(documents)
    }

    fn from_store(documents: DocumentStore) -> Result<Self> {
        let data_dir = documents.data_dir().to_path_buf();
        let accounts = AccountStore::open(&data_dir)?;
        Ok(Self {
            documents: Mutex::new(documents),
            accounts: Mutex::new(accounts),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn get_session(&self) -> Result<Identity> {
        self.accounts
            .lock()
            .await
            .current_identity()?
            .ok_or_else(|| DevfeedError::Unauthorized("No active session".to_string()))
    }

    async fn create_account(&self, name: &str, email: &str, password: &str) -> Result<Identity> {
        validate_signup(name, email, password)?;
        let hash = hash_password(password)?;
        let identity = self
            .accounts
            .lock()
            .await
            .create_account(name, email, &hash)?;
        debug!(user = %identity.id, "account stored");
        Ok(identity)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Identity> {
        validate_login(email, password)?;
        let accounts = self.accounts.lock().await;
        let (identity, hash) = accounts
            .find_credentials(email)?
            .ok_or_else(|| DevfeedError::Unauthorized("Invalid credentials".to_string()))?;
        verify_password(password, &hash)?;
        accounts.start_session(&identity.id)?;
        Ok(identity)
    }

    async fn delete_session(&self) -> Result<()> {
        if self.accounts.lock().await.end_session()? {
            Ok(())
        } else {
            Err(DevfeedError::Unauthorized("No active session".to_string()))
        }
    }

    async fn list_documents(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let docs = self.documents.lock().await.list(collection)?;
        Ok(query.apply(docs))
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> Result<Document> {
        let mut store = self.documents.lock().await;
        let doc = store.create(collection, fields)?;
        store.save()?;
        debug!(collection, id = %doc.id, "document created");
        Ok(doc)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document> {
        let mut store = self.documents.lock().await;
        let doc = store.update(collection, id, fields)?;
        store.save()?;
        debug!(collection, id, "document updated");
        Ok(doc)
    }
}
