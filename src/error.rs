use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevfeedError {
    #[error("Not in a devfeed project. Run 'devfeed init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .devfeed/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("An account with email '{0}' already exists")]
    EmailTaken(String),

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Share failed: {0}")]
    Share(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// Coarse failure class, used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Session missing or expired; the caller should send the user to login.
    Auth,
    /// Transport, storage or decoding failure; shown as a transient notice.
    Backend,
    /// A required input was missing or malformed; nothing was sent.
    Validation,
}

impl DevfeedError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DevfeedError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DevfeedError::Unauthorized(_) => ErrorKind::Auth,
            DevfeedError::Validation { .. } | DevfeedError::EmailTaken(_) => ErrorKind::Validation,
            _ => ErrorKind::Backend,
        }
    }
}

pub type Result<T> = std::result::Result<T, DevfeedError>;
