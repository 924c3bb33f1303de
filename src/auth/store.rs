use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::entity::Identity;
use crate::error::{DevfeedError, Result};

const AUTH_DB: &str = "auth.db";

/// Account credentials plus the single current session of this client.
pub struct AccountStore {
    conn: Connection,
}

impl AccountStore {
    /// Open or create the accounts database
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(AUTH_DB);
        let conn = Connection::open(path)?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // At most one row: the session this client is signed in with.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id),
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub fn create_account(&self, name: &str, email: &str, password_hash: &str) -> Result<Identity> {
        let email = normalize_email(email);
        let taken: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM accounts WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(DevfeedError::EmailTaken(email));
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email,
        };
        self.conn.execute(
            "INSERT INTO accounts (id, name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                identity.id,
                identity.name,
                identity.email,
                password_hash,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(identity)
    }

    /// Identity and stored hash for an email, if such an account exists.
    pub fn find_credentials(&self, email: &str) -> Result<Option<(Identity, String)>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, email, password_hash FROM accounts WHERE email = ?1",
                params![normalize_email(email)],
                |row| {
                    Ok((
                        Identity {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            email: row.get(2)?,
                        },
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Replace the current session with a new one for `account_id`.
    pub fn start_session(&self, account_id: &str) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute(
            "INSERT INTO sessions (id, account_id, created_at) VALUES (?1, ?2, ?3)",
            params![session_id, account_id, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(session_id)
    }

    pub fn current_identity(&self) -> Result<Option<Identity>> {
        let identity = self
            .conn
            .query_row(
                "SELECT a.id, a.name, a.email
                 FROM sessions s JOIN accounts a ON a.id = s.account_id
                 LIMIT 1",
                [],
                |row| {
                    Ok(Identity {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(identity)
    }

    /// Drop the current session. Returns false when none was open.
    pub fn end_session(&self) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM sessions", [])?;
        Ok(removed > 0)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
