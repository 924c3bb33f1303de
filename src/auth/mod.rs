//! Accounts, sessions and route gating.

mod gate;
mod password;
mod store;

pub use gate::{guard, Gate, Route, SIGN_IN_REQUIRED};
pub use password::{hash_password, verify_password};
pub use store::AccountStore;

use tracing::info;

use crate::backend::Backend;
use crate::entity::Identity;
use crate::error::{DevfeedError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Credential rules enforced by the backends before touching storage.
pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DevfeedError::validation("name", "is required"));
    }
    validate_login(email, password)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DevfeedError::validation(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(DevfeedError::validation("email", "must be a valid address")),
    }
    if password.is_empty() {
        return Err(DevfeedError::validation("password", "is required"));
    }
    Ok(())
}

/// Register and immediately sign in.
pub async fn sign_up(
    backend: &dyn Backend,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Identity> {
    backend.create_account(name, email, password).await?;
    let identity = backend.create_session(email, password).await?;
    info!(user = %identity.id, "account created");
    Ok(identity)
}

pub async fn sign_in(backend: &dyn Backend, email: &str, password: &str) -> Result<Identity> {
    let identity = backend.create_session(email, password).await?;
    info!(user = %identity.id, "signed in");
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_validate_signup() {
        assert!(validate_signup("Ada", "ada@example.com", "longenough").is_ok());
        assert!(validate_signup(" ", "ada@example.com", "longenough").is_err());
        assert!(validate_signup("Ada", "ada.example.com", "longenough").is_err());
        assert!(validate_signup("Ada", "@example.com", "longenough").is_err());
        assert!(validate_signup("Ada", "ada@example.com", "short").is_err());
    }

    #[tokio::test]
    async fn test_sign_up_opens_session() {
        let backend = MemoryBackend::new();
        let identity = sign_up(&backend, "Ada", "ada@example.com", "longenough")
            .await
            .unwrap();
        assert_eq!(backend.get_session().await.unwrap(), identity);
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_password() {
        let backend = MemoryBackend::new();
        sign_up(&backend, "Ada", "ada@example.com", "longenough")
            .await
            .unwrap();
        backend.delete_session().await.unwrap();

        let result = sign_in(&backend, "ada@example.com", "wrong-password").await;
        assert!(matches!(result, Err(DevfeedError::Unauthorized(_))));
        assert!(backend.get_session().await.is_err());
    }
}
