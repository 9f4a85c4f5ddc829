//! Authentication for the Staffdesk backend: user accounts, credential
//! lookup, and the in-memory session slot.
//!
//! Passwords are treated as opaque credential strings compared for exact
//! equality; hashing is deliberately out of scope for this layer.

use serde::{Deserialize, Serialize};
use staffdesk_config::CorruptPolicy;
use staffdesk_store::{JsonStore, StoreResult};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub mod broadcaster;

pub use broadcaster::{AuthState, AuthStateBroadcaster, Claims};

/// A user account as stored in the user file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Credential lookup and session-slot ownership.
///
/// The session slot holds at most one authenticated user for the whole
/// process; it is never persisted and is lost on restart. This is a
/// deliberate single-session-per-process design.
#[derive(Clone)]
pub struct AuthService {
    store: JsonStore<User>,
    current: Arc<RwLock<Option<User>>>,
}

impl AuthService {
    /// Create an auth service backed by the user file at `path`.
    pub fn new(path: impl Into<PathBuf>, on_corrupt: CorruptPolicy) -> Self {
        Self {
            store: JsonStore::new(path, on_corrupt),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// First user whose username and password both match exactly.
    ///
    /// No match is `Ok(None)`, never an error; the comparison is
    /// case-sensitive on both fields.
    pub async fn login(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let users = self.store.load_all().await?;
        let user = users
            .into_iter()
            .find(|u| u.username == username && u.password == password);

        match &user {
            Some(_) => debug!(username, "login matched a stored user"),
            None => debug!(username, "login found no matching user"),
        }
        Ok(user)
    }

    /// Append a new account to the user file.
    ///
    /// Username uniqueness is not enforced here; a duplicate is permitted
    /// but logged so operators can spot it.
    pub async fn register(&self, user: User) -> StoreResult<()> {
        let duplicates = self.store.find(|u| u.username == user.username).await?;
        if !duplicates.is_empty() {
            warn!(username = %user.username, "registering a duplicate username");
        }

        self.store.insert(user).await
    }

    /// All registered users in file order.
    pub async fn users(&self) -> StoreResult<Vec<User>> {
        self.store.load_all().await
    }

    /// Set or clear the session slot.
    pub async fn set_current_user(&self, user: Option<User>) {
        let mut current = self.current.write().await;
        *current = user;
    }

    /// The currently authenticated user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_wire_format_uses_pascal_case_names() {
        let user = User {
            username: "amir".into(),
            password: "hunter2".into(),
            role: "Admin".into(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["Username"], "amir");
        assert_eq!(json["Password"], "hunter2");
        assert_eq!(json["Role"], "Admin");
    }
}
