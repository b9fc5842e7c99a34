//! Credential persistence.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_KEY: &str = "user";

/// Bearer credentials issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Minimal profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Credentials held durably plus a session-scoped copy.
///
/// The session copy is consulted first and is lost with the process; the
/// durable copy survives restarts through the backing store.
pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    session: ArcSwapOption<Credentials>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            session: ArcSwapOption::empty(),
        }
    }

    /// Persist credentials and the user profile after a successful login.
    pub fn save(&self, credentials: Credentials, user: &UserProfile) -> Result<(), StorageError> {
        self.durable
            .set(ACCESS_TOKEN_KEY, credentials.access_token.clone())?;
        match &credentials.refresh_token {
            Some(token) => self.durable.set(REFRESH_TOKEN_KEY, token.clone())?,
            None => self.durable.delete(REFRESH_TOKEN_KEY)?,
        }
        self.durable.set(USER_KEY, serde_json::to_string(user)?)?;
        self.session.store(Some(Arc::new(credentials)));
        Ok(())
    }

    /// Current credentials, if any.
    pub fn credentials(&self) -> Option<Arc<Credentials>> {
        if let Some(creds) = self.session.load_full() {
            return Some(creds);
        }

        let access_token = match self.durable.get(ACCESS_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored access token");
                return None;
            }
        };
        let refresh_token = self.durable.get(REFRESH_TOKEN_KEY).ok().flatten();

        let creds = Arc::new(Credentials {
            access_token,
            refresh_token,
        });
        self.session.store(Some(creds.clone()));
        Some(creds)
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials().map(|c| c.access_token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.durable.get(USER_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Stored user profile is unreadable");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }

    /// Remove credentials from both the session copy and the durable store.
    ///
    /// Storage faults are logged; the session copy is always cleared.
    pub fn clear(&self) {
        self.session.store(None);
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.durable.delete(key) {
                tracing::error!(key, error = %e, "Failed to clear stored credential");
            }
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.session.load().is_some())
            .finish()
    }
}
