//! crates/docdesk_core/src/session.rs
//!
//! The session store: owns the bearer credential and identity record and keeps
//! them in sync with durable storage. No network calls originate here.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{Identity, Session};
use crate::ports::{KeyValueStorage, PortError, PortResult};

/// Storage key for the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the JSON-encoded identity.
pub const IDENTITY_KEY: &str = "user";

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    current: ArcSwapOption<Session>,
}

impl SessionStore {
    /// Creates an empty store. Call [`SessionStore::restore`] to load any
    /// persisted session.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            current: ArcSwapOption::empty(),
        }
    }

    /// Loads the persisted session, failing closed.
    ///
    /// Both entries must be present and the identity must parse. Anything
    /// less yields `None` and the persisted entries are removed.
    pub fn restore(&self) -> Option<Arc<Session>> {
        match self.read_persisted() {
            Ok(Some(session)) => {
                info!(user = %session.identity.username, "restored persisted session");
                let session = Arc::new(session);
                self.current.store(Some(session.clone()));
                Some(session)
            }
            Ok(None) => {
                debug!("no persisted session");
                self.current.store(None);
                None
            }
            Err(e) => {
                warn!(error = %e, "discarding unusable persisted session");
                self.current.store(None);
                self.remove_persisted();
                None
            }
        }
    }

    /// Persists both entries and makes the session current.
    ///
    /// If either write fails, both entries are removed and no session is
    /// current.
    pub fn establish(&self, credential: String, identity: Identity) -> PortResult<Arc<Session>> {
        let identity_json = serde_json::to_string(&identity)
            .map_err(|e| PortError::Decode(format!("identity record: {e}")))?;
        let written = self
            .storage
            .set(TOKEN_KEY, &credential)
            .and_then(|()| self.storage.set(IDENTITY_KEY, &identity_json));
        if let Err(e) = written {
            warn!(error = %e, "failed to persist session, signing out");
            self.current.store(None);
            self.remove_persisted();
            return Err(e);
        }

        let session = Arc::new(Session {
            credential,
            identity,
        });
        self.current.store(Some(session.clone()));
        info!(user = %session.identity.username, "session established");
        Ok(session)
    }

    /// Drops the in-memory session and both persisted entries. Idempotent.
    pub fn clear(&self) {
        if self.current.swap(None).is_some() {
            info!("session cleared");
        }
        self.remove_persisted();
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    pub fn credential(&self) -> Option<String> {
        self.current
            .load_full()
            .map(|session| session.credential.clone())
    }

    pub fn is_active(&self) -> bool {
        self.current.load().is_some()
    }

    fn read_persisted(&self) -> PortResult<Option<Session>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let identity = self.storage.get(IDENTITY_KEY)?;

        match (token, identity) {
            (None, None) => Ok(None),
            (Some(token), Some(identity)) => {
                if token.trim().is_empty() {
                    return Err(PortError::Decode("empty persisted token".to_string()));
                }
                let identity: Identity = serde_json::from_str(&identity)
                    .map_err(|e| PortError::Decode(format!("persisted identity: {e}")))?;
                Ok(Some(Session {
                    credential: token,
                    identity,
                }))
            }
            _ => Err(PortError::Decode(
                "only one of the two session entries is present".to_string(),
            )),
        }
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "failed to remove persisted session entry");
            }
        }
    }
}
