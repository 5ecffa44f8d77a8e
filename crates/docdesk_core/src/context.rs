//! crates/docdesk_core/src/context.rs
//!
//! The process-wide client context: one session store, one backend API, one
//! cascade and one mutation coordinator, wired together at startup.

use std::sync::Arc;
use tracing::{info, warn};

use crate::cascade::CascadeController;
use crate::domain::{Credentials, HealthStatus, Identity, Registration, Session};
use crate::mutation::MutationCoordinator;
use crate::ports::{ConfirmationGate, DocumentApi, PortError, PortResult, SaveSink};
use crate::session::SessionStore;

pub struct ClientContext {
    session: Arc<SessionStore>,
    api: Arc<dyn DocumentApi>,
    cascade: Arc<CascadeController>,
    mutations: MutationCoordinator,
}

impl ClientContext {
    /// Wires the context together. The session store should already have been
    /// restored; the API adapter typically reads its credential from it.
    pub fn new(
        session: Arc<SessionStore>,
        api: Arc<dyn DocumentApi>,
        confirmation: Arc<dyn ConfirmationGate>,
        saver: Arc<dyn SaveSink>,
    ) -> Self {
        let cascade = Arc::new(CascadeController::new(api.clone(), session.clone()));
        let mutations =
            MutationCoordinator::new(api.clone(), cascade.clone(), confirmation, saver);
        Self {
            session,
            api,
            cascade,
            mutations,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cascade(&self) -> &Arc<CascadeController> {
        &self.cascade
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    pub async fn health(&self) -> PortResult<HealthStatus> {
        self.api.health().await
    }

    /// Creates an account and signs in with it.
    pub async fn register(&self, registration: Registration) -> PortResult<Arc<Session>> {
        require("Username", &registration.username)?;
        require("Email", &registration.email)?;
        require("Password", &registration.password)?;

        let grant = self.api.register(&registration).await?;
        self.start_session(grant.access_token, grant.identity).await
    }

    /// Signs in with a username or email. A failed attempt leaves any existing
    /// session as it was.
    pub async fn login(&self, credentials: Credentials) -> PortResult<Arc<Session>> {
        require("Username or email", &credentials.email_or_username)?;
        require("Password", &credentials.password)?;

        let grant = self.api.login(&credentials).await?;
        self.start_session(grant.access_token, grant.identity).await
    }

    /// Tells the backend (best effort) and then drops the local session and
    /// every cached tier.
    pub async fn logout(&self) {
        if self.session.is_active() {
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "backend logout failed, clearing local session anyway");
            }
        }
        self.session.clear();
        self.cascade.reset().await;
        info!("signed out");
    }

    async fn start_session(
        &self,
        credential: String,
        identity: Identity,
    ) -> PortResult<Arc<Session>> {
        let session = self.session.establish(credential, identity)?;
        self.cascade.reset().await;
        Ok(session)
    }
}

fn require(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::Validation(format!("{field} is required")));
    }
    Ok(())
}
