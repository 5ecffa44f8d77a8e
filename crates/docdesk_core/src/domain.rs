//! crates/docdesk_core/src/domain.rs
//!
//! Defines the core data structures the client works with.
//! Wire formats live in the gateway adapter; only the identity record is
//! serialized here because it is persisted to durable client storage.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Backend identifier of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub i64);

/// Backend identifier of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

//=========================================================================================
// Session
//=========================================================================================

/// The signed-in user as reported by the backend at login/register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// The authenticated credential + identity pair held by the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub identity: Identity,
}

// The bearer token never ends up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// What the backend hands back after a successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub access_token: String,
    pub identity: Identity,
}

/// Input for `POST /auth/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input for `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email_or_username: String,
    pub password: String,
}

//=========================================================================================
// Resources
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
}

/// A document inside a workspace. Only `id`, `filename` and `created_at` are
/// guaranteed; the rest is whatever the backend chose to report.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub workspace_id: Option<WorkspaceId>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub status: Option<String>,
}

/// One hit from a workspace search. `score` is expected in `[0, 1]` but is
/// not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub document_name: Option<String>,
    pub score: Option<f64>,
    pub snippet: Option<String>,
}

/// The results of one search, tagged with the query that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub document_id: DocumentId,
    pub document_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
}

/// Response of the unauthenticated `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

//=========================================================================================
// Payloads
//=========================================================================================

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub contents: Bytes,
}

/// Raw bytes of a downloaded document.
#[derive(Debug, Clone)]
pub struct Download {
    pub contents: Bytes,
    /// Filename suggested by the server, if it sent one.
    pub filename: Option<String>,
}
