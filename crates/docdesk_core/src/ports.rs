//! crates/docdesk_core/src/ports.rs
//!
//! Defines the service contracts (traits) the orchestration core depends on.
//! These traits form the boundary of the hexagonal architecture: the backend
//! API, durable storage and the two user-facing capabilities (confirming a
//! destructive action, saving a downloaded file) are all supplied from outside.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    AuthGrant, Credentials, Document, DocumentId, Download, HealthStatus, Registration,
    SearchResult, Summary, UploadFile, Workspace, WorkspaceId,
};
use crate::mutation::MutationKind;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and by the orchestration layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// No credential is held, so an authenticated call was never issued.
    #[error("Not signed in")]
    Unauthenticated,
    /// Required local input is missing; caught before any network call.
    #[error("{0}")]
    Validation(String),
    /// The backend answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Remote { status: u16, message: String },
    /// No response was received at all.
    #[error("Network error: {0}")]
    Transport(String),
    /// A persisted record or a response body could not be parsed.
    #[error("Could not decode {0}")]
    Decode(String),
    /// Durable client storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
    /// The same kind of mutation is already running.
    #[error("{0} is already in progress")]
    Busy(MutationKind),
}

impl PortError {
    /// True when the error means the session is gone or was rejected by the
    /// backend, which always forces a local logout.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            PortError::Unauthenticated | PortError::Remote { status: 401, .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::Remote { status: 404, .. })
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The backend document-management API.
///
/// Every method issues exactly one request. Retrying is a caller policy.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    // --- Unauthenticated ---
    async fn health(&self) -> PortResult<HealthStatus>;

    async fn register(&self, registration: &Registration) -> PortResult<AuthGrant>;

    async fn login(&self, credentials: &Credentials) -> PortResult<AuthGrant>;

    // --- Session ---
    async fn logout(&self) -> PortResult<()>;

    // --- Workspaces ---
    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>>;

    async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> PortResult<Workspace>;

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> PortResult<()>;

    // --- Documents ---
    async fn list_documents(&self, workspace_id: WorkspaceId) -> PortResult<Vec<Document>>;

    async fn upload_document(
        &self,
        workspace_id: WorkspaceId,
        file: &UploadFile,
    ) -> PortResult<Document>;

    async fn delete_document(&self, document_id: DocumentId) -> PortResult<()>;

    async fn download_document(&self, document_id: DocumentId) -> PortResult<Download>;

    // --- Search & Summaries ---
    async fn search(&self, workspace_id: WorkspaceId, query: &str)
        -> PortResult<Vec<SearchResult>>;

    async fn generate_summary(&self, document_id: DocumentId) -> PortResult<Summary>;

    /// Fails with a 404 `Remote` error when no summary exists yet.
    async fn get_summary(&self, document_id: DocumentId) -> PortResult<Summary>;
}

/// Durable string key/value storage that survives restarts.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// Synchronous yes/no gate shown before destructive mutations.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Receives downloaded bytes together with the document's filename.
#[async_trait]
pub trait SaveSink: Send + Sync {
    async fn save(&self, filename: &str, contents: Bytes) -> PortResult<()>;
}
