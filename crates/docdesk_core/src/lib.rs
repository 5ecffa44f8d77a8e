pub mod cascade;
pub mod context;
pub mod domain;
pub mod memory;
pub mod mutation;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use cascade::{CascadeController, CascadeSnapshot, Tier};
pub use context::ClientContext;
pub use domain::{
    AuthGrant, Credentials, Document, DocumentId, Download, HealthStatus, Identity, Registration,
    SearchOutcome, SearchResult, Session, Summary, UploadFile, Workspace, WorkspaceId,
};
pub use memory::MemoryStorage;
pub use mutation::{MutationCoordinator, MutationKind, MutationOutcome};
pub use ports::{
    ConfirmationGate, DocumentApi, KeyValueStorage, PortError, PortResult, SaveSink,
};
pub use session::SessionStore;
