//! crates/docdesk_core/src/mutation.rs
//!
//! The mutation coordinator. Every state-changing backend call runs through
//! the same three phases:
//!
//! 1. **Guard**: required local input must be present and no mutation of the
//!    same kind may be in flight. Deletions also pass a confirmation gate.
//! 2. **Execute**: exactly one gateway call. On failure the cached state is
//!    left untouched and the message is kept for display.
//! 3. **Invalidate**: the cascade refetches the tier the mutation affected.

use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cascade::CascadeController;
use crate::domain::{Document, DocumentId, Summary, UploadFile, Workspace, WorkspaceId};
use crate::ports::{ConfirmationGate, DocumentApi, PortError, PortResult, SaveSink};

const DELETE_WORKSPACE_PROMPT: &str = "Are you sure you want to delete this workspace?";
const DELETE_DOCUMENT_PROMPT: &str = "Are you sure you want to delete this document?";

/// The kinds of mutation, each with its own in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateWorkspace,
    DeleteWorkspace,
    UploadDocument,
    DeleteDocument,
    GenerateSummary,
}

impl MutationKind {
    pub const ALL: [MutationKind; 5] = [
        MutationKind::CreateWorkspace,
        MutationKind::DeleteWorkspace,
        MutationKind::UploadDocument,
        MutationKind::DeleteDocument,
        MutationKind::GenerateSummary,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MutationKind::CreateWorkspace => "Workspace creation",
            MutationKind::DeleteWorkspace => "Workspace deletion",
            MutationKind::UploadDocument => "Document upload",
            MutationKind::DeleteDocument => "Document deletion",
            MutationKind::GenerateSummary => "Summary generation",
        };
        f.write_str(label)
    }
}

/// Result of a mutation that asks for confirmation first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T> {
    Completed(T),
    /// The user said no; nothing was sent.
    Declined,
}

/// Clears its in-flight flag when dropped.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct MutationCoordinator {
    api: Arc<dyn DocumentApi>,
    cascade: Arc<CascadeController>,
    confirmation: Arc<dyn ConfirmationGate>,
    saver: Arc<dyn SaveSink>,
    in_flight: [AtomicBool; 5],
    last_error: ArcSwapOption<String>,
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        cascade: Arc<CascadeController>,
        confirmation: Arc<dyn ConfirmationGate>,
        saver: Arc<dyn SaveSink>,
    ) -> Self {
        Self {
            api,
            cascade,
            confirmation,
            saver,
            in_flight: Default::default(),
            last_error: ArcSwapOption::empty(),
        }
    }

    pub fn is_in_flight(&self, kind: MutationKind) -> bool {
        self.in_flight[kind.index()].load(Ordering::Acquire)
    }

    /// The message of the most recent failed mutation or download.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.load_full().map(|e| e.to_string())
    }

    pub fn dismiss_error(&self) {
        self.last_error.store(None);
    }

    // --- Workspaces ---

    pub async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> PortResult<Workspace> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PortError::Validation("Workspace name is required".to_string()));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let _guard = self.claim(MutationKind::CreateWorkspace)?;
        self.dismiss_error();

        info!(name, "creating workspace");
        let workspace = match self.api.create_workspace(name, description).await {
            Ok(workspace) => workspace,
            Err(e) => return Err(self.surface(MutationKind::CreateWorkspace, e).await),
        };

        if let Err(e) = self.cascade.reload_workspaces().await {
            warn!(error = %e, "workspace list refetch failed after create");
        }
        Ok(workspace)
    }

    pub async fn delete_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> PortResult<MutationOutcome<()>> {
        if self.cascade.snapshot().workspace(workspace_id).is_none() {
            return Err(PortError::Validation(format!(
                "Workspace {workspace_id} is not in the workspace list"
            )));
        }
        let _guard = self.claim(MutationKind::DeleteWorkspace)?;
        if !self.confirmation.confirm(DELETE_WORKSPACE_PROMPT) {
            info!(workspace = %workspace_id, "workspace deletion declined");
            return Ok(MutationOutcome::Declined);
        }
        self.dismiss_error();

        info!(workspace = %workspace_id, "deleting workspace");
        if let Err(e) = self.api.delete_workspace(workspace_id).await {
            return Err(self.surface(MutationKind::DeleteWorkspace, e).await);
        }

        if let Err(e) = self.cascade.reload_workspaces().await {
            warn!(error = %e, "workspace list refetch failed after delete");
        }
        Ok(MutationOutcome::Completed(()))
    }

    // --- Documents ---

    /// Uploads `file` into the selected workspace. Both the workspace and the
    /// file must be chosen before anything is sent.
    pub async fn upload_document(&self, file: Option<UploadFile>) -> PortResult<Document> {
        let Some(workspace_id) = self.cascade.snapshot().selected_workspace else {
            return Err(PortError::Validation("Select a workspace first".to_string()));
        };
        let Some(file) = file else {
            return Err(PortError::Validation("Select a file to upload".to_string()));
        };
        let _guard = self.claim(MutationKind::UploadDocument)?;
        self.dismiss_error();

        info!(
            workspace = %workspace_id,
            filename = %file.filename,
            bytes = file.contents.len(),
            "uploading document"
        );
        let document = match self.api.upload_document(workspace_id, &file).await {
            Ok(document) => document,
            Err(e) => return Err(self.surface(MutationKind::UploadDocument, e).await),
        };

        if let Err(e) = self.cascade.reload_documents().await {
            warn!(error = %e, "document list refetch failed after upload");
        }
        Ok(document)
    }

    pub async fn delete_document(
        &self,
        document_id: DocumentId,
    ) -> PortResult<MutationOutcome<()>> {
        if self.cascade.snapshot().document(document_id).is_none() {
            return Err(PortError::Validation(format!(
                "Document {document_id} is not in the current workspace"
            )));
        }
        let _guard = self.claim(MutationKind::DeleteDocument)?;
        if !self.confirmation.confirm(DELETE_DOCUMENT_PROMPT) {
            info!(document = %document_id, "document deletion declined");
            return Ok(MutationOutcome::Declined);
        }
        self.dismiss_error();

        info!(document = %document_id, "deleting document");
        if let Err(e) = self.api.delete_document(document_id).await {
            return Err(self.surface(MutationKind::DeleteDocument, e).await);
        }

        if let Err(e) = self.cascade.reload_documents().await {
            warn!(error = %e, "document list refetch failed after delete");
        }
        Ok(MutationOutcome::Completed(()))
    }

    /// Fetches the document's bytes and hands them to the save sink under the
    /// document's original filename. Returns that filename.
    pub async fn download_document(&self, document_id: DocumentId) -> PortResult<String> {
        let Some(document) = self.cascade.snapshot().document(document_id).cloned() else {
            return Err(PortError::Validation(format!(
                "Document {document_id} is not in the current workspace"
            )));
        };
        self.dismiss_error();

        info!(document = %document_id, filename = %document.filename, "downloading document");
        let download = match self.api.download_document(document_id).await {
            Ok(download) => download,
            Err(e) => return Err(self.report(e).await),
        };
        if let Err(e) = self.saver.save(&document.filename, download.contents).await {
            return Err(self.report(e).await);
        }
        Ok(document.filename)
    }

    // --- Summaries ---

    /// Generates a summary for the selected document. It replaces the shown
    /// summary only if the selection is unchanged when it arrives.
    pub async fn generate_summary(&self) -> PortResult<Summary> {
        if self.cascade.snapshot().selected_document.is_none() {
            return Err(PortError::Validation("Select a document first".to_string()));
        }
        let _guard = self.claim(MutationKind::GenerateSummary)?;
        let ticket = self.cascade.begin_summary(false).await?;
        self.dismiss_error();

        info!(document = %ticket.document_id, "generating summary");
        let result = self.api.generate_summary(ticket.document_id).await;
        match self.cascade.complete_summary(ticket, result).await {
            Ok(summary) => Ok(summary),
            Err(e) => Err(self.surface(MutationKind::GenerateSummary, e).await),
        }
    }

    // --- Helpers ---

    fn claim(&self, kind: MutationKind) -> PortResult<InFlight<'_>> {
        let flag = &self.in_flight[kind.index()];
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PortError::Busy(kind))?;
        Ok(InFlight { flag })
    }

    async fn surface(&self, kind: MutationKind, e: PortError) -> PortError {
        error!(mutation = %kind, error = %e, "mutation failed");
        self.report(e).await
    }

    async fn report(&self, e: PortError) -> PortError {
        self.last_error.store(Some(Arc::new(e.to_string())));
        self.cascade.absorb(e).await
    }
}
