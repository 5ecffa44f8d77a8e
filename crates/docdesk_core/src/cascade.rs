//! crates/docdesk_core/src/cascade.rs
//!
//! The resource cascade controller. It owns the dependent selection chain
//! workspace → documents → document → summary, plus the search results of
//! the selected workspace, and keeps every tier consistent as selections
//! change and as mutations invalidate parents.
//!
//! Each tier carries a generation counter. A request captures the counter
//! when it is issued and its result is applied only if the counter (and the
//! selection it was issued for) is unchanged on completion, so the last
//! selection change wins regardless of the order responses arrive in.

use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::domain::{
    Document, DocumentId, SearchOutcome, Summary, Workspace, WorkspaceId,
};
use crate::ports::{DocumentApi, PortError, PortResult};
use crate::session::SessionStore;

//=========================================================================================
// View Contract
//=========================================================================================

/// One level of the cascade with its own loading and error state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tier<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Tier<T> {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn succeed(&mut self, data: T) {
        self.data = data;
        self.loading = false;
        self.error = None;
    }

    /// Replaces the data wholesale and records the error.
    fn fail(&mut self, data: T, error: &PortError) {
        self.data = data;
        self.loading = false;
        self.error = Some(error.to_string());
    }

    /// Records the error but keeps whatever data the tier already had.
    fn abort(&mut self, error: &PortError) {
        self.loading = false;
        self.error = Some(error.to_string());
    }
}

/// Everything a view layer needs to render the cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeSnapshot {
    pub workspaces: Tier<Vec<Workspace>>,
    pub selected_workspace: Option<WorkspaceId>,
    pub documents: Tier<Vec<Document>>,
    pub selected_document: Option<DocumentId>,
    pub summary: Tier<Option<Summary>>,
    pub search: Tier<Option<SearchOutcome>>,
}

impl CascadeSnapshot {
    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.data.iter().find(|w| w.id == id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.data.iter().find(|d| d.id == id)
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.selected_workspace.and_then(|id| self.workspace(id))
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.selected_document.and_then(|id| self.document(id))
    }
}

//=========================================================================================
// Internal State
//=========================================================================================

#[derive(Debug, Default)]
struct Generations {
    workspaces: u64,
    documents: u64,
    summary: u64,
    search: u64,
}

#[derive(Debug, Default)]
struct CascadeState {
    view: CascadeSnapshot,
    generation: Generations,
}

impl CascadeState {
    /// Drops everything that depends on the selected workspace.
    fn clear_below_workspace(&mut self) {
        self.generation.documents += 1;
        self.view.documents = Tier::default();
        self.view.selected_document = None;
        self.clear_summary();
        self.generation.search += 1;
        self.view.search = Tier::default();
    }

    /// Moves the workspace selection to `target`. Returns the workspace and
    /// documents generation to fetch, if any. Must run in the same critical
    /// section that decided on `target`.
    fn begin_switch(&mut self, target: Option<WorkspaceId>) -> Option<(WorkspaceId, u64)> {
        if self.view.selected_workspace == target {
            return None;
        }
        info!(
            from = ?self.view.selected_workspace,
            to = ?target,
            "workspace selection changed"
        );
        self.view.selected_workspace = target;
        self.clear_below_workspace();
        let workspace_id = target?;
        self.view.documents.start();
        Some((workspace_id, self.generation.documents))
    }

    fn clear_summary(&mut self) {
        self.generation.summary += 1;
        self.view.summary = Tier::default();
    }
}

/// Identifies one in-flight summary request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SummaryTicket {
    generation: u64,
    pub(crate) document_id: DocumentId,
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct CascadeController {
    api: Arc<dyn DocumentApi>,
    session: Arc<SessionStore>,
    state: Mutex<CascadeState>,
    updates: watch::Sender<CascadeSnapshot>,
}

impl CascadeController {
    pub fn new(api: Arc<dyn DocumentApi>, session: Arc<SessionStore>) -> Self {
        let (updates, _) = watch::channel(CascadeSnapshot::default());
        Self {
            api,
            session,
            state: Mutex::new(CascadeState::default()),
            updates,
        }
    }

    /// The latest published state.
    pub fn snapshot(&self) -> CascadeSnapshot {
        self.updates.borrow().clone()
    }

    /// Registers an observer that is notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<CascadeSnapshot> {
        self.updates.subscribe()
    }

    /// Loads the workspaces and, when nothing is selected yet, selects the
    /// first one the backend returned.
    pub async fn mount(&self) -> PortResult<()> {
        self.reload_workspaces().await
    }

    /// Drops all cached data and invalidates every in-flight request.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let generation = &mut state.generation;
        generation.workspaces += 1;
        generation.documents += 1;
        generation.summary += 1;
        generation.search += 1;
        state.view = CascadeSnapshot::default();
        self.publish(&state);
    }

    // --- Workspaces tier ---

    /// Refetches the workspace list. A selection that no longer exists is
    /// dropped and the first workspace is selected instead.
    pub async fn reload_workspaces(&self) -> PortResult<()> {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation.workspaces += 1;
            state.view.workspaces.start();
            self.publish(&state);
            state.generation.workspaces
        };

        let result = self.api.list_workspaces().await;

        let pending = {
            let mut state = self.state.lock().await;
            if state.generation.workspaces != generation {
                debug!(generation, "discarding superseded workspace list");
                return Ok(());
            }
            match result {
                Ok(workspaces) => {
                    debug!(count = workspaces.len(), "workspaces loaded");
                    let kept = state
                        .view
                        .selected_workspace
                        .filter(|id| workspaces.iter().any(|w| w.id == *id));
                    let target = kept.or_else(|| workspaces.first().map(|w| w.id));
                    state.view.workspaces.succeed(workspaces);
                    let pending = state.begin_switch(target);
                    self.publish(&state);
                    pending
                }
                Err(e) => {
                    warn!(error = %e, "failed to load workspaces");
                    state.view.workspaces.fail(Vec::new(), &e);
                    state.view.selected_workspace = None;
                    state.clear_below_workspace();
                    self.publish(&state);
                    drop(state);
                    return Err(self.absorb(e).await);
                }
            }
        };

        match pending {
            Some((workspace_id, generation)) => self.fetch_documents(workspace_id, generation).await,
            None => Ok(()),
        }
    }

    /// Makes `workspace_id` the current workspace and loads its documents.
    pub async fn select_workspace(&self, workspace_id: WorkspaceId) -> PortResult<()> {
        if self.snapshot().workspace(workspace_id).is_none() {
            return Err(PortError::Validation(format!(
                "Workspace {workspace_id} is not in the workspace list"
            )));
        }
        self.switch_workspace(Some(workspace_id)).await
    }

    pub async fn clear_workspace_selection(&self) -> PortResult<()> {
        self.switch_workspace(None).await
    }

    async fn switch_workspace(&self, target: Option<WorkspaceId>) -> PortResult<()> {
        let pending = {
            let mut state = self.state.lock().await;
            let pending = state.begin_switch(target);
            self.publish(&state);
            pending
        };

        match pending {
            Some((workspace_id, generation)) => self.fetch_documents(workspace_id, generation).await,
            None => Ok(()),
        }
    }

    // --- Documents tier ---

    /// Refetches the documents of the current workspace. The existing list
    /// stays visible until the new one arrives.
    pub async fn reload_documents(&self) -> PortResult<()> {
        let (workspace_id, generation) = {
            let mut state = self.state.lock().await;
            let Some(workspace_id) = state.view.selected_workspace else {
                return Err(PortError::Validation("Select a workspace first".to_string()));
            };
            state.generation.documents += 1;
            state.view.documents.start();
            self.publish(&state);
            (workspace_id, state.generation.documents)
        };
        self.fetch_documents(workspace_id, generation).await
    }

    async fn fetch_documents(&self, workspace_id: WorkspaceId, generation: u64) -> PortResult<()> {
        let result = self.api.list_documents(workspace_id).await;

        let mut state = self.state.lock().await;
        if state.generation.documents != generation
            || state.view.selected_workspace != Some(workspace_id)
        {
            debug!(workspace = %workspace_id, "discarding superseded document list");
            return Ok(());
        }

        match result {
            Ok(documents) => {
                debug!(workspace = %workspace_id, count = documents.len(), "documents loaded");
                state.view.documents.succeed(documents);
                if let Some(document_id) = state.view.selected_document {
                    if state.view.document(document_id).is_none() {
                        state.view.selected_document = None;
                        state.clear_summary();
                    }
                }
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                warn!(workspace = %workspace_id, error = %e, "failed to load documents");
                state.view.documents.fail(Vec::new(), &e);
                state.view.selected_document = None;
                state.clear_summary();
                self.publish(&state);
                drop(state);
                Err(self.absorb(e).await)
            }
        }
    }

    /// Selects a document from the current list. Any summary shown for the
    /// previous document is dropped.
    pub async fn select_document(&self, document_id: DocumentId) -> PortResult<()> {
        let mut state = self.state.lock().await;
        if state.view.document(document_id).is_none() {
            return Err(PortError::Validation(format!(
                "Document {document_id} is not in the current workspace"
            )));
        }
        if state.view.selected_document == Some(document_id) {
            return Ok(());
        }
        state.view.selected_document = Some(document_id);
        state.clear_summary();
        self.publish(&state);
        Ok(())
    }

    pub async fn clear_document_selection(&self) {
        let mut state = self.state.lock().await;
        if state.view.selected_document.take().is_some() {
            state.clear_summary();
            self.publish(&state);
        }
    }

    // --- Summary tier ---

    /// Loads the stored summary of the selected document, replacing whatever
    /// summary was shown before.
    pub async fn load_summary(&self) -> PortResult<()> {
        let ticket = self.begin_summary(true).await?;
        let result = self.api.get_summary(ticket.document_id).await;
        match self.complete_summary(ticket, result).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.absorb(e).await),
        }
    }

    /// Opens a summary request for the selected document. `clear_previous`
    /// hides the current summary while the request runs.
    pub(crate) async fn begin_summary(&self, clear_previous: bool) -> PortResult<SummaryTicket> {
        let mut state = self.state.lock().await;
        let Some(document_id) = state.view.selected_document else {
            return Err(PortError::Validation("Select a document first".to_string()));
        };
        state.generation.summary += 1;
        if clear_previous {
            state.view.summary.data = None;
        }
        state.view.summary.start();
        self.publish(&state);
        Ok(SummaryTicket {
            generation: state.generation.summary,
            document_id,
        })
    }

    /// Applies a summary result if its request is still the latest one for
    /// the selected document. The raw result is handed back either way.
    pub(crate) async fn complete_summary(
        &self,
        ticket: SummaryTicket,
        result: PortResult<Summary>,
    ) -> PortResult<Summary> {
        let mut state = self.state.lock().await;
        let current = state.generation.summary == ticket.generation
            && state.view.selected_document == Some(ticket.document_id);
        if !current {
            debug!(document = %ticket.document_id, "discarding superseded summary");
            return result;
        }
        match &result {
            Ok(summary) => state.view.summary.succeed(Some(summary.clone())),
            Err(e) => state.view.summary.abort(e),
        }
        self.publish(&state);
        result
    }

    // --- Search tier ---

    /// Runs a search in the selected workspace. The results replace any
    /// previous results.
    pub async fn search(&self, query: &str) -> PortResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PortError::Validation("Enter a search query".to_string()));
        }

        let (workspace_id, generation) = {
            let mut state = self.state.lock().await;
            let Some(workspace_id) = state.view.selected_workspace else {
                return Err(PortError::Validation("Select a workspace first".to_string()));
            };
            state.generation.search += 1;
            state.view.search.data = None;
            state.view.search.start();
            self.publish(&state);
            (workspace_id, state.generation.search)
        };

        let result = self.api.search(workspace_id, query).await;

        let mut state = self.state.lock().await;
        if state.generation.search != generation
            || state.view.selected_workspace != Some(workspace_id)
        {
            debug!(query, "discarding superseded search results");
            return Ok(());
        }
        match result {
            Ok(results) => {
                debug!(query, hits = results.len(), "search completed");
                state.view.search.succeed(Some(SearchOutcome {
                    query: query.to_string(),
                    results,
                }));
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                warn!(query, error = %e, "search failed");
                state.view.search.fail(None, &e);
                self.publish(&state);
                drop(state);
                Err(self.absorb(e).await)
            }
        }
    }

    // --- Helpers ---

    /// Signs the user out locally when the error says the session is gone.
    /// Must not be called while the state lock is held.
    pub(crate) async fn absorb(&self, error: PortError) -> PortError {
        if error.is_unauthenticated() {
            warn!(error = %error, "session rejected, signing out");
            self.session.clear();
            self.reset().await;
        }
        error
    }

    fn publish(&self, state: &MutexGuard<'_, CascadeState>) {
        self.updates.send_replace(state.view.clone());
    }
}
