//! crates/docdesk_core/src/test_support.rs
//!
//! An in-memory `DocumentApi` for tests. Individual calls can be held open
//! to force out-of-order completion, or made to fail once.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::domain::{
    AuthGrant, Credentials, Document, DocumentId, Download, HealthStatus, Identity, Registration,
    SearchResult, Summary, UploadFile, Workspace, WorkspaceId,
};
use crate::ports::{ConfirmationGate, DocumentApi, PortError, PortResult, SaveSink};

pub(crate) const ALPHA: WorkspaceId = WorkspaceId(1);
pub(crate) const BETA: WorkspaceId = WorkspaceId(2);

#[derive(Default)]
struct Backend {
    next_id: i64,
    workspaces: Vec<Workspace>,
    documents: Vec<Document>,
    summaries: HashMap<DocumentId, Summary>,
}

impl Backend {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn document(&self, id: DocumentId) -> PortResult<&Document> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("Document not found"))
    }
}

fn not_found(message: &str) -> PortError {
    PortError::Remote {
        status: 404,
        message: message.to_string(),
    }
}

fn document(id: i64, workspace: WorkspaceId, filename: &str) -> Document {
    Document {
        id: DocumentId(id),
        filename: filename.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        workspace_id: Some(workspace),
        mime_type: None,
        size_bytes: None,
        status: None,
    }
}

/// A call that has been stopped at the fake's front door.
pub(crate) struct HeldCall {
    entered: Option<oneshot::Receiver<()>>,
    release: oneshot::Sender<()>,
}

impl HeldCall {
    /// Waits until the held call has actually been issued.
    pub(crate) async fn entered(&mut self) {
        if let Some(entered) = self.entered.take() {
            let _ = entered.await;
        }
    }

    pub(crate) fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    backend: Mutex<Backend>,
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, (oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    failures: Mutex<HashMap<String, PortError>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        let api = Self::default();
        api.backend.lock().unwrap().next_id = 100;
        api
    }

    /// Two workspaces, Alpha with two documents and Beta with one.
    pub(crate) fn seeded() -> Self {
        let api = Self::new();
        {
            let mut backend = api.backend.lock().unwrap();
            backend.workspaces = vec![
                Workspace {
                    id: ALPHA,
                    name: "Alpha".to_string(),
                    description: None,
                },
                Workspace {
                    id: BETA,
                    name: "Beta".to_string(),
                    description: Some("second".to_string()),
                },
            ];
            backend.documents = vec![
                document(11, ALPHA, "alpha-1.pdf"),
                document(12, ALPHA, "alpha-2.txt"),
                document(21, BETA, "beta-1.md"),
            ];
        }
        api
    }

    /// Every call label issued so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Holds the next call with this label until the handle is released.
    pub(crate) fn hold(&self, label: &str) -> HeldCall {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(label.to_string(), (entered_tx, release_rx));
        HeldCall {
            entered: Some(entered_rx),
            release: release_tx,
        }
    }

    /// Makes the next call with this label fail with `error`.
    pub(crate) fn fail_next(&self, label: &str, error: PortError) {
        self.failures
            .lock()
            .unwrap()
            .insert(label.to_string(), error);
    }

    pub(crate) fn put_summary(&self, document_id: DocumentId, text: &str) {
        self.backend.lock().unwrap().summaries.insert(
            document_id,
            Summary {
                document_id,
                document_name: None,
                created_at: None,
                text: text.to_string(),
            },
        );
    }

    async fn enter(&self, label: String) -> PortResult<()> {
        self.calls.lock().unwrap().push(label.clone());
        let gate = self.gates.lock().unwrap().remove(&label);
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.await;
        }
        let failure = self.failures.lock().unwrap().remove(&label);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn grant(identity: Identity) -> AuthGrant {
        AuthGrant {
            access_token: format!("token-for-{}", identity.username),
            identity,
        }
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn health(&self) -> PortResult<HealthStatus> {
        self.enter("health".to_string()).await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            message: "ok".to_string(),
        })
    }

    async fn register(&self, registration: &Registration) -> PortResult<AuthGrant> {
        self.enter("register".to_string()).await?;
        Ok(Self::grant(Identity {
            id: 1,
            username: registration.username.clone(),
            email: registration.email.clone(),
        }))
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<AuthGrant> {
        self.enter("login".to_string()).await?;
        if credentials.password != "secret" {
            return Err(PortError::Remote {
                status: 401,
                message: "Incorrect email/username or password".to_string(),
            });
        }
        Ok(Self::grant(Identity {
            id: 1,
            username: credentials.email_or_username.clone(),
            email: format!("{}@example.com", credentials.email_or_username),
        }))
    }

    async fn logout(&self) -> PortResult<()> {
        self.enter("logout".to_string()).await
    }

    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>> {
        self.enter("list_workspaces".to_string()).await?;
        Ok(self.backend.lock().unwrap().workspaces.clone())
    }

    async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> PortResult<Workspace> {
        self.enter("create_workspace".to_string()).await?;
        let mut backend = self.backend.lock().unwrap();
        let workspace = Workspace {
            id: WorkspaceId(backend.allocate_id()),
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        backend.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> PortResult<()> {
        self.enter(format!("delete_workspace:{workspace_id}")).await?;
        let mut backend = self.backend.lock().unwrap();
        if !backend.workspaces.iter().any(|w| w.id == workspace_id) {
            return Err(not_found("Workspace not found"));
        }
        backend.workspaces.retain(|w| w.id != workspace_id);
        backend
            .documents
            .retain(|d| d.workspace_id != Some(workspace_id));
        Ok(())
    }

    async fn list_documents(&self, workspace_id: WorkspaceId) -> PortResult<Vec<Document>> {
        self.enter(format!("list_documents:{workspace_id}")).await?;
        let backend = self.backend.lock().unwrap();
        Ok(backend
            .documents
            .iter()
            .filter(|d| d.workspace_id == Some(workspace_id))
            .cloned()
            .collect())
    }

    async fn upload_document(
        &self,
        workspace_id: WorkspaceId,
        file: &UploadFile,
    ) -> PortResult<Document> {
        self.enter("upload_document".to_string()).await?;
        let mut backend = self.backend.lock().unwrap();
        let mut created = document(backend.allocate_id(), workspace_id, &file.filename);
        created.size_bytes = Some(file.contents.len() as u64);
        created.mime_type = file.mime_type.clone();
        backend.documents.push(created.clone());
        Ok(created)
    }

    async fn delete_document(&self, document_id: DocumentId) -> PortResult<()> {
        self.enter(format!("delete_document:{document_id}")).await?;
        let mut backend = self.backend.lock().unwrap();
        backend.document(document_id)?;
        backend.documents.retain(|d| d.id != document_id);
        Ok(())
    }

    async fn download_document(&self, document_id: DocumentId) -> PortResult<Download> {
        self.enter(format!("download_document:{document_id}")).await?;
        let backend = self.backend.lock().unwrap();
        let document = backend.document(document_id)?;
        Ok(Download {
            contents: Bytes::from(format!("contents of {}", document.filename)),
            filename: Some(document.filename.clone()),
        })
    }

    async fn search(
        &self,
        workspace_id: WorkspaceId,
        query: &str,
    ) -> PortResult<Vec<SearchResult>> {
        self.enter("search".to_string()).await?;
        let backend = self.backend.lock().unwrap();
        Ok(backend
            .documents
            .iter()
            .filter(|d| d.workspace_id == Some(workspace_id) && d.filename.contains(query))
            .map(|d| SearchResult {
                document_name: Some(d.filename.clone()),
                score: Some(0.9),
                snippet: None,
            })
            .collect())
    }

    async fn generate_summary(&self, document_id: DocumentId) -> PortResult<Summary> {
        self.enter(format!("generate_summary:{document_id}")).await?;
        let mut backend = self.backend.lock().unwrap();
        let filename = backend.document(document_id)?.filename.clone();
        let summary = Summary {
            document_id,
            document_name: Some(filename.clone()),
            created_at: None,
            text: format!("Summary of {filename}"),
        };
        backend.summaries.insert(document_id, summary.clone());
        Ok(summary)
    }

    async fn get_summary(&self, document_id: DocumentId) -> PortResult<Summary> {
        self.enter(format!("get_summary:{document_id}")).await?;
        self.backend
            .lock()
            .unwrap()
            .summaries
            .get(&document_id)
            .cloned()
            .ok_or_else(|| not_found("Summary not found"))
    }
}

/// Answers every confirmation the same way and remembers the prompts.
pub(crate) struct StubGate {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl StubGate {
    pub(crate) fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ConfirmationGate for StubGate {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    saved: Mutex<Vec<(String, Bytes)>>,
}

impl RecordingSink {
    pub(crate) fn saved(&self) -> Vec<(String, Bytes)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaveSink for RecordingSink {
    async fn save(&self, filename: &str, contents: Bytes) -> PortResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), contents));
        Ok(())
    }
}
