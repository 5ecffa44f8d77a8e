//! services/client/src/adapters/gateway.rs
//!
//! The API gateway client: the single chokepoint for backend calls and the
//! concrete implementation of the `DocumentApi` port from the core crate.
//! It attaches the bearer credential, issues exactly one request per call and
//! classifies every outcome into the core's error taxonomy.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use docdesk_core::domain::{
    AuthGrant, Credentials, Document, DocumentId, Download, HealthStatus, Identity, Registration,
    SearchResult, Summary, UploadFile, Workspace, WorkspaceId,
};
use docdesk_core::ports::{DocumentApi, PortError, PortResult};
use docdesk_core::session::SessionStore;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of every versioned backend route. `/health` lives outside it.
const API_PREFIX: &str = "/api/v1";

/// Message used when a failed response carries no structured error.
const GENERIC_FAILURE: &str = "request failed";

//=========================================================================================
// Call Options and Raw Responses
//=========================================================================================

pub enum RequestBody {
    Json(Value),
    Multipart(Form),
}

/// Per-call knobs for [`HttpGateway::call`].
#[derive(Default)]
pub struct CallOptions {
    pub body: Option<RequestBody>,
    pub query: Vec<(&'static str, String)>,
    pub requires_auth: bool,
}

impl CallOptions {
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    pub fn public() -> Self {
        Self::default()
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

/// A 2xx response, body fully read.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    fn decode<T: DeserializeOwned>(&self, what: &str) -> PortResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| PortError::Decode(format!("{what} response: {e}")))
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// HTTP implementation of the `DocumentApi` port.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpGateway {
    /// Creates a gateway for `base_url`. The credential is read from `session`
    /// on every authenticated call; the gateway never modifies it.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Issues one request and classifies the outcome.
    ///
    /// * no credential while `requires_auth` → `Unauthenticated`, nothing sent
    /// * 2xx → the raw response
    /// * other status → `Remote { status, message }`
    /// * no response → `Transport`
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> PortResult<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);

        if options.requires_auth {
            let Some(token) = self.session.credential() else {
                debug!(%method, path, "no session, refusing authenticated call");
                return Err(PortError::Unauthenticated);
            };
            request = request.bearer_auth(token);
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        request = match options.body {
            Some(RequestBody::Json(body)) => request.json(&body),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "request failed without a response");
            PortError::Transport(e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Transport(format!("failed to read response body: {e}")))?;
        debug!(%method, path, status = status.as_u16(), bytes = body.len(), "response received");

        if status.is_success() {
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        } else {
            let message = error_message(&body);
            warn!(%method, path, status = status.as_u16(), %message, "backend returned an error");
            Err(PortError::Remote {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, options: CallOptions) -> PortResult<T> {
        self.call(Method::GET, path, options).await?.decode(path)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: CallOptions,
    ) -> PortResult<T> {
        self.call(Method::POST, path, options).await?.decode(path)
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> Identity {
        Identity {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(Deserialize)]
struct AuthRecord {
    access_token: String,
    user: UserRecord,
}
impl AuthRecord {
    fn to_domain(self) -> AuthGrant {
        AuthGrant {
            access_token: self.access_token,
            identity: self.user.to_domain(),
        }
    }
}

/// Lists arrive either bare or wrapped in a cursor page.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListRecord<T> {
    Bare(Vec<T>),
    Paged { items: Vec<T> },
}
impl<T> ListRecord<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListRecord::Bare(items) | ListRecord::Paged { items } => items,
        }
    }
}

#[derive(Deserialize)]
struct WorkspaceRecord {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
}
impl WorkspaceRecord {
    fn to_domain(self) -> Workspace {
        Workspace {
            id: WorkspaceId(self.id),
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct DocumentRecord {
    id: i64,
    filename: String,
    created_at: String,
    #[serde(default)]
    workspace_id: Option<i64>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    status: Option<String>,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        Ok(Document {
            id: DocumentId(self.id),
            filename: self.filename,
            created_at: parse_timestamp(&self.created_at)?,
            workspace_id: self.workspace_id.map(WorkspaceId),
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            status: self.status,
        })
    }
}

#[derive(Deserialize)]
struct SearchRecord {
    #[serde(default, alias = "items")]
    results: Vec<SearchResultRecord>,
}

#[derive(Deserialize)]
struct SearchResultRecord {
    #[serde(default, alias = "filename")]
    document_name: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    snippet: Option<String>,
}
impl SearchResultRecord {
    fn to_domain(self) -> SearchResult {
        SearchResult {
            document_name: self.document_name,
            score: self.score,
            snippet: self.snippet.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct SummaryRecord {
    #[serde(default)]
    document_name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(alias = "content")]
    summary_text: String,
}
impl SummaryRecord {
    fn to_domain(self, document_id: DocumentId) -> PortResult<Summary> {
        Ok(Summary {
            document_id,
            document_name: self.document_name,
            created_at: self.created_at.as_deref().map(parse_timestamp).transpose()?,
            text: self.summary_text,
        })
    }
}

#[derive(Deserialize)]
struct HealthRecord {
    status: String,
    #[serde(default)]
    message: String,
}

//=========================================================================================
// `DocumentApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentApi for HttpGateway {
    async fn health(&self) -> PortResult<HealthStatus> {
        let record: HealthRecord = self.get_json("/health", CallOptions::public()).await?;
        Ok(HealthStatus {
            status: record.status,
            message: record.message,
        })
    }

    async fn register(&self, registration: &Registration) -> PortResult<AuthGrant> {
        let body = json!({
            "username": registration.username,
            "email": registration.email,
            "password": registration.password,
        });
        let record: AuthRecord = self
            .post_json(
                &format!("{API_PREFIX}/auth/register"),
                CallOptions::public().json(body),
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<AuthGrant> {
        let body = json!({
            "email_or_username": credentials.email_or_username,
            "password": credentials.password,
        });
        let record: AuthRecord = self
            .post_json(
                &format!("{API_PREFIX}/auth/login"),
                CallOptions::public().json(body),
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn logout(&self) -> PortResult<()> {
        self.call(
            Method::POST,
            &format!("{API_PREFIX}/auth/logout"),
            CallOptions::authenticated(),
        )
        .await?;
        Ok(())
    }

    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>> {
        let records: ListRecord<WorkspaceRecord> = self
            .get_json(&format!("{API_PREFIX}/workspaces"), CallOptions::authenticated())
            .await?;
        Ok(records
            .into_items()
            .into_iter()
            .map(WorkspaceRecord::to_domain)
            .collect())
    }

    async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> PortResult<Workspace> {
        let body = json!({
            "name": name,
            "description": description.unwrap_or_default(),
        });
        let record: WorkspaceRecord = self
            .post_json(
                &format!("{API_PREFIX}/workspaces"),
                CallOptions::authenticated().json(body),
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> PortResult<()> {
        self.call(
            Method::DELETE,
            &format!("{API_PREFIX}/workspaces/{workspace_id}"),
            CallOptions::authenticated(),
        )
        .await?;
        Ok(())
    }

    async fn list_documents(&self, workspace_id: WorkspaceId) -> PortResult<Vec<Document>> {
        let records: ListRecord<DocumentRecord> = self
            .get_json(
                &format!("{API_PREFIX}/documents"),
                CallOptions::authenticated().query("workspace_id", workspace_id.to_string()),
            )
            .await?;
        records
            .into_items()
            .into_iter()
            .map(DocumentRecord::to_domain)
            .collect()
    }

    async fn upload_document(
        &self,
        workspace_id: WorkspaceId,
        file: &UploadFile,
    ) -> PortResult<Document> {
        let mut part = Part::bytes(file.contents.to_vec()).file_name(file.filename.clone());
        if let Some(mime) = &file.mime_type {
            part = part
                .mime_str(mime)
                .map_err(|e| PortError::Validation(format!("invalid mime type '{mime}': {e}")))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("workspace_id", workspace_id.to_string());

        let record: DocumentRecord = self
            .post_json(
                &format!("{API_PREFIX}/documents/upload"),
                CallOptions::authenticated().multipart(form),
            )
            .await?;
        record.to_domain()
    }

    async fn delete_document(&self, document_id: DocumentId) -> PortResult<()> {
        self.call(
            Method::DELETE,
            &format!("{API_PREFIX}/documents/{document_id}"),
            CallOptions::authenticated(),
        )
        .await?;
        Ok(())
    }

    async fn download_document(&self, document_id: DocumentId) -> PortResult<Download> {
        let response = self
            .call(
                Method::GET,
                &format!("{API_PREFIX}/documents/{document_id}/download"),
                CallOptions::authenticated(),
            )
            .await?;
        let filename = response
            .headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);
        Ok(Download {
            contents: response.body,
            filename,
        })
    }

    async fn search(
        &self,
        workspace_id: WorkspaceId,
        query: &str,
    ) -> PortResult<Vec<SearchResult>> {
        let record: SearchRecord = self
            .get_json(
                &format!("{API_PREFIX}/search"),
                CallOptions::authenticated()
                    .query("workspace_id", workspace_id.to_string())
                    .query("query", query),
            )
            .await?;
        Ok(record
            .results
            .into_iter()
            .map(SearchResultRecord::to_domain)
            .collect())
    }

    async fn generate_summary(&self, document_id: DocumentId) -> PortResult<Summary> {
        let record: SummaryRecord = self
            .post_json(
                &format!("{API_PREFIX}/summaries/generate"),
                CallOptions::authenticated().json(json!({ "document_id": document_id })),
            )
            .await?;
        record.to_domain(document_id)
    }

    async fn get_summary(&self, document_id: DocumentId) -> PortResult<Summary> {
        let record: SummaryRecord = self
            .get_json(
                &format!("{API_PREFIX}/summaries/{document_id}"),
                CallOptions::authenticated(),
            )
            .await?;
        record.to_domain(document_id)
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Pulls a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": {"message": "..."}}`,
/// `{"detail": [{"msg": "..."}]}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`.
fn error_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return GENERIC_FAILURE.to_string();
    };
    let detail = &value["detail"];
    let candidates = [
        detail.as_str(),
        detail["message"].as_str(),
        detail[0]["msg"].as_str(),
        value["error"]["message"].as_str(),
        value["message"].as_str(),
    ];
    let message = candidates
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    message
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp, which is taken as UTC.
fn parse_timestamp(raw: &str) -> PortResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| PortError::Decode(format!("timestamp '{raw}': {e}")))
}

/// Reads the download name from `Content-Disposition`, preferring the
/// extended `filename*` parameter over plain `filename`.
fn disposition_filename(header: &str) -> Option<String> {
    let params: Vec<(&str, &str)> = header
        .split(';')
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    };

    param("filename*")
        .and_then(decode_extended_value)
        .or_else(|| param("filename").map(|name| name.trim_matches('"').to_string()))
        .filter(|name| !name.is_empty())
}

/// Decodes an RFC 5987 value such as `UTF-8''r%C3%A9sum%C3%A9.pdf`.
fn decode_extended_value(value: &str) -> Option<String> {
    let (charset, rest) = value.trim_matches('"').split_once('\'')?;
    let (_language, encoded) = rest.split_once('\'')?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdesk_core::memory::MemoryStorage;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_in() -> Arc<SessionStore> {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        session
            .establish(
                "test-token".to_string(),
                Identity {
                    id: 1,
                    username: "ada".to_string(),
                    email: "ada@example.com".to_string(),
                },
            )
            .unwrap();
        session
    }

    fn signed_out() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())))
    }

    fn gateway(base_url: &str, session: Arc<SessionStore>) -> HttpGateway {
        HttpGateway::new(base_url, Duration::from_secs(5), session).unwrap()
    }

    #[tokio::test]
    async fn list_workspaces_sends_the_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workspaces"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "name": "Research", "description": "papers"},
                {"id": 1, "name": "Archive"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let workspaces = gateway(&server.uri(), signed_in())
            .list_workspaces()
            .await
            .unwrap();

        let names: Vec<_> = workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Research", "Archive"]);
        assert_eq!(workspaces[0].description.as_deref(), Some("papers"));
    }

    #[tokio::test]
    async fn authenticated_call_without_session_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let result = gateway(&server.uri(), signed_out()).list_workspaces().await;

        assert_eq!(result, Err(PortError::Unauthenticated));
    }

    #[tokio::test]
    async fn login_posts_credentials_without_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_json(json!({"email_or_username": "ada", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "refresh_token": "ignored",
                "user": {"id": 9, "username": "ada", "email": "ada@example.com", "tenant_id": 1}
            })))
            .mount(&server)
            .await;

        let grant = gateway(&server.uri(), signed_out())
            .login(&Credentials {
                email_or_username: "ada".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(grant.access_token, "fresh");
        assert_eq!(grant.identity.id, 9);
        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn remote_failure_uses_the_detail_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/summaries/4"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Summary not found"})),
            )
            .mount(&server)
            .await;

        let err = gateway(&server.uri(), signed_in())
            .get_summary(DocumentId(4))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PortError::Remote {
                status: 404,
                message: "Summary not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unstructured_error_body_falls_back_to_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/documents/3"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server.uri(), signed_in())
            .delete_document(DocumentId(3))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PortError::Remote {
                status: 502,
                message: "request failed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_failure() {
        let result = gateway("http://127.0.0.1:1", signed_out()).health().await;

        assert!(matches!(result, Err(PortError::Transport(_))));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
            .mount(&server)
            .await;

        let result = gateway(&server.uri(), signed_out()).health().await;

        assert!(matches!(result, Err(PortError::Decode(_))));
    }

    #[tokio::test]
    async fn documents_are_scoped_by_query_and_accept_paged_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/documents"))
            .and(query_param("workspace_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": 1, "filename": "notes.pdf", "created_at": "2024-05-01T10:00:00.123456"},
                    {"id": 2, "filename": "plan.md", "created_at": "2024-05-02T08:30:00Z", "size_bytes": 42}
                ],
                "next_cursor": null
            })))
            .mount(&server)
            .await;

        let documents = gateway(&server.uri(), signed_in())
            .list_documents(WorkspaceId(7))
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].filename, "notes.pdf");
        assert_eq!(
            documents[1].created_at,
            Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap()
        );
        assert_eq!(documents[1].size_bytes, Some(42));
    }

    #[tokio::test]
    async fn search_accepts_either_result_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("workspace_id", "1"))
            .and(query_param("query", "solar panels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "solar panels",
                "items": [{"filename": "energy.pdf", "score": 0.87, "snippet": "solar"}]
            })))
            .mount(&server)
            .await;

        let results = gateway(&server.uri(), signed_in())
            .search(WorkspaceId(1), "solar panels")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_name.as_deref(), Some("energy.pdf"));
        assert_eq!(results[0].score, Some(0.87));
    }

    #[tokio::test]
    async fn generated_summary_accepts_content_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/summaries/generate"))
            .and(body_json(json!({"document_id": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "document_name": "notes.pdf",
                "content": "Short summary."
            })))
            .mount(&server)
            .await;

        let summary = gateway(&server.uri(), signed_in())
            .generate_summary(DocumentId(5))
            .await
            .unwrap();

        assert_eq!(summary.document_id, DocumentId(5));
        assert_eq!(summary.text, "Short summary.");
        assert_eq!(summary.created_at, None);
    }

    #[tokio::test]
    async fn download_returns_raw_bytes_and_suggested_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/documents/8/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"notes.pdf\"")
                    .set_body_bytes(vec![0x25, 0x50, 0x44, 0x46]),
            )
            .mount(&server)
            .await;

        let download = gateway(&server.uri(), signed_in())
            .download_document(DocumentId(8))
            .await
            .unwrap();

        assert_eq!(download.contents, Bytes::from_static(b"%PDF"));
        assert_eq!(download.filename.as_deref(), Some("notes.pdf"));
    }

    #[test]
    fn extended_disposition_filename_wins_over_the_plain_one() {
        assert_eq!(
            disposition_filename(
                "attachment; filename=\"resume.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
            )
            .as_deref(),
            Some("résumé.pdf")
        );
        assert_eq!(
            disposition_filename("attachment; filename*=utf-8'en'annual%20report.docx").as_deref(),
            Some("annual report.docx")
        );
        assert_eq!(
            disposition_filename("attachment; filename=\"plain.txt\"").as_deref(),
            Some("plain.txt")
        );
        assert_eq!(
            disposition_filename("attachment; filename*=ISO-8859-1''x.txt; filename=x.txt")
                .as_deref(),
            Some("x.txt")
        );
        assert_eq!(disposition_filename("inline"), None);
    }

    #[test]
    fn error_message_reads_nested_shapes() {
        assert_eq!(
            error_message(br#"{"detail": {"code": "X", "message": "nested"}}"#),
            "nested"
        );
        assert_eq!(
            error_message(br#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#),
            "field required"
        );
        assert_eq!(error_message(br#"{"error": {"message": "wrapped"}}"#), "wrapped");
        assert_eq!(error_message(br#"{"unrelated": true}"#), "request failed");
    }
}
