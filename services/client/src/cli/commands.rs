//! services/client/src/cli/commands.rs
//!
//! Handlers for each `docdesk` command.

use docdesk_core::cascade::CascadeSnapshot;
use docdesk_core::domain::{Credentials, DocumentId, Registration, UploadFile, WorkspaceId};
use docdesk_core::mutation::MutationOutcome;
use docdesk_core::ClientContext;
use std::path::Path;
use tracing::info;

use crate::cli::{Cli, Command, DocumentAction, SummaryAction, WorkspaceAction};
use crate::error::ClientError;

/// Executes one parsed command against the context.
pub async fn run(cli: Cli, ctx: &ClientContext) -> Result<(), ClientError> {
    match cli.command {
        Command::Health => {
            let health = ctx.health().await?;
            println!("Status: {}", health.status);
            if !health.message.is_empty() {
                println!("Message: {}", health.message);
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let session = ctx
                .register(Registration {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Registered and signed in as {}", session.identity.username);
        }
        Command::Login { user, password } => {
            let session = ctx
                .login(Credentials {
                    email_or_username: user,
                    password,
                })
                .await?;
            println!("Signed in as {}", session.identity.username);
        }
        Command::Logout => {
            ctx.logout().await;
            println!("Signed out");
        }
        Command::Whoami => match ctx.session().current() {
            Some(session) => println!(
                "{} <{}> (id {})",
                session.identity.username, session.identity.email, session.identity.id
            ),
            None => println!("Not signed in"),
        },
        Command::Workspaces { action } => workspaces(ctx, action).await?,
        Command::Documents { workspace, action } => {
            open_workspace(ctx, workspace).await?;
            documents(ctx, action).await?;
        }
        Command::Search { workspace, query } => {
            open_workspace(ctx, workspace).await?;
            ctx.cascade().search(&query).await?;
            print_search(&ctx.cascade().snapshot());
        }
        Command::Summary { workspace, action } => {
            open_workspace(ctx, workspace).await?;
            summary(ctx, action).await?;
        }
    }
    Ok(())
}

async fn workspaces(ctx: &ClientContext, action: WorkspaceAction) -> Result<(), ClientError> {
    let cascade = ctx.cascade();
    cascade.mount().await?;
    match action {
        WorkspaceAction::List => print_workspaces(&cascade.snapshot()),
        WorkspaceAction::Create { name, description } => {
            let created = ctx
                .mutations()
                .create_workspace(&name, description.as_deref())
                .await?;
            println!("Created workspace {} ({})", created.name, created.id);
            print_workspaces(&cascade.snapshot());
        }
        WorkspaceAction::Delete { id } => {
            match ctx.mutations().delete_workspace(WorkspaceId(id)).await? {
                MutationOutcome::Completed(()) => println!("Deleted workspace {id}"),
                MutationOutcome::Declined => println!("Cancelled"),
            }
            print_workspaces(&cascade.snapshot());
        }
    }
    Ok(())
}

async fn documents(ctx: &ClientContext, action: DocumentAction) -> Result<(), ClientError> {
    let cascade = ctx.cascade();
    match action {
        DocumentAction::List => print_documents(&cascade.snapshot()),
        DocumentAction::Upload { path } => {
            let file = read_upload(&path).await?;
            let created = ctx.mutations().upload_document(Some(file)).await?;
            println!("Uploaded {} ({})", created.filename, created.id);
            print_documents(&cascade.snapshot());
        }
        DocumentAction::Delete { id } => {
            match ctx.mutations().delete_document(DocumentId(id)).await? {
                MutationOutcome::Completed(()) => println!("Deleted document {id}"),
                MutationOutcome::Declined => println!("Cancelled"),
            }
            print_documents(&cascade.snapshot());
        }
        DocumentAction::Download { id } => {
            let filename = ctx.mutations().download_document(DocumentId(id)).await?;
            println!("Saved {filename}");
        }
    }
    Ok(())
}

async fn summary(ctx: &ClientContext, action: SummaryAction) -> Result<(), ClientError> {
    let cascade = ctx.cascade();
    match action {
        SummaryAction::Generate { document } => {
            cascade.select_document(DocumentId(document)).await?;
            ctx.mutations().generate_summary().await?;
        }
        SummaryAction::Show { document } => {
            cascade.select_document(DocumentId(document)).await?;
            cascade.load_summary().await?;
        }
    }
    match cascade.snapshot().summary.data {
        Some(summary) => {
            if let Some(name) = &summary.document_name {
                println!("{name}");
            }
            if let Some(created_at) = summary.created_at {
                println!("Created: {}", created_at.format("%Y-%m-%d %H:%M"));
            }
            println!("\n{}", summary.text);
        }
        None => println!("No summary available"),
    }
    Ok(())
}

/// Loads the workspace list and switches to `workspace` when given. Without
/// it the first workspace stays selected.
async fn open_workspace(ctx: &ClientContext, workspace: Option<i64>) -> Result<(), ClientError> {
    let cascade = ctx.cascade();
    cascade.mount().await?;
    if let Some(id) = workspace {
        cascade.select_workspace(WorkspaceId(id)).await?;
    }
    let snapshot = cascade.snapshot();
    match snapshot.current_workspace() {
        Some(current) => info!(workspace = %current.id, name = %current.name, "using workspace"),
        None => {
            return Err(ClientError::Internal(
                "No workspaces found. Create one with `docdesk workspaces create <name>`."
                    .to_string(),
            ))
        }
    }
    Ok(())
}

async fn read_upload(path: &Path) -> Result<UploadFile, ClientError> {
    let contents = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::Internal(format!("'{}' has no filename", path.display())))?
        .to_string();
    Ok(UploadFile {
        mime_type: guess_mime(&filename).map(str::to_string),
        filename,
        contents: contents.into(),
    })
}

fn guess_mime(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

fn print_workspaces(snapshot: &CascadeSnapshot) {
    if snapshot.workspaces.data.is_empty() {
        println!("No workspaces found. Create your first workspace to get started.");
        return;
    }
    for workspace in &snapshot.workspaces.data {
        let marker = if snapshot.selected_workspace == Some(workspace.id) { '*' } else { ' ' };
        match &workspace.description {
            Some(description) => {
                println!("{marker} {:>5}  {}  - {description}", workspace.id, workspace.name)
            }
            None => println!("{marker} {:>5}  {}", workspace.id, workspace.name),
        }
    }
}

fn print_documents(snapshot: &CascadeSnapshot) {
    if let Some(error) = &snapshot.documents.error {
        println!("Error: {error}");
        return;
    }
    if snapshot.documents.data.is_empty() {
        println!("No documents found in this workspace.");
        return;
    }
    for document in &snapshot.documents.data {
        println!(
            "{:>5}  {}  (uploaded {})",
            document.id,
            document.filename,
            document.created_at.format("%Y-%m-%d")
        );
    }
}

fn print_search(snapshot: &CascadeSnapshot) {
    let Some(outcome) = &snapshot.search.data else {
        return;
    };
    if outcome.results.is_empty() {
        println!("No results found for \"{}\"", outcome.query);
        return;
    }
    println!("Search Results ({})", outcome.results.len());
    for result in &outcome.results {
        let score = result
            .score
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "- {} (relevance {score})",
            result.document_name.as_deref().unwrap_or("Untitled Document")
        );
        if let Some(snippet) = &result.snippet {
            println!("    {snippet}");
        }
    }
}
