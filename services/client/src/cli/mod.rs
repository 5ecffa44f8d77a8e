//! services/client/src/cli/mod.rs
//!
//! Command-line surface of the `docdesk` binary. Each command drives the core
//! through the same cascade and mutation contract a graphical view would use.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::run;

#[derive(Debug, Parser)]
#[command(name = "docdesk", version, about = "Client for the document workspace service")]
pub struct Cli {
    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the backend is reachable.
    Health,
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOCDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with a username or email.
    Login {
        #[arg(long)]
        user: String,
        #[arg(long, env = "DOCDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage workspaces.
    Workspaces {
        #[command(subcommand)]
        action: WorkspaceAction,
    },
    /// Manage the documents of a workspace.
    Documents {
        /// Workspace id; defaults to the first workspace.
        #[arg(long, short = 'w', global = true)]
        workspace: Option<i64>,
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// Search the documents of a workspace.
    Search {
        #[arg(long, short = 'w')]
        workspace: Option<i64>,
        query: String,
    },
    /// Generate or show document summaries.
    Summary {
        #[arg(long, short = 'w', global = true)]
        workspace: Option<i64>,
        #[command(subcommand)]
        action: SummaryAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceAction {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum DocumentAction {
    List,
    Upload { path: PathBuf },
    Delete { id: i64 },
    Download { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum SummaryAction {
    Generate { document: i64 },
    Show { document: i64 },
}
