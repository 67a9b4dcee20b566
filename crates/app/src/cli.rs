//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Portcullis - keeps a session with the centralized identity service alive.
#[derive(Debug, Parser)]
#[command(name = "portcullis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (defaults to ./portcullis.toml when present).
    #[arg(short, long, env = "PORTCULLIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Authorization service base URL (overrides settings).
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Session file (defaults to the platform config directory).
    #[arg(long, env = "PORTCULLIS_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the authorization URL that starts a login.
    Login {
        /// Client key (overrides host-based detection).
        #[arg(long)]
        client: Option<String>,

        /// Where the authorization server should send the browser back to.
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Complete a login from the return redirect.
    Callback {
        /// Full redirect URL or just its query string.
        redirect: String,
    },

    /// Show authentication state and remaining token lifetime.
    Status,

    /// Show the signed-in user.
    Whoami,

    /// Run one refresh check now.
    Refresh,

    /// Keep the token refreshed until interrupted.
    Watch,

    /// End the session.
    Logout,
}
