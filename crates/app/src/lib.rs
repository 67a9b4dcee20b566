//! Portcullis - command-line front end for the session lifecycle manager.
//!
//! The binary parses [`cli::Cli`], loads settings, builds an
//! [`context::AppContext`] and dispatches to [`commands::run`].

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;

pub use cli::{Cli, Command};
pub use context::AppContext;
pub use error::{AppError, AppResult};
