//! Portcullis Domain - Core session types
//!
//! This crate defines the domain model for the session lifecycle manager.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod id;
pub mod settings;
pub mod token;

pub use auth::{AuthState, CallbackOutcome, CallbackParams, ClientConfig, LoginRedirect};
pub use error::{AuthError, AuthResult};
pub use id::generate_state;
pub use settings::SessionSettings;
pub use token::{SessionToken, TokenClaims, encode_unsigned};
