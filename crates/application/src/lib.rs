//! Portcullis Application - Session use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (storage, clock, refresh transport, client lookup)
//! - The session manager, refresh loop and redirect login flow

pub mod auth;
pub mod ports;

pub use auth::{
    RedirectAuthFlow, RefreshOutcome, RefreshTask, SessionManager, Subscription, TokenInspector,
    TokenStatus, TokenStore,
};
pub use ports::{
    AuthorizationHeader, ClientConfigResolver, Clock, FixedClientConfig, RefreshClient,
    SessionStorage, StorageError,
};
