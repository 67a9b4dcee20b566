//! Session lifecycle for the Portcullis client.
//!
//! This module provides:
//! - Persistent token storage with an authorization header mirror
//! - Expiry inspection against an injectable clock
//! - Change notification, periodic refresh and the redirect login flow

mod inspector;
mod listeners;
mod redirect;
mod refresh_task;
mod session;
mod token_store;

#[cfg(test)]
mod testing;

pub use inspector::{TokenInspector, TokenStatus};
pub use listeners::{ListenerRegistry, Subscription};
pub use redirect::RedirectAuthFlow;
pub use refresh_task::{DEFAULT_REFRESH_INTERVAL, RefreshTask};
pub use session::{DEFAULT_REFRESH_THRESHOLD, RefreshOutcome, SessionManager};
pub use token_store::{STATE_KEY, TOKEN_KEY, TokenStore};
