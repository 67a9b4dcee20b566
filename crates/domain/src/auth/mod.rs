//! Authentication domain types

mod types;

pub use types::{AuthState, CallbackOutcome, CallbackParams, ClientConfig, LoginRedirect};
