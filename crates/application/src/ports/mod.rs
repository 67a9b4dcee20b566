//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod authorization_header;
mod client_config;
mod clock;
mod refresh_client;
mod storage;

pub use authorization_header::AuthorizationHeader;
pub use client_config::{ClientConfigResolver, FixedClientConfig};
pub use clock::Clock;
pub use refresh_client::RefreshClient;
pub use storage::{SessionStorage, StorageError};
