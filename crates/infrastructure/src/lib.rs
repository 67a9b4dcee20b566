//! Portcullis Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ApiClient, ApiError, SystemClock};
pub use auth::{HostClientConfigResolver, HttpRefreshClient};
pub use config::{ConfigError, load_settings};
pub use persistence::{FileSessionStorage, MemorySessionStorage};
