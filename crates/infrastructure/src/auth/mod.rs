//! Identity service integrations.

mod client_config;
mod refresh_client;

pub use client_config::HostClientConfigResolver;
pub use refresh_client::HttpRefreshClient;
